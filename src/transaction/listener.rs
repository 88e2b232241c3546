//! Rollback listeners.
//!
//! Listeners registered on a coordinator are told right before a rollback
//! reaches the resource and again once the logical state has been reset.

use crate::transaction::coordinator::TransactionStatus;
use crate::transaction::resource::ResourceError;

/// Observer of rollback events. Both hooks default to no-ops.
pub trait TransactionListener: Send {
    /// Called before the physical rollback, with the state about to be unwound.
    fn on_pre_rollback(&self, _status: &TransactionStatus) {}

    /// Called after the state was reset, also when the physical rollback failed.
    fn on_rollback(&self, _status: &TransactionStatus, _result: Result<(), &ResourceError>) {}
}
