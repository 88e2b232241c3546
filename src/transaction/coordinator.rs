//! Transaction coordinator - tracks logical nesting over one physical transaction.
//!
//! The TransactionCoordinator is the main entry point for transactions.
//! It handles:
//! - Nesting: only the outermost begin/commit reach the resource
//! - Rollback-only poisoning of the whole transaction tree
//! - Isolation level negotiation while no transaction is open
//! - Full unwinding on rollback at any depth

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::transaction::error::{TransactionError, TransactionResult};
use crate::transaction::isolation::IsolationLevel;
use crate::transaction::listener::TransactionListener;
use crate::transaction::resource::{Resource, ResourceError};

/// Identity of the physical transaction currently open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMetadata {
    /// Unique transaction ID, minted by the outermost begin.
    pub tx_id: String,
    /// When the outermost begin succeeded.
    pub started_at: DateTime<Utc>,
}

/// Point-in-time view of a coordinator's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionStatus {
    pub active: bool,
    pub nesting_level: usize,
    pub isolation: IsolationLevel,
    pub rollback_only: bool,
    pub transaction_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Nested transaction coordinator.
///
/// Not internally synchronized: every mutating call takes `&mut self`, so
/// sharing across threads needs an external lock.
pub struct TransactionCoordinator<R> {
    /// The resource physical operations are delegated to.
    resource: R,
    /// Count of unmatched begins. 0 means no active transaction.
    nesting_level: usize,
    /// Last isolation level successfully applied.
    isolation: Option<IsolationLevel>,
    /// Set once the transaction tree is doomed.
    rollback_only: bool,
    /// Present exactly while `nesting_level > 0`.
    current: Option<TransactionMetadata>,
    /// Notified around every rollback, in registration order.
    listeners: Vec<Box<dyn TransactionListener>>,
}

impl<R: Resource> TransactionCoordinator<R> {
    /// Create a coordinator with no active transaction.
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            nesting_level: 0,
            isolation: None,
            rollback_only: false,
            current: None,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for rollback events.
    pub fn add_listener(&mut self, listener: Box<dyn TransactionListener>) {
        self.listeners.push(listener);
    }

    /// Get a reference to the underlying resource.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Consume the coordinator, returning the resource.
    pub fn into_resource(self) -> R {
        self.resource
    }

    /// Check whether a transaction is currently active.
    pub fn is_transaction_active(&self) -> bool {
        self.nesting_level > 0
    }

    /// Returns the current transaction nesting level.
    pub fn transaction_nesting_level(&self) -> usize {
        self.nesting_level
    }

    /// ID of the active transaction, if any.
    pub fn transaction_id(&self) -> Option<&str> {
        self.current.as_ref().map(|m| m.tx_id.as_str())
    }

    /// Get the isolation level last set, or the resource's own level.
    pub fn transaction_isolation(&self) -> IsolationLevel {
        self.isolation
            .unwrap_or_else(|| self.resource.isolation_level())
    }

    /// Set the isolation level for the next transaction.
    ///
    /// Rejected with [`TransactionError::InvalidState`] while a transaction is
    /// active. The stored level only changes if the resource accepts it.
    pub fn set_transaction_isolation(&mut self, level: IsolationLevel) -> TransactionResult<()> {
        if self.is_transaction_active() {
            return Err(TransactionError::InvalidState(format!(
                "cannot change isolation level to {} while a transaction is active (nesting level {})",
                level, self.nesting_level
            )));
        }

        self.resource
            .set_isolation_level(level)
            .map_err(|e| match e {
                ResourceError::UnsupportedIsolation(level) => TransactionError::InvalidArgument(
                    format!("isolation level {} is not supported by the resource", level),
                ),
                other => TransactionError::Resource(other),
            })?;

        self.isolation = Some(level);
        debug!(isolation = %level, "isolation level set");
        Ok(())
    }

    /// Start a transaction, or a nested logical scope inside the active one.
    pub fn begin(&mut self) -> TransactionResult<()> {
        if self.nesting_level == 0 {
            self.resource
                .begin()
                .map_err(TransactionError::BeginFailed)?;

            let metadata = TransactionMetadata {
                tx_id: Ulid::new().to_string().to_lowercase(),
                started_at: Utc::now(),
            };
            info!(
                tx_id = %metadata.tx_id,
                isolation = %self.transaction_isolation(),
                "transaction started"
            );
            self.current = Some(metadata);
        }

        self.nesting_level += 1;
        debug!(tx_id = ?self.transaction_id(), level = self.nesting_level, "begin");
        Ok(())
    }

    /// Commit the current scope.
    ///
    /// Only the outermost commit reaches the resource. A physical commit
    /// failure leaves the level untouched so the caller can retry or roll back.
    pub fn commit(&mut self) -> TransactionResult<()> {
        if self.nesting_level == 0 {
            return Err(TransactionError::NoActiveTransaction);
        }

        if self.rollback_only {
            warn!(
                tx_id = ?self.transaction_id(),
                level = self.nesting_level,
                "commit refused: transaction is rollback-only"
            );
            return Err(TransactionError::RollbackOnly);
        }

        if self.nesting_level == 1 {
            self.resource
                .commit()
                .map_err(TransactionError::CommitFailed)?;
            let tx_id = self.reset();
            info!(tx_id = ?tx_id, "transaction committed");
        } else {
            self.nesting_level -= 1;
            debug!(tx_id = ?self.transaction_id(), level = self.nesting_level, "nested commit");
        }

        Ok(())
    }

    /// Roll back the whole transaction, whatever the current depth.
    ///
    /// Logical state is reset even if the resource fails; in that case the
    /// error is still returned and the backend state must be checked.
    pub fn rollback(&mut self) -> TransactionResult<()> {
        if self.nesting_level == 0 {
            return Err(TransactionError::NoActiveTransaction);
        }

        let depth = self.nesting_level;
        if !self.listeners.is_empty() {
            let status = self.status();
            for listener in &self.listeners {
                listener.on_pre_rollback(&status);
            }
        }

        let result = self.resource.rollback();
        let tx_id = self.reset();

        if !self.listeners.is_empty() {
            let status = self.status();
            for listener in &self.listeners {
                listener.on_rollback(&status, result.as_ref().map(|_| ()));
            }
        }

        match result {
            Ok(()) => {
                info!(tx_id = ?tx_id, depth, "transaction rolled back");
                Ok(())
            }
            Err(e) => {
                warn!(tx_id = ?tx_id, depth, error = %e, "physical rollback failed; state reset anyway");
                Err(TransactionError::RollbackFailed(e))
            }
        }
    }

    /// Mark the active transaction so that its only possible outcome is a rollback.
    pub fn set_rollback_only(&mut self) -> TransactionResult<()> {
        if self.nesting_level == 0 {
            return Err(TransactionError::NoActiveTransaction);
        }
        if !self.rollback_only {
            debug!(tx_id = ?self.transaction_id(), level = self.nesting_level, "marked rollback-only");
        }
        self.rollback_only = true;
        Ok(())
    }

    /// Check whether the active transaction is marked rollback-only.
    pub fn is_rollback_only(&self) -> TransactionResult<bool> {
        if self.nesting_level == 0 {
            return Err(TransactionError::NoActiveTransaction);
        }
        Ok(self.rollback_only)
    }

    /// Snapshot of the coordinator's state.
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus {
            active: self.is_transaction_active(),
            nesting_level: self.nesting_level,
            isolation: self.transaction_isolation(),
            rollback_only: self.rollback_only,
            transaction_id: self.current.as_ref().map(|m| m.tx_id.clone()),
            started_at: self.current.as_ref().map(|m| m.started_at),
        }
    }

    /// Execute a function within a transaction, automatically committing or rolling back.
    ///
    /// If the function returns Ok, the scope is committed.
    /// If the function or the commit fails, the whole transaction is rolled back
    /// and the original error returned.
    pub fn transactional<F, T>(&mut self, f: F) -> TransactionResult<T>
    where
        F: FnOnce(&mut Self) -> TransactionResult<T>,
    {
        self.begin()?;
        let depth = self.nesting_level;

        let outcome = f(self).and_then(|value| self.commit().map(|_| value));

        match outcome {
            Ok(value) => Ok(value),
            Err(e) => {
                // The closure may already have unwound the transaction itself.
                if self.nesting_level >= depth {
                    if let Err(rollback_err) = self.rollback() {
                        warn!(error = %rollback_err, "rollback after failed transactional block also failed");
                    }
                }
                Err(e)
            }
        }
    }

    fn reset(&mut self) -> Option<String> {
        self.nesting_level = 0;
        self.rollback_only = false;
        self.current.take().map(|m| m.tx_id)
    }
}

impl<R> std::fmt::Debug for TransactionCoordinator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .field("nesting_level", &self.nesting_level)
            .field("isolation", &self.isolation)
            .field("rollback_only", &self.rollback_only)
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
