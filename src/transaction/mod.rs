//! Transaction coordination for nestedtx.
//!
//! This module tracks logical transaction nesting over a single physical
//! transaction. Only the outermost `begin`/`commit` reach the [`Resource`];
//! a `rollback` at any depth unwinds the whole tree. There are no savepoints.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  TransactionCoordinator                     │
//! │   (nesting level, isolation, rollback-only, tx identity)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │ Transaction │       │ Isolation   │       │  Resource   │
//!  │   Scope     │       │   Level     │       │  (physical) │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use nestedtx::transaction::{MemoryResource, TransactionCoordinator, TransactionError};
//!
//! let mut tx = TransactionCoordinator::new(MemoryResource::new());
//!
//! tx.begin()?;
//! tx.begin()?;                 // nested, logical only
//! tx.set_rollback_only()?;
//! assert!(matches!(tx.commit(), Err(TransactionError::RollbackOnly)));
//! tx.rollback()?;              // unwinds both levels
//! assert_eq!(tx.transaction_nesting_level(), 0);
//! # Ok::<(), TransactionError>(())
//! ```

mod coordinator;
mod error;
mod isolation;
mod listener;
mod memory;
mod resource;
mod scope;

pub use coordinator::{TransactionCoordinator, TransactionMetadata, TransactionStatus};
pub use error::{TransactionError, TransactionResult};
pub use isolation::IsolationLevel;
pub use listener::TransactionListener;
pub use memory::{MemoryResource, OpKind, PhysicalOp};
pub use resource::{Resource, ResourceError};
pub use scope::TransactionScope;
