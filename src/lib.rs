//! nestedtx - A nested transaction coordinator
//!
//! This crate tracks logical transaction nesting over a single physical
//! transaction: only the outermost `begin`/`commit` reach the underlying
//! resource, any `rollback` unwinds everything, and a transaction marked
//! rollback-only can never be committed.
//!
//! # Example
//!
//! ```
//! use nestedtx::session::Session;
//!
//! let mut session = Session::open().unwrap();
//! session.execute("SET ISOLATION LEVEL SERIALIZABLE").unwrap();
//! session.execute("BEGIN").unwrap();
//! session.execute("BEGIN").unwrap();
//! session.execute("COMMIT").unwrap();
//! session.execute("COMMIT").unwrap();
//! assert!(!session.coordinator().is_transaction_active());
//! ```

pub mod logging;
pub mod session;
pub mod transaction;
