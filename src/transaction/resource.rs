//! The physical side of a transaction.
//!
//! A [`Resource`] is whatever actually holds the transaction open: a database
//! connection, a storage handle, a test double. The coordinator never talks to
//! storage itself; it only decides *when* the resource must act.

use thiserror::Error;

use crate::transaction::isolation::IsolationLevel;

/// Errors reported by a [`Resource`].
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The underlying connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The resource cannot provide the requested isolation level.
    #[error("isolation level not supported: {0}")]
    UnsupportedIsolation(IsolationLevel),
}

/// Physical transaction control, injected into a
/// [`TransactionCoordinator`](super::TransactionCoordinator).
pub trait Resource {
    /// Start a physical transaction (leave auto-commit mode).
    fn begin(&mut self) -> Result<(), ResourceError>;

    /// Commit the physical transaction.
    fn commit(&mut self) -> Result<(), ResourceError>;

    /// Roll back the physical transaction.
    fn rollback(&mut self) -> Result<(), ResourceError>;

    /// Apply an isolation level to subsequent transactions.
    fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<(), ResourceError>;

    /// Isolation level the resource currently uses.
    fn isolation_level(&self) -> IsolationLevel;
}

impl<R: Resource + ?Sized> Resource for &mut R {
    fn begin(&mut self) -> Result<(), ResourceError> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<(), ResourceError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), ResourceError> {
        (**self).rollback()
    }

    fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<(), ResourceError> {
        (**self).set_isolation_level(level)
    }

    fn isolation_level(&self) -> IsolationLevel {
        (**self).isolation_level()
    }
}

impl<R: Resource + ?Sized> Resource for Box<R> {
    fn begin(&mut self) -> Result<(), ResourceError> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<(), ResourceError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), ResourceError> {
        (**self).rollback()
    }

    fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<(), ResourceError> {
        (**self).set_isolation_level(level)
    }

    fn isolation_level(&self) -> IsolationLevel {
        (**self).isolation_level()
    }
}
