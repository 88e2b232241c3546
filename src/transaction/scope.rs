//! Scoped transactions that roll back unless explicitly committed.
//!
//! A [`TransactionScope`] pairs one `begin` with exactly one `commit` or
//! `rollback`. Dropping a scope that was never finished rolls back the whole
//! transaction, which covers early returns via `?` and panics.

use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::transaction::coordinator::TransactionCoordinator;
use crate::transaction::error::TransactionResult;
use crate::transaction::resource::Resource;

/// A begun scope on a [`TransactionCoordinator`].
///
/// Derefs to the coordinator, so scopes nest with `scope.scope()`.
pub struct TransactionScope<'a, R: Resource> {
    coordinator: &'a mut TransactionCoordinator<R>,
    /// Nesting level this scope opened.
    depth: usize,
    finished: bool,
}

impl<R: Resource> TransactionCoordinator<R> {
    /// Begin a transaction scope that rolls back when dropped unfinished.
    pub fn scope(&mut self) -> TransactionResult<TransactionScope<'_, R>> {
        self.begin()?;
        let depth = self.transaction_nesting_level();
        Ok(TransactionScope {
            coordinator: self,
            depth,
            finished: false,
        })
    }
}

impl<'a, R: Resource> TransactionScope<'a, R> {
    /// Nesting level this scope was opened at.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Commit this scope.
    ///
    /// If the commit fails the scope is dropped unfinished, so the whole
    /// transaction is rolled back before the error is returned.
    pub fn commit(mut self) -> TransactionResult<()> {
        let result = self.coordinator.commit();
        if result.is_ok() {
            self.finished = true;
        }
        result
    }

    /// Roll back the whole transaction this scope belongs to.
    pub fn rollback(mut self) -> TransactionResult<()> {
        self.finished = true;
        self.coordinator.rollback()
    }

    fn still_open(&self) -> bool {
        self.coordinator.transaction_nesting_level() >= self.depth
    }
}

impl<'a, R: Resource> Deref for TransactionScope<'a, R> {
    type Target = TransactionCoordinator<R>;

    fn deref(&self) -> &Self::Target {
        self.coordinator
    }
}

impl<'a, R: Resource> DerefMut for TransactionScope<'a, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.coordinator
    }
}

impl<'a, R: Resource> Drop for TransactionScope<'a, R> {
    fn drop(&mut self) {
        if self.finished || !self.still_open() {
            return;
        }
        warn!(
            tx_id = ?self.coordinator.transaction_id(),
            depth = self.depth,
            "transaction scope dropped without commit; rolling back"
        );
        if let Err(e) = self.coordinator.rollback() {
            warn!(error = %e, "rollback of dropped scope failed");
        }
    }
}
