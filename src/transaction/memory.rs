//! In-memory [`Resource`] that journals every physical operation.
//!
//! Used by the REPL and by tests. Clones share state, so a clone kept by the
//! caller can inspect the journal or inject failures while the coordinator
//! owns the other.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::transaction::isolation::IsolationLevel;
use crate::transaction::resource::{Resource, ResourceError};

/// A physical operation that reached the resource and succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhysicalOp {
    Begin,
    Commit,
    Rollback,
    SetIsolation(IsolationLevel),
}

/// Operation kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Begin,
    Commit,
    Rollback,
    SetIsolation,
}

#[derive(Debug)]
struct MemoryState {
    journal: Vec<PhysicalOp>,
    pending_failures: HashSet<OpKind>,
    in_transaction: bool,
    isolation: IsolationLevel,
    supported: Vec<IsolationLevel>,
}

/// In-memory resource with a shared operation journal.
#[derive(Debug, Clone)]
pub struct MemoryResource {
    inner: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryResource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResource {
    /// Create a resource supporting every isolation level, defaulting to
    /// READ COMMITTED.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState {
                journal: Vec::new(),
                pending_failures: HashSet::new(),
                in_transaction: false,
                isolation: IsolationLevel::default(),
                supported: IsolationLevel::ALL.to_vec(),
            })),
        }
    }

    /// Set the isolation level reported before any level is applied.
    pub fn with_default_isolation(self, level: IsolationLevel) -> Self {
        self.inner.lock().isolation = level;
        self
    }

    /// Restrict the isolation levels this resource accepts.
    pub fn with_supported_levels(self, levels: &[IsolationLevel]) -> Self {
        self.inner.lock().supported = levels.to_vec();
        self
    }

    /// Make the next operation of the given kind fail with a connection error.
    pub fn fail_next(&self, op: OpKind) {
        self.inner.lock().pending_failures.insert(op);
    }

    /// Snapshot of the successful operations so far.
    pub fn journal(&self) -> Vec<PhysicalOp> {
        self.inner.lock().journal.clone()
    }

    /// Whether a physical transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.inner.lock().in_transaction
    }

    fn take_failure(state: &mut MemoryState, op: OpKind) -> Result<(), ResourceError> {
        if state.pending_failures.remove(&op) {
            return Err(ResourceError::Connection(format!(
                "injected {:?} failure",
                op
            )));
        }
        Ok(())
    }
}

impl Resource for MemoryResource {
    fn begin(&mut self) -> Result<(), ResourceError> {
        let mut state = self.inner.lock();
        Self::take_failure(&mut state, OpKind::Begin)?;
        if state.in_transaction {
            return Err(ResourceError::Connection(
                "physical transaction already open".into(),
            ));
        }
        state.in_transaction = true;
        state.journal.push(PhysicalOp::Begin);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ResourceError> {
        let mut state = self.inner.lock();
        Self::take_failure(&mut state, OpKind::Commit)?;
        if !state.in_transaction {
            return Err(ResourceError::Connection(
                "no physical transaction to commit".into(),
            ));
        }
        state.in_transaction = false;
        state.journal.push(PhysicalOp::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ResourceError> {
        let mut state = self.inner.lock();
        // A failed rollback still abandons the physical transaction.
        let was_open = std::mem::replace(&mut state.in_transaction, false);
        Self::take_failure(&mut state, OpKind::Rollback)?;
        if !was_open {
            return Err(ResourceError::Connection(
                "no physical transaction to roll back".into(),
            ));
        }
        state.journal.push(PhysicalOp::Rollback);
        Ok(())
    }

    fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<(), ResourceError> {
        let mut state = self.inner.lock();
        Self::take_failure(&mut state, OpKind::SetIsolation)?;
        if !state.supported.contains(&level) {
            return Err(ResourceError::UnsupportedIsolation(level));
        }
        state.isolation = level;
        state.journal.push(PhysicalOp::SetIsolation(level));
        Ok(())
    }

    fn isolation_level(&self) -> IsolationLevel {
        self.inner.lock().isolation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_records_successful_ops() {
        let mut resource = MemoryResource::new();
        resource.begin().unwrap();
        resource.commit().unwrap();
        resource.set_isolation_level(IsolationLevel::Serializable).unwrap();

        assert_eq!(
            resource.journal(),
            vec![
                PhysicalOp::Begin,
                PhysicalOp::Commit,
                PhysicalOp::SetIsolation(IsolationLevel::Serializable),
            ]
        );
        assert_eq!(resource.isolation_level(), IsolationLevel::Serializable);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = MemoryResource::new();
        let mut resource = handle.clone();
        resource.begin().unwrap();
        assert!(handle.in_transaction());
        assert_eq!(handle.journal(), vec![PhysicalOp::Begin]);
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let mut resource = MemoryResource::new();
        resource.fail_next(OpKind::Begin);
        assert!(matches!(resource.begin(), Err(ResourceError::Connection(_))));
        assert!(!resource.in_transaction());
        resource.begin().unwrap();
        assert!(resource.in_transaction());
    }

    #[test]
    fn test_double_begin_rejected() {
        let mut resource = MemoryResource::new();
        resource.begin().unwrap();
        assert!(resource.begin().is_err());
    }

    #[test]
    fn test_failed_rollback_abandons_transaction() {
        let mut resource = MemoryResource::new();
        resource.begin().unwrap();
        resource.fail_next(OpKind::Rollback);
        assert!(resource.rollback().is_err());
        assert!(!resource.in_transaction());
        assert_eq!(resource.journal(), vec![PhysicalOp::Begin]);
    }

    #[test]
    fn test_unsupported_isolation() {
        let mut resource = MemoryResource::new()
            .with_supported_levels(&[IsolationLevel::ReadCommitted, IsolationLevel::Serializable]);
        let err = resource
            .set_isolation_level(IsolationLevel::ReadUncommitted)
            .unwrap_err();
        assert!(matches!(
            err,
            ResourceError::UnsupportedIsolation(IsolationLevel::ReadUncommitted)
        ));
        assert_eq!(resource.isolation_level(), IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_default_isolation_override() {
        let resource = MemoryResource::new().with_default_isolation(IsolationLevel::RepeatableRead);
        assert_eq!(resource.isolation_level(), IsolationLevel::RepeatableRead);
    }
}
