//! Session API - one coordinator per logical connection.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use super::command::{split_statements, Command, CommandOutput};
use crate::transaction::{
    IsolationLevel, MemoryResource, Resource, TransactionCoordinator, TransactionError,
};

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A session shared between threads. Callers serialize access through the lock.
pub type SharedSession<R = MemoryResource> = Arc<Mutex<Session<R>>>;

/// Session configuration options.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Label attached to log events.
    pub name: String,
    /// Isolation level applied when the session opens.
    pub default_isolation: Option<IsolationLevel>,
    /// Echo every command and its result to stderr.
    pub verbose: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            default_isolation: None,
            verbose: false,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with the given session name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the isolation level applied at open.
    pub fn default_isolation(mut self, level: IsolationLevel) -> Self {
        self.default_isolation = Some(level);
        self
    }

    /// Set verbose flag.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    fn validate(&self) -> SessionResult<()> {
        if self.name.trim().is_empty() {
            return Err(SessionError::InvalidConfig("session name must not be empty".into()));
        }
        Ok(())
    }
}

/// The main session handle. Owns exactly one [`TransactionCoordinator`].
pub struct Session<R: Resource = MemoryResource> {
    config: SessionConfig,
    coordinator: TransactionCoordinator<R>,
}

impl Session<MemoryResource> {
    /// Open a session over a fresh in-memory resource.
    pub fn open() -> SessionResult<Self> {
        Self::open_with_config(SessionConfig::default())
    }

    /// Open an in-memory session with custom configuration.
    pub fn open_with_config(config: SessionConfig) -> SessionResult<Self> {
        Self::with_resource(MemoryResource::new(), config)
    }
}

impl<R: Resource> Session<R> {
    /// Open a session over the given resource.
    pub fn with_resource(resource: R, config: SessionConfig) -> SessionResult<Self> {
        config.validate()?;

        let mut coordinator = TransactionCoordinator::new(resource);
        if let Some(level) = config.default_isolation {
            coordinator.set_transaction_isolation(level)?;
        }
        debug!(session = %config.name, isolation = %coordinator.transaction_isolation(), "session opened");

        Ok(Self { config, coordinator })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the session's coordinator.
    pub fn coordinator(&self) -> &TransactionCoordinator<R> {
        &self.coordinator
    }

    /// Get the session's coordinator for direct use.
    pub fn coordinator_mut(&mut self) -> &mut TransactionCoordinator<R> {
        &mut self.coordinator
    }

    /// Wrap the session for use from several threads.
    pub fn into_shared(self) -> SharedSession<R> {
        Arc::new(Mutex::new(self))
    }

    /// Parse and run a single command.
    pub fn execute(&mut self, input: &str) -> SessionResult<CommandOutput> {
        if self.config.verbose {
            eprintln!("[{}] {}", self.config.name, input.trim());
        }

        let command = Command::parse(input)?;
        let result = self.run(command)?;

        if self.config.verbose {
            eprintln!("[Result] {:?}", result);
        }

        Ok(result)
    }

    /// Execute multiple commands separated by semicolons.
    ///
    /// Stops at the first failing command.
    pub fn execute_batch(&mut self, input: &str) -> SessionResult<Vec<CommandOutput>> {
        let mut results = Vec::new();

        for stmt in split_statements(input) {
            results.push(self.execute(stmt)?);
        }

        Ok(results)
    }

    /// Run an already parsed command.
    pub fn run(&mut self, command: Command) -> SessionResult<CommandOutput> {
        debug!(session = %self.config.name, ?command, "run command");
        let tx = &mut self.coordinator;

        let output = match command {
            Command::Begin => {
                tx.begin()?;
                ok(format!("BEGIN (level {})", tx.transaction_nesting_level()))
            }
            Command::Commit => {
                tx.commit()?;
                ok(format!("COMMIT (level {})", tx.transaction_nesting_level()))
            }
            Command::Rollback => {
                tx.rollback()?;
                ok("ROLLBACK".to_string())
            }
            Command::SetRollbackOnly => {
                tx.set_rollback_only()?;
                ok("transaction marked rollback-only".to_string())
            }
            Command::ShowRollbackOnly => CommandOutput::Value(tx.is_rollback_only()?.to_string()),
            Command::SetIsolation(level) => {
                tx.set_transaction_isolation(level)?;
                ok(format!("isolation level set to {}", level))
            }
            Command::ShowIsolation => CommandOutput::Value(tx.transaction_isolation().to_string()),
            Command::ShowNestingLevel => {
                CommandOutput::Value(tx.transaction_nesting_level().to_string())
            }
            Command::ShowActive => CommandOutput::Value(tx.is_transaction_active().to_string()),
            Command::Status => CommandOutput::Status(tx.status()),
        };

        Ok(output)
    }

    /// Execute within a transaction, committing on success.
    pub fn transaction<F, T>(&mut self, f: F) -> SessionResult<T>
    where
        F: FnOnce(&mut Self) -> SessionResult<T>,
    {
        self.coordinator.begin()?;
        let depth = self.coordinator.transaction_nesting_level();

        let outcome = f(self).and_then(|value| {
            self.coordinator.commit()?;
            Ok(value)
        });

        if outcome.is_err() && self.coordinator.transaction_nesting_level() >= depth {
            if let Err(e) = self.coordinator.rollback() {
                tracing::warn!(session = %self.config.name, error = %e, "rollback after failed session transaction failed");
            }
        }
        outcome
    }
}

fn ok(message: String) -> CommandOutput {
    CommandOutput::Ok { message }
}

impl<R: Resource> std::fmt::Debug for Session<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::PhysicalOp;

    #[test]
    fn test_open_session() {
        let session = Session::open().unwrap();
        assert!(!session.coordinator().is_transaction_active());
        assert_eq!(
            session.coordinator().transaction_isolation(),
            IsolationLevel::ReadCommitted
        );
    }

    #[test]
    fn test_default_isolation_applied() {
        let config = SessionConfig::new("reports").default_isolation(IsolationLevel::Serializable);
        let session = Session::open_with_config(config).unwrap();
        assert_eq!(
            session.coordinator().transaction_isolation(),
            IsolationLevel::Serializable
        );
        assert_eq!(
            session.coordinator().resource().journal(),
            vec![PhysicalOp::SetIsolation(IsolationLevel::Serializable)]
        );
    }

    #[test]
    fn test_unsupported_default_isolation_fails_open() {
        let resource = MemoryResource::new().with_supported_levels(&[IsolationLevel::ReadCommitted]);
        let config = SessionConfig::default().default_isolation(IsolationLevel::Serializable);
        let err = Session::with_resource(resource, config).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transaction(TransactionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = Session::open_with_config(SessionConfig::new("  ")).unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[test]
    fn test_execute_commands() {
        let mut session = Session::open().unwrap();

        session.execute("BEGIN").unwrap();
        session.execute("BEGIN").unwrap();
        assert_eq!(
            session.execute("SHOW NESTING LEVEL").unwrap(),
            CommandOutput::Value("2".into())
        );
        assert_eq!(
            session.execute("SHOW ACTIVE").unwrap(),
            CommandOutput::Value("true".into())
        );
        session.execute("COMMIT").unwrap();
        session.execute("COMMIT").unwrap();
        assert_eq!(
            session.execute("SHOW ACTIVE").unwrap(),
            CommandOutput::Value("false".into())
        );
    }

    #[test]
    fn test_rollback_only_scenario() {
        let mut session = Session::open().unwrap();
        session.execute_batch("BEGIN; BEGIN; BEGIN; SET ROLLBACK ONLY").unwrap();

        let err = session.execute("COMMIT").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transaction(TransactionError::RollbackOnly)
        ));
        assert_eq!(
            session.execute("SHOW NESTING LEVEL").unwrap(),
            CommandOutput::Value("3".into())
        );

        session.execute("ROLLBACK").unwrap();
        assert_eq!(session.coordinator().transaction_nesting_level(), 0);
        assert!(!session.coordinator().status().rollback_only);
    }

    #[test]
    fn test_isolation_scenario() {
        let mut session = Session::open().unwrap();
        session.execute("SET ISOLATION LEVEL SERIALIZABLE").unwrap();
        session.execute("BEGIN").unwrap();

        let err = session.execute("SET ISOLATION LEVEL READ COMMITTED").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transaction(TransactionError::InvalidState(_))
        ));
        assert_eq!(
            session.execute("SHOW ISOLATION LEVEL").unwrap(),
            CommandOutput::Value("SERIALIZABLE".into())
        );
    }

    #[test]
    fn test_show_rollback_only_requires_transaction() {
        let mut session = Session::open().unwrap();
        assert!(matches!(
            session.execute("SHOW ROLLBACK ONLY"),
            Err(SessionError::Transaction(TransactionError::NoActiveTransaction))
        ));
    }

    #[test]
    fn test_execute_batch_stops_at_error() {
        let mut session = Session::open().unwrap();
        let err = session.execute_batch("BEGIN; COMMIT; COMMIT; BEGIN").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transaction(TransactionError::NoActiveTransaction)
        ));
        assert!(!session.coordinator().is_transaction_active());
    }

    #[test]
    fn test_status_output() {
        let mut session = Session::open().unwrap();
        session.execute("BEGIN").unwrap();
        match session.execute("STATUS").unwrap() {
            CommandOutput::Status(status) => {
                assert!(status.active);
                assert_eq!(status.nesting_level, 1);
                assert!(status.transaction_id.is_some());
            }
            other => panic!("Expected Status output, got {:?}", other),
        }
    }

    #[test]
    fn test_session_transaction_rolls_back_on_error() {
        let mut session = Session::open().unwrap();
        let result: SessionResult<()> = session.transaction(|s| {
            s.execute("BEGIN")?;
            s.execute("BOGUS")?;
            Ok(())
        });

        assert!(matches!(result, Err(SessionError::UnknownCommand(_))));
        assert!(!session.coordinator().is_transaction_active());
        assert_eq!(
            session.coordinator().resource().journal(),
            vec![PhysicalOp::Begin, PhysicalOp::Rollback]
        );
    }

    #[test]
    fn test_shared_session_across_threads() {
        let shared = Session::open().unwrap().into_shared();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    let mut session = shared.lock();
                    session.execute("BEGIN").unwrap();
                    session.execute("BEGIN").unwrap();
                    session.execute("COMMIT").unwrap();
                    session.execute("COMMIT").unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let session = shared.lock();
        assert!(!session.coordinator().is_transaction_active());
        assert_eq!(session.coordinator().resource().journal().len(), 8);
    }
}
