//! Textual transaction-control commands.
//!
//! The grammar is a small SQL-like subset, case-insensitive, with an optional
//! trailing semicolon:
//!
//! ```text
//! BEGIN | START TRANSACTION
//! COMMIT
//! ROLLBACK
//! SET ROLLBACK ONLY
//! SHOW ROLLBACK ONLY
//! SET [TRANSACTION] ISOLATION LEVEL <level>
//! SHOW [TRANSACTION] ISOLATION LEVEL
//! SHOW NESTING LEVEL
//! SHOW ACTIVE
//! STATUS
//! ```

use std::fmt;

use super::api::{SessionError, SessionResult};
use crate::transaction::{IsolationLevel, TransactionStatus};

/// A parsed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Begin,
    Commit,
    Rollback,
    SetRollbackOnly,
    ShowRollbackOnly,
    SetIsolation(IsolationLevel),
    ShowIsolation,
    ShowNestingLevel,
    ShowActive,
    Status,
}

impl Command {
    /// Parse a single command.
    pub fn parse(input: &str) -> SessionResult<Self> {
        let trimmed = input.trim().trim_end_matches(';');
        let words: Vec<String> = trimmed
            .split_whitespace()
            .map(|w| w.to_uppercase())
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let command = match words.as_slice() {
            ["BEGIN"] | ["BEGIN", "TRANSACTION"] | ["START", "TRANSACTION"] => Command::Begin,
            ["COMMIT"] => Command::Commit,
            ["ROLLBACK"] => Command::Rollback,
            ["SET", "ROLLBACK", "ONLY"] => Command::SetRollbackOnly,
            ["SHOW", "ROLLBACK", "ONLY"] => Command::ShowRollbackOnly,
            ["SET", "ISOLATION", "LEVEL", level @ ..]
            | ["SET", "TRANSACTION", "ISOLATION", "LEVEL", level @ ..]
                if !level.is_empty() =>
            {
                Command::SetIsolation(level.join(" ").parse()?)
            }
            ["SHOW", "ISOLATION", "LEVEL"] | ["SHOW", "TRANSACTION", "ISOLATION", "LEVEL"] => {
                Command::ShowIsolation
            }
            ["SHOW", "NESTING", "LEVEL"] => Command::ShowNestingLevel,
            ["SHOW", "ACTIVE"] => Command::ShowActive,
            ["STATUS"] => Command::Status,
            _ => return Err(SessionError::UnknownCommand(trimmed.to_string())),
        };

        Ok(command)
    }
}

/// Split a line or batch on semicolons, skipping empty statements.
pub fn split_statements(input: &str) -> impl Iterator<Item = &str> {
    input.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Result of running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// The command changed state.
    Ok { message: String },
    /// The command reported a value.
    Value(String),
    /// Full state snapshot.
    Status(TransactionStatus),
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Ok { message } => write!(f, "{}", message),
            CommandOutput::Value(value) => write!(f, "{}", value),
            CommandOutput::Status(status) => {
                writeln!(f, "active:         {}", status.active)?;
                writeln!(f, "nesting level:  {}", status.nesting_level)?;
                writeln!(f, "isolation:      {}", status.isolation)?;
                writeln!(f, "rollback only:  {}", status.rollback_only)?;
                write!(
                    f,
                    "transaction:    {}",
                    status.transaction_id.as_deref().unwrap_or("-")
                )?;
                if let Some(started) = status.started_at {
                    write!(f, "\nstarted at:     {}", started.to_rfc3339())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionError;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(Command::parse("begin").unwrap(), Command::Begin);
        assert_eq!(Command::parse("START TRANSACTION;").unwrap(), Command::Begin);
        assert_eq!(Command::parse("  Commit ; ").unwrap(), Command::Commit);
        assert_eq!(Command::parse("ROLLBACK").unwrap(), Command::Rollback);
        assert_eq!(Command::parse("set rollback only").unwrap(), Command::SetRollbackOnly);
        assert_eq!(Command::parse("show rollback only").unwrap(), Command::ShowRollbackOnly);
        assert_eq!(Command::parse("show nesting level").unwrap(), Command::ShowNestingLevel);
        assert_eq!(Command::parse("SHOW ACTIVE").unwrap(), Command::ShowActive);
        assert_eq!(Command::parse("status").unwrap(), Command::Status);
    }

    #[test]
    fn test_parse_isolation_commands() {
        assert_eq!(
            Command::parse("SET ISOLATION LEVEL serializable").unwrap(),
            Command::SetIsolation(IsolationLevel::Serializable)
        );
        assert_eq!(
            Command::parse("set transaction isolation level read committed;").unwrap(),
            Command::SetIsolation(IsolationLevel::ReadCommitted)
        );
        assert_eq!(
            Command::parse("SHOW TRANSACTION ISOLATION LEVEL").unwrap(),
            Command::ShowIsolation
        );
    }

    #[test]
    fn test_parse_unknown_isolation() {
        let err = Command::parse("SET ISOLATION LEVEL chaos").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transaction(TransactionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(matches!(
            Command::parse("SELECT 1"),
            Err(SessionError::UnknownCommand(_))
        ));
        assert!(matches!(
            Command::parse("SET ISOLATION LEVEL"),
            Err(SessionError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_split_statements() {
        let statements: Vec<&str> = split_statements(" BEGIN; begin;; COMMIT;ROLLBACK ;").collect();
        assert_eq!(statements, vec!["BEGIN", "begin", "COMMIT", "ROLLBACK"]);
        assert_eq!(split_statements(" ; ;").count(), 0);
    }
}
