//! Transaction isolation levels.
//!
//! The four ANSI levels are supported. Whether a given level is honored is up
//! to the [`Resource`](super::Resource) the coordinator drives; a resource may
//! reject levels it cannot provide.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::transaction::error::TransactionError;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IsolationLevel {
    /// Read Uncommitted isolation.
    ///
    /// Dirty reads are allowed: a transaction may observe changes other
    /// transactions have not committed yet.
    ReadUncommitted,

    /// Read Committed isolation.
    ///
    /// Each read sees the most recently committed data at the time of the read.
    /// Two reads inside one transaction may disagree if another transaction
    /// commits in between.
    #[default]
    ReadCommitted,

    /// Repeatable Read isolation.
    ///
    /// Rows read once keep returning the same values for the rest of the
    /// transaction. Phantom rows may still appear.
    RepeatableRead,

    /// Serializable isolation.
    ///
    /// Concurrent transactions behave as if they had run one after another.
    Serializable,
}

impl IsolationLevel {
    /// All levels, weakest first.
    pub const ALL: [IsolationLevel; 4] = [
        IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable,
    ];

    /// Integer code used by drivers that model isolation as a bit constant.
    pub fn code(&self) -> i32 {
        match self {
            IsolationLevel::ReadUncommitted => 1,
            IsolationLevel::ReadCommitted => 2,
            IsolationLevel::RepeatableRead => 4,
            IsolationLevel::Serializable => 8,
        }
    }

    /// Resolve an integer code back into a level.
    pub fn from_code(code: i32) -> Result<Self, TransactionError> {
        IsolationLevel::ALL
            .into_iter()
            .find(|level| level.code() == code)
            .ok_or_else(|| {
                TransactionError::InvalidArgument(format!("unknown isolation level code: {}", code))
            })
    }

    /// Check whether this level is at least as strict as `other`.
    pub fn is_at_least(&self, other: IsolationLevel) -> bool {
        self.code() >= other.code()
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationLevel::ReadUncommitted => write!(f, "READ UNCOMMITTED"),
            IsolationLevel::ReadCommitted => write!(f, "READ COMMITTED"),
            IsolationLevel::RepeatableRead => write!(f, "REPEATABLE READ"),
            IsolationLevel::Serializable => write!(f, "SERIALIZABLE"),
        }
    }
}

/// Parse isolation level from string (SQL syntax).
impl std::str::FromStr for IsolationLevel {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match normalized.as_str() {
            "READ UNCOMMITTED" | "READ_UNCOMMITTED" | "READUNCOMMITTED" => {
                Ok(IsolationLevel::ReadUncommitted)
            }
            "READ COMMITTED" | "READ_COMMITTED" | "READCOMMITTED" => {
                Ok(IsolationLevel::ReadCommitted)
            }
            "REPEATABLE READ" | "REPEATABLE_READ" | "REPEATABLEREAD" => {
                Ok(IsolationLevel::RepeatableRead)
            }
            "SERIALIZABLE" => Ok(IsolationLevel::Serializable),
            _ => Err(TransactionError::InvalidArgument(format!(
                "unknown isolation level: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_isolation() {
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_parse_isolation() {
        assert_eq!(
            "READ COMMITTED".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::ReadCommitted
        );
        assert_eq!(
            "repeatable   read".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::RepeatableRead
        );
        assert_eq!(
            "read_uncommitted".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::ReadUncommitted
        );
        assert_eq!(
            "serializable".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::Serializable
        );
    }

    #[test]
    fn test_parse_unknown_is_invalid_argument() {
        let err = "snapshot".parse::<IsolationLevel>().unwrap_err();
        assert!(matches!(err, TransactionError::InvalidArgument(_)));
    }

    #[test]
    fn test_codes() {
        for level in IsolationLevel::ALL {
            assert_eq!(IsolationLevel::from_code(level.code()).unwrap(), level);
        }
        assert!(matches!(
            IsolationLevel::from_code(3),
            Err(TransactionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_strictness_ordering() {
        assert!(IsolationLevel::Serializable.is_at_least(IsolationLevel::RepeatableRead));
        assert!(IsolationLevel::ReadCommitted.is_at_least(IsolationLevel::ReadCommitted));
        assert!(!IsolationLevel::ReadUncommitted.is_at_least(IsolationLevel::ReadCommitted));
    }

    #[test]
    fn test_display_parses_back() {
        for level in IsolationLevel::ALL {
            assert_eq!(level.to_string().parse::<IsolationLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&IsolationLevel::RepeatableRead).unwrap();
        assert_eq!(json, "\"REPEATABLE_READ\"");
    }
}
