//! Sessions, textual commands and the interactive REPL.
//!
//! A [`Session`] owns exactly one [`TransactionCoordinator`](crate::transaction::TransactionCoordinator);
//! there is no global transaction state.

mod api;
mod command;
mod repl;

pub use api::{Session, SessionConfig, SessionError, SessionResult, SharedSession};
pub use command::{Command, CommandOutput};
pub use repl::{Repl, ReplConfig};
