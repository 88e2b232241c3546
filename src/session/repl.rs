//! Interactive REPL (Read-Eval-Print Loop) for nestedtx.

use std::io::{self, BufRead, Write};

use super::api::{Session, SessionResult};
use super::command::{split_statements, CommandOutput};

/// REPL configuration.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Prompt string.
    pub prompt: String,
    /// Show timing information.
    pub timing: bool,
    /// Print STATUS and .journal output as JSON.
    pub json: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "nestedtx".into(),
            timing: false,
            json: false,
        }
    }
}

/// The interactive REPL.
pub struct Repl {
    session: Session,
    config: ReplConfig,
    history: Vec<String>,
}

impl Repl {
    /// Create a new REPL with the given session.
    pub fn new(session: Session) -> Self {
        Self::with_config(session, ReplConfig::default())
    }

    /// Create a REPL with custom configuration.
    pub fn with_config(session: Session, config: ReplConfig) -> Self {
        Self {
            session,
            config,
            history: Vec::new(),
        }
    }

    /// Get the session driven by this REPL.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the REPL interactively on stdin/stdout.
    pub fn run(&mut self) -> SessionResult<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.print_banner(&mut stdout.lock())?;
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the REPL over arbitrary input and output.
    pub fn run_with<I: BufRead, W: Write>(&mut self, input: I, mut out: W) -> SessionResult<()> {
        let mut lines = input.lines();

        loop {
            write!(out, "{}", self.prompt())?;
            out.flush()?;

            let line = match lines.next() {
                Some(Ok(line)) => line,
                // Undecodable input only loses that line.
                Some(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                    writeln!(out, "Error: {}", e)?;
                    continue;
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    // EOF.
                    writeln!(out, "\nGoodbye!")?;
                    break;
                }
            };

            let cmd = line.trim();
            if cmd.is_empty() {
                continue;
            }

            self.history.push(cmd.to_string());

            // Handle special commands.
            if self.is_command(cmd) {
                match self.handle_command(cmd, &mut out) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
                continue;
            }

            for stmt in split_statements(cmd) {
                let start = std::time::Instant::now();
                match self.session.execute(stmt) {
                    Ok(result) => {
                        self.print_result(&result, &mut out)?;
                        if self.config.timing {
                            writeln!(out, "Time: {:.3}ms", start.elapsed().as_secs_f64() * 1000.0)?;
                        }
                    }
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
            }
        }

        Ok(())
    }

    /// Prompt showing the nesting level while a transaction is open.
    fn prompt(&self) -> String {
        let level = self.session.coordinator().transaction_nesting_level();
        if level > 0 {
            format!("{}[{}]> ", self.config.prompt, level)
        } else {
            format!("{}> ", self.config.prompt)
        }
    }

    fn print_banner<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "╔═══════════════════════════════════════════════════╗")?;
        writeln!(out, "║                  nestedtx v0.1.0                  ║")?;
        writeln!(out, "║          A nested transaction coordinator         ║")?;
        writeln!(out, "╠═══════════════════════════════════════════════════╣")?;
        writeln!(out, "║    Type .help for commands, or enter a command    ║")?;
        writeln!(out, "╚═══════════════════════════════════════════════════╝")?;
        writeln!(out)
    }

    fn is_command(&self, input: &str) -> bool {
        input.starts_with('.') || input.starts_with('\\')
    }

    fn handle_command<W: Write>(&mut self, cmd: &str, out: &mut W) -> SessionResult<bool> {
        let cmd = cmd.trim_start_matches(&['.', '\\'][..]);
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let command = parts.first().map(|s| s.to_lowercase());

        match command.as_deref() {
            Some("help") | Some("h") | Some("?") => {
                self.print_help(out)?;
            }
            Some("quit") | Some("exit") | Some("q") => {
                return Ok(true);
            }
            Some("history") => {
                writeln!(out, "Command History:")?;
                for (i, cmd) in self.history.iter().enumerate() {
                    writeln!(out, "  {}: {}", i + 1, cmd)?;
                }
            }
            Some("journal") => {
                let journal = self.session.coordinator().resource().journal();
                if self.config.json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&journal)?)?;
                    return Ok(false);
                }
                if journal.is_empty() {
                    writeln!(out, "No physical operations yet.")?;
                }
                for (i, op) in journal.iter().enumerate() {
                    writeln!(out, "  {}: {:?}", i + 1, op)?;
                }
            }
            Some("timing") => {
                self.config.timing = !self.config.timing;
                writeln!(out, "Timing: {}", if self.config.timing { "on" } else { "off" })?;
            }
            Some("json") => {
                self.config.json = !self.config.json;
                writeln!(out, "JSON status: {}", if self.config.json { "on" } else { "off" })?;
            }
            Some(cmd) => {
                writeln!(out, "Unknown command: .{}", cmd)?;
                writeln!(out, "Type .help for available commands")?;
            }
            None => {}
        }

        Ok(false)
    }

    fn print_help<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Commands:")?;
        writeln!(out, "  .help, .h, .?           Show this help message")?;
        writeln!(out, "  .quit, .exit, .q        Exit the REPL")?;
        writeln!(out, "  .history                Show command history")?;
        writeln!(out, "  .journal                Show physical operations")?;
        writeln!(out, "  .timing                 Toggle timing display")?;
        writeln!(out, "  .json                   Toggle JSON status/journal output")?;
        writeln!(out)?;
        writeln!(out, "Transaction commands:")?;
        writeln!(out, "  BEGIN / COMMIT / ROLLBACK")?;
        writeln!(out, "  SET ROLLBACK ONLY / SHOW ROLLBACK ONLY")?;
        writeln!(out, "  SET ISOLATION LEVEL <level> / SHOW ISOLATION LEVEL")?;
        writeln!(out, "  SHOW NESTING LEVEL / SHOW ACTIVE / STATUS")?;
        writeln!(out)
    }

    fn print_result<W: Write>(&self, result: &CommandOutput, out: &mut W) -> SessionResult<()> {
        match result {
            CommandOutput::Status(status) if self.config.json => {
                writeln!(out, "{}", serde_json::to_string_pretty(status)?)?;
            }
            other => writeln!(out, "{}", other)?,
        }
        Ok(())
    }
}
