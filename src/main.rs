//! nestedtx - A nested transaction coordinator
//!
//! This is the main entry point for the nestedtx command-line interface.

use std::process::ExitCode;

use nestedtx::logging::LogConfig;
use nestedtx::session::{CommandOutput, Repl, ReplConfig, Session, SessionConfig};
use nestedtx::transaction::IsolationLevel;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    // Parse simple command line args.
    let mut name = String::from("cli");
    let mut isolation: Option<IsolationLevel> = None;
    let mut verbose = false;
    let mut json = false;
    let mut log_level: Option<String> = None;
    let mut execute: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--name" => {
                i += 1;
                if i < args.len() {
                    name = args[i].clone();
                }
            }
            "-i" | "--isolation" => {
                i += 1;
                if i < args.len() {
                    match args[i].parse() {
                        Ok(level) => isolation = Some(level),
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            return ExitCode::FAILURE;
                        }
                    }
                }
            }
            "-e" | "--execute" => {
                i += 1;
                if i < args.len() {
                    execute = Some(args[i].clone());
                }
            }
            "--log-level" => {
                i += 1;
                if i < args.len() {
                    log_level = Some(args[i].clone());
                }
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            "--json" => {
                json = true;
            }
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("nestedtx v{}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            arg => {
                eprintln!("Unknown option: {}", arg);
                return ExitCode::FAILURE;
            }
        }
        i += 1;
    }

    let log_config = match log_level {
        Some(level) => LogConfig::default().with_level(level),
        None if verbose => LogConfig::debug(),
        None => LogConfig::default(),
    };
    if let Err(e) = log_config.init() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Open session.
    let mut config = SessionConfig::new(name).verbose(verbose);
    if let Some(level) = isolation {
        config = config.default_isolation(level);
    }

    let session = match Session::open_with_config(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error opening session: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Execute commands or run REPL.
    let result = match execute {
        Some(commands) => execute_commands(session, &commands, json),
        None => run_repl(session, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("nestedtx - A nested transaction coordinator");
    println!();
    println!("Usage: nestedtx [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -n, --name NAME          Session name used in logs (default: cli)");
    println!("  -i, --isolation LEVEL    Isolation level applied at startup");
    println!("  -e, --execute CMDS       Execute semicolon-separated commands and exit");
    println!("  -v, --verbose            Echo commands and enable debug logging");
    println!("      --log-level FILTER   Log filter, e.g. 'debug' or 'nestedtx=trace'");
    println!("      --json               Print STATUS output as JSON");
    println!("  -h, --help               Show this help message");
    println!("  --version                Show version");
    println!();
    println!("Examples:");
    println!("  nestedtx                                    Start REPL");
    println!("  nestedtx -i serializable                    Start REPL at SERIALIZABLE");
    println!("  nestedtx -e 'BEGIN; BEGIN; COMMIT; STATUS'  Execute commands and exit");
}

fn execute_commands(
    mut session: Session,
    commands: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for result in session.execute_batch(commands)? {
        print_result(&result, json)?;
    }
    Ok(())
}

fn run_repl(session: Session, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = ReplConfig {
        json,
        ..Default::default()
    };
    let mut repl = Repl::with_config(session, config);
    repl.run()?;
    Ok(())
}

fn print_result(result: &CommandOutput, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        CommandOutput::Status(status) if json => {
            println!("{}", serde_json::to_string_pretty(status)?);
        }
        other => println!("{}", other),
    }
    Ok(())
}
