//! cli
//!
//! Command-line interface layer for specstack.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialize logging
//! - Delegate to command handlers
//! - Does NOT perform repository mutations directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Every handler returns a
//! [`Signal`](crate::engine::Signal) that `main` turns into the exit code.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine::{self, EngineError, Signal};
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<Signal> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
    };

    let result = commands::dispatch(cli.command, &ctx);
    if let (true, Err(err)) = (ctx.json, &result) {
        let signal = signal_for(err);
        let value = serde_json::json!({
            "signal": signal,
            "exitCode": signal.exit_code(),
            "error": format!("{:#}", err),
        });
        println!("{}", value);
    }
    result
}

/// The signal for a failed command: validation errors are rejections,
/// everything else is a failure.
pub fn signal_for(err: &anyhow::Error) -> Signal {
    err.downcast_ref::<EngineError>()
        .map(EngineError::signal)
        .unwrap_or(Signal::Failure)
}

/// Log to stderr. `RUST_LOG` wins; otherwise `--debug` selects the level.
fn init_logging(debug: bool) {
    let default_level = if debug { "specstack=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stack::StackError;
    use crate::core::types::BranchName;

    #[test]
    fn engine_errors_keep_their_signal_through_context() {
        let err: anyhow::Error = EngineError::Stack(StackError::DuplicateBranchName(
            BranchName::new("feature/db").unwrap(),
        ))
        .into();
        let err = err.context("create failed");
        assert_eq!(signal_for(&err), Signal::ValidationRejected);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(signal_for(&other), Signal::Failure);
    }
}
