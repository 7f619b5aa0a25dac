//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository handle for the working directory
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output (human text, or JSON with `--json`)
//!
//! Handlers do NOT perform repository mutations directly. Every handler
//! returns the [`Signal`] that becomes the process exit code.

mod completion;
mod create;
mod import;
mod mark;
mod status;

pub use completion::completion;
pub use create::create;
pub use import::import;
pub use mark::mark;
pub use status::status;

use crate::cli::args::Command;
use crate::engine::{Context, RepoHandle, Signal};
use crate::git::Git;
use anyhow::{Context as _, Result};
use serde::Serialize;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<Signal> {
    match command {
        Command::Create {
            name,
            spec,
            base,
            parent_spec,
            checkout,
        } => create::create(ctx, name, spec, base, parent_spec, checkout),
        Command::Import {
            batch,
            default_spec,
            assign,
        } => import::import(ctx, batch, default_spec.as_deref(), &assign),
        Command::Status { workspace } => status::status(ctx, workspace),
        Command::Mark { name, status, pr } => {
            mark::mark(ctx, name, status.map(Into::into), pr)
        }
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Open the repository containing the working directory.
fn open_repo(ctx: &Context) -> Result<RepoHandle<Git>> {
    let cwd = match &ctx.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    RepoHandle::open(&cwd).context("Failed to open repository")
}

/// Print `{ "signal", "exitCode", "result" }` on stdout.
fn print_json<T: Serialize>(signal: Signal, result: &T) -> Result<()> {
    let value = serde_json::json!({
        "signal": signal,
        "exitCode": signal.exit_code(),
        "result": serde_json::to_value(result).context("Failed to serialize result")?,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
