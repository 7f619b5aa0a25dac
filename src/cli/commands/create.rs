//! create command - Create a stacked branch and track it

use super::{open_repo, print_json};
use crate::engine::{self, Context, CreateOutcome, CreateRequest, Signal};
use anyhow::Result;

/// Create a branch on its base and report any PR suggestion.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `name` - Name for the new branch
/// * `spec` - Spec id the branch implements
/// * `base` - Base branch (defaults to trunk)
/// * `parent_spec` - Root spec id, child repositories only
/// * `checkout` - Switch to the branch afterwards
pub fn create(
    ctx: &Context,
    name: String,
    spec: String,
    base: Option<String>,
    parent_spec: Option<String>,
    checkout: bool,
) -> Result<Signal> {
    let handle = open_repo(ctx)?;
    let request = CreateRequest {
        name,
        spec_id: spec,
        base,
        parent_spec_id: parent_spec,
        checkout,
    };
    let outcome = engine::create(&handle, &request)?;
    let signal = outcome.signal();

    if ctx.json {
        print_json(signal, &outcome)?;
    } else {
        print_outcome(ctx, &outcome);
    }
    Ok(signal)
}

fn print_outcome(ctx: &Context, outcome: &CreateOutcome) {
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    if ctx.quiet {
        return;
    }

    let entry = &outcome.entry;
    let verb = if outcome.branch_created {
        "Created"
    } else {
        "Tracking"
    };
    println!(
        "{} '{}' on '{}' (spec {})",
        verb, entry.name, entry.base_branch, entry.spec_id
    );

    if let Some(suggestion) = &outcome.suggestion {
        println!();
        println!("'{}' is ready for review. Suggested PR:", suggestion.head);
        println!("  base:  {}", suggestion.base);
        println!("  title: {}", suggestion.title);
        println!("  body:");
        for line in suggestion.body.lines() {
            println!("    {}", line);
        }
    }
}
