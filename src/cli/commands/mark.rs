//! mark command - Record a status or PR number

use super::{open_repo, print_json};
use crate::core::metadata::BranchStatus;
use crate::engine::{self, Context, MarkRequest, Signal};
use anyhow::Result;

/// Update a tracked branch.
pub fn mark(
    ctx: &Context,
    name: String,
    status: Option<BranchStatus>,
    pr: Option<u64>,
) -> Result<Signal> {
    let handle = open_repo(ctx)?;
    let entry = engine::mark(&handle, &MarkRequest { name, status, pr })?;

    if ctx.json {
        print_json(Signal::Created, &entry)?;
    } else if !ctx.quiet {
        let pr = entry.pr.map(|n| format!(" #{}", n)).unwrap_or_default();
        println!("{} [{}]{}", entry.name, entry.status, pr);
    }
    Ok(Signal::Created)
}
