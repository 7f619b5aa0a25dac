//! status command - Display the dependency tree

use super::{open_repo, print_json};
use crate::engine::{self, Context, Signal};
use anyhow::Result;

/// Show this repository's tree, or the whole workspace with `workspace`.
///
/// A workspace whose child documents cannot be read still prints every
/// section, but exits as a failure.
pub fn status(ctx: &Context, workspace: bool) -> Result<Signal> {
    let handle = open_repo(ctx)?;

    if workspace {
        let report = engine::workspace_status(&handle)?;
        let signal = report.signal();
        if ctx.json {
            print_json(signal, &report)?;
        } else {
            print!("{}", engine::render_workspace(&report.root, &report.children));
            for child in report.unreadable() {
                eprintln!(
                    "error: dependency document of child '{}' is unreadable",
                    child.name
                );
            }
        }
        return Ok(signal);
    }

    let section = engine::repository_status(&handle)?;
    if ctx.json {
        print_json(Signal::Created, &section)?;
    } else {
        print!(
            "{}",
            engine::render_repository(&section.name, &section.document)
        );
    }
    Ok(Signal::Created)
}
