//! import command - Track existing local branches

use std::collections::BTreeMap;

use super::{open_repo, print_json};
use crate::core::types::{BranchName, SpecId};
use crate::engine::{self, Context, EngineError, ImportMode, ImportOutcome, Signal};
use anyhow::Result;

/// Import untracked branches, or list them when `batch` is false.
pub fn import(
    ctx: &Context,
    batch: bool,
    default_spec: Option<&str>,
    assign: &[String],
) -> Result<Signal> {
    let mode = if batch {
        ImportMode::Batch {
            default_spec: default_spec.map(SpecId::new).transpose().map_err(EngineError::from)?,
            assignments: parse_assignments(assign)?,
        }
    } else {
        ImportMode::Interactive
    };

    let handle = open_repo(ctx)?;
    let outcome = engine::import(&handle, &mode)?;
    let signal = outcome.signal();

    if ctx.json {
        print_json(signal, &outcome)?;
    } else if !ctx.quiet {
        print_outcome(&outcome);
    }
    Ok(signal)
}

/// Parse `branch=spec` pairs.
fn parse_assignments(assign: &[String]) -> Result<BTreeMap<BranchName, SpecId>, EngineError> {
    let mut assignments = BTreeMap::new();
    for raw in assign {
        let (branch, spec) = raw.rsplit_once('=').ok_or_else(|| {
            EngineError::Rejected(format!("invalid --assign '{}': expected BRANCH=SPEC_ID", raw))
        })?;
        assignments.insert(BranchName::new(branch)?, SpecId::new(spec)?);
    }
    Ok(assignments)
}

fn print_outcome(outcome: &ImportOutcome) {
    match outcome {
        ImportOutcome::NothingToImport => println!("No untracked branches to import."),
        ImportOutcome::Imported { entries } => {
            for entry in entries {
                println!(
                    "Imported '{}' on '{}' (spec {})",
                    entry.name, entry.base_branch, entry.spec_id
                );
            }
        }
        ImportOutcome::NeedsDisambiguation {
            candidates,
            known_specs,
        } => {
            println!("Untracked branches (nothing imported):");
            for c in candidates {
                let spec = c
                    .suggested_spec
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!("  {}  base: {}  spec: {}", c.name, c.inferred_base, spec);
            }
            if !known_specs.is_empty() {
                let known: Vec<&str> = known_specs.iter().map(|s| s.as_str()).collect();
                println!("Known specs: {}", known.join(", "));
            }
            println!();
            println!(
                "Re-run with --batch, adding --assign <branch>=<spec> or --default-spec <spec> \
                 for branches marked '?'."
            );
        }
    }
}
