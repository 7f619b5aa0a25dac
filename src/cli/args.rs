//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::metadata::BranchStatus;

/// specstack - Branch dependencies and PR suggestions for spec-driven work
#[derive(Parser, Debug)]
#[command(name = "specstack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if specstack was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a branch stacked on a base and track it under a spec
    #[command(
        long_about = "Create a branch stacked on a base and track it under a spec.\n\n\
            The base defaults to the trunk and must exist in this repository. \
            When the base is a tracked branch that has unsubmitted commits, a PR \
            suggestion for that branch is printed: it targets the branch's own base.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Start a stack for a spec
    specstack create feature/db --spec 001-user-auth

    # Stack on top of it (prints a PR suggestion for feature/db)
    specstack create feature/api --spec 001-user-auth --base feature/db

    # Inside a workspace child, link to the root's spec
    specstack create feature/db --spec 004-api-auth --parent-spec 001-user-auth

EXIT CODES:
    0   created
    10  created, PR suggestion available
    11  created, with a warning (e.g. no remote)
    2   rejected (invalid base, duplicate, bad input)
    1   failure"
    )]
    Create {
        /// Name of the branch to create
        name: String,

        /// Spec id this branch implements (NNN-kebab-name)
        #[arg(long = "spec", value_name = "SPEC_ID")]
        spec: String,

        /// Branch to stack on (default: trunk)
        #[arg(long)]
        base: Option<String>,

        /// Spec id in the workspace root (child repositories only)
        #[arg(long = "parent-spec", value_name = "SPEC_ID")]
        parent_spec: Option<String>,

        /// Check out the branch after creating it
        #[arg(long)]
        checkout: bool,
    },

    /// Track existing local branches
    #[command(
        long_about = "Track existing local branches.\n\n\
            Bases are inferred from commit ancestry. Without --batch, the \
            candidates are listed and nothing is changed (exit code 12) so \
            specs can be chosen.",
        after_help = "\
WORKFLOW EXAMPLES:
    # See what would be imported
    specstack import

    # Import everything, naming specs explicitly where needed
    specstack import --batch --default-spec 009-misc --assign feature/api=001-user-auth"
    )]
    Import {
        /// Apply the import instead of listing candidates
        #[arg(long)]
        batch: bool,

        /// Spec for candidates without an assigned or name-derived spec
        #[arg(long = "default-spec", value_name = "SPEC_ID", requires = "batch")]
        default_spec: Option<String>,

        /// Assign a spec to a branch
        #[arg(long = "assign", value_name = "BRANCH=SPEC_ID", requires = "batch")]
        assign: Vec<String>,
    },

    /// Show the dependency tree
    Status {
        /// Include every child repository (workspace root only)
        #[arg(long)]
        workspace: bool,
    },

    /// Record a status or PR number for a tracked branch
    Mark {
        /// Tracked branch to update
        name: String,

        /// New status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Pull request number
        #[arg(long)]
        pr: Option<u64>,
    },

    /// Generate shell completion scripts
    #[command(after_help = "\
INSTALLATION:
    # Bash
    specstack completion bash > ~/.local/share/bash-completion/completions/specstack

    # Zsh
    specstack completion zsh > ~/.zfunc/_specstack

    # Fish
    specstack completion fish > ~/.config/fish/completions/specstack.fish

    # PowerShell
    specstack completion powershell >> $PROFILE")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Branch status accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Active,
    Submitted,
    Merged,
    Abandoned,
}

impl From<StatusArg> for BranchStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => BranchStatus::Active,
            StatusArg::Submitted => BranchStatus::Submitted,
            StatusArg::Merged => BranchStatus::Merged,
            StatusArg::Abandoned => BranchStatus::Abandoned,
        }
    }
}

/// Supported shells for completion.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
