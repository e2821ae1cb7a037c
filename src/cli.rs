//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// `planweave` - validate and execute declarative tool-invocation plans.
#[derive(Parser, Debug)]
#[command(name = "planweave")]
#[command(version)]
#[command(about = "Validate and execute declarative tool-invocation plans.", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (built-in defaults when absent)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a plan file and print its execution order
    Validate {
        /// Path to the plan JSON file
        plan_file: PathBuf,
    },

    /// Execute a plan file against the dry-run gateway
    Run {
        /// Path to the plan JSON file
        plan_file: PathBuf,
    },
}
