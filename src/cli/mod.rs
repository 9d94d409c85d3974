//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{GenerateCiCommand, ListCommand, PlanCommand, RunCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Declarative build orchestrator
#[derive(Debug, Parser, Clone)]
#[command(name = "buildgraph")]
#[command(version)]
#[command(about = "Runs build targets in dependency order", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to build configuration file (default: build.yaml in the root)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Build root directory
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run targets and their dependencies
    Run(RunCommand),

    /// Show the resolved execution order
    Plan(PlanCommand),

    /// List registered targets
    List(ListCommand),

    /// Generate CI workflow files
    GenerateCi(GenerateCiCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
