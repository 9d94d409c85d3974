//! CLI command definitions

use crate::core::Configuration;
use clap::Args;
use std::path::PathBuf;

/// Run targets
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Targets to run (default target when empty)
    pub targets: Vec<String>,

    /// Configuration to build (Debug locally, Release on a server by default)
    #[arg(long, value_enum)]
    pub configuration: Option<ConfigurationArg>,

    /// NuGet API key used by Push (falls back to NUGET_API_KEY)
    #[arg(long, env = "NUGET_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the run result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Show the execution order without running anything
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Targets to plan (default target when empty)
    pub targets: Vec<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List registered targets
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Write CI workflow files
#[derive(Debug, Args, Clone)]
pub struct GenerateCiCommand {
    /// Output directory (default: .github/workflows under the root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Configuration argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigurationArg {
    Debug,
    Release,
}

impl From<ConfigurationArg> for Configuration {
    fn from(arg: ConfigurationArg) -> Self {
        match arg {
            ConfigurationArg::Debug => Configuration::Debug,
            ConfigurationArg::Release => Configuration::Release,
        }
    }
}
