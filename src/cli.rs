//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::sanitize::BenignNoise;

/// Top-level CLI entry point for the provisioning tool.
#[derive(Parser, Debug)]
#[command(
    name = "provision",
    about = "Fail-fast machine provisioning for apt-based Linux",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Log commands instead of running them
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override provisioning root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file (default: <root>/conf/provision.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision this machine, stopping at the first failed step
    Install(InstallOpts),
    /// List the steps an install would run
    List(InstallOpts),
    /// Run one shell command with a timeout and report its outcome
    Exec(ExecOpts),
    /// Print version information
    Version,
}

/// Options for the `install` and `list` subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct InstallOpts {
    /// Skip steps whose name contains any of these
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only steps whose name contains any of these
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}

/// Options for the `exec` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ExecOpts {
    /// Kill the command after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Benign diagnostics to strip from error output
    #[arg(long, value_delimiter = ',', value_parser = parse_noise)]
    pub noise: Vec<BenignNoise>,

    /// Shell command line, or a program and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

fn parse_noise(s: &str) -> Result<BenignNoise, String> {
    s.parse()
}
