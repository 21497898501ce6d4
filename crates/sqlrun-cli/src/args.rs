//! Command line argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Batch-execute SQL scripts against a database
#[derive(Parser, Debug)]
#[command(name = "sqlrun")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file path (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute scripts, stopping to ask on failures
    Run(RunArgs),

    /// List the scripts a folder would run, in order
    List {
        /// Folder holding .sql scripts (defaults to the saved setting)
        #[arg(value_name = "FOLDER")]
        folder: Option<PathBuf>,
    },

    /// Open a connection, probe it, and close it again
    Test(ConnectionArgs),

    /// Persist folder and connection settings for later runs
    SaveConfig(SaveConfigArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Folder whose .sql scripts run in name order
    #[arg(long, value_name = "FOLDER", conflicts_with = "scripts")]
    pub folder: Option<PathBuf>,

    /// Individual script files to run, in the given order
    #[arg(value_name = "SCRIPT")]
    pub scripts: Vec<PathBuf>,

    /// What to do when a unit fails
    #[arg(long, value_enum, default_value_t = OnError::Ask)]
    pub on_error: OnError,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(clap::Args, Debug)]
pub struct SaveConfigArgs {
    /// Folder holding .sql scripts
    #[arg(long, value_name = "FOLDER")]
    pub folder: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Connection overrides layered over the saved settings.
#[derive(clap::Args, Debug)]
pub struct ConnectionArgs {
    /// Database user
    #[arg(long)]
    pub user: Option<String>,

    /// Database password
    #[arg(long, env = "SQLRUN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database host
    #[arg(long)]
    pub host: Option<String>,

    /// Database port
    #[arg(long)]
    pub port: Option<String>,

    /// Service name, or database path for the sqlite driver
    #[arg(long)]
    pub service: Option<String>,
}

/// Failure handling for non-interactive runs.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnError {
    /// Prompt for a decision on each failure
    Ask,
    /// Skip the failed unit and continue
    Ignore,
    /// Skip this and every later failure
    IgnoreAll,
    /// Stop the run at the first failure
    Stop,
}
