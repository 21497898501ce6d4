//! Command line entry point

mod args;
mod commands;

use std::process::ExitCode;

use clap::Parser;

use crate::args::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(run_args) => commands::run(run_args, cli.config).await,
        Commands::List { folder } => {
            commands::list(folder, cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Test(connection) => commands::test(connection, cli.config).await,
        Commands::SaveConfig(save_args) => {
            commands::save_config(save_args, cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Route logs to stderr so script progress on stdout stays clean.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default_filter = if verbose {
        "warn,sqlrun_cli=debug,sqlrun_core=debug,sqlrun_exec=debug,sqlrun_config=debug,sqlrun_driver_sqlite=debug"
    } else {
        "warn"
    };
    // RUST_LOG takes precedence over the default filter.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
