//! ## telesim-cli
//! **Operator entrypoint for the sensor telemetry simulator**
//!
//! - `telesim run` simulates the configured fleet until Ctrl-C or a deadline
//! - `telesim check` validates a configuration without starting anything

use clap::Parser;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(run_args) => commands::run(run_args).await,
        Commands::Check(check_args) => commands::check(check_args),
    }
}
