mod cli;
mod config;
mod exec;
mod logging;
mod workflow;

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    cli.run().await
}
