//! CLI Adapter
//!
//! Command-line interface for the Maxwell trading bot.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{BacktestCmd, CliApp, Command, FetchCmd, RunCmd};

use anyhow::Result;

use crate::config::Config;

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

/// Execute the CLI command
pub async fn execute(command: Command, config: Config) -> Result<()> {
    commands::execute(command, config).await
}
