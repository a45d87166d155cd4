//! Command-line front end for courier.
//!
//! The binary is a thin wrapper over [`run`]; the modules here are public
//! so the parsing and rendering can be tested without a terminal.

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;

#[cfg(test)]
mod testing;

use cli::{Cli, Command};
use commands::App;
use config::CliConfig;
use error::CliError;
use rootcause::prelude::ResultExt;
use std::process::ExitCode;

/// Loads configuration and runs the requested subcommand.
///
/// # Errors
///
/// Returns an error if configuration or provider setup fails, or if a
/// command hits an I/O error.
pub async fn run(cli: Cli) -> courier_core::Result<ExitCode, CliError> {
    let config = CliConfig::from_env().context(CliError::Config)?;
    let app = App::from_config(config)?;

    match cli.command {
        Command::Ask(args) => app.ask(args).await,
        Command::Chat(args) => app.chat(args).await,
        Command::Providers => Ok(app.providers().await),
        Command::Fallback => Ok(app.fallback().await),
        Command::Test => Ok(app.test().await),
    }
}
