//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::num::NonZeroU32;

/// Ask text-generation providers, falling back when one fails.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one prompt and print the answer.
    Ask(AskArgs),
    /// Interactive conversation on stdin.
    Chat(ChatArgs),
    /// List providers and their availability.
    Providers,
    /// Show the fallback configuration.
    Fallback,
    /// Send sample questions to every available provider.
    Test,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Prompt text.
    pub prompt: String,

    /// Preferred provider (chatgpt, gemini, ollama).
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Model override for the preferred provider.
    #[arg(long, short)]
    pub model: Option<String>,

    /// Completion token ceiling.
    #[arg(long)]
    pub max_tokens: Option<NonZeroU32>,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Only try the preferred provider.
    #[arg(long)]
    pub no_fallback: bool,

    /// Print the full outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Preferred provider (chatgpt, gemini, ollama).
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Model override for the preferred provider.
    #[arg(long, short)]
    pub model: Option<String>,
}
