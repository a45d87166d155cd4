//! Error types for the command-line front end.
//!
//! Lower layers report their own errors; the CLI wraps them with one of
//! these contexts via `.context()` before printing the report.

use std::fmt;

/// Errors surfaced by `courier` commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Environment configuration could not be loaded.
    Config,
    /// The provider registry could not be built.
    Registry,
    /// Reading stdin or writing stdout failed.
    Io,
    /// A command-line argument was rejected.
    InvalidArgument { details: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "failed to load configuration"),
            Self::Registry => write!(f, "failed to set up providers"),
            Self::Io => write!(f, "terminal I/O failed"),
            Self::InvalidArgument { details } => write!(f, "invalid argument: {}", details),
        }
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_stage() {
        assert_eq!(CliError::Config.to_string(), "failed to load configuration");
        assert_eq!(
            CliError::InvalidArgument {
                details: "prompt is empty".to_string()
            }
            .to_string(),
            "invalid argument: prompt is empty"
        );
    }
}
