//! CLI error types.

use std::fmt;

use error_stack::Report;
use litepub_common::error::LitePubError;

#[derive(Debug)]
pub enum CliError {
    /// Configuration file error
    Config(String),
    /// IO error
    Io(std::io::Error),
    /// Invalid command-line input
    Usage(String),
    /// Resolution, fetch, signing or delivery failure
    Federation(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Usage(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Federation(msg) => write!(f, "Federation error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Usage(format!("invalid JSON: {}", err))
    }
}

impl From<Report<LitePubError>> for CliError {
    fn from(report: Report<LitePubError>) -> Self {
        match report.current_context() {
            LitePubError::Configuration { .. } => CliError::Config(format!("{:?}", report)),
            _ => CliError::Federation(format!("{:?}", report)),
        }
    }
}
