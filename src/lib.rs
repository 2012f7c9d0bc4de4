//! clipcoach - A terminal client for gameplay clip feedback
//!
//! Upload a clip, read the analysis, browse the gallery and ask follow-up
//! questions about your plays.

pub mod api;
pub mod cli;
pub mod config;
pub mod flows;
pub mod tui;

use thiserror::Error;

/// Main error type for clipcoach
#[derive(Error, Debug)]
pub enum ClipcoachError {
    /// Required user input is missing; never reaches the network.
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode server response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ClipcoachError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ClipcoachError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "clipcoach";
