// src/errors.rs
use thiserror::Error;

use crate::models::FailureKind;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered, but with a non-success status.
    #[error("Remote API rejected the request with status {status}")]
    RemoteRejection {
        status: u16,
        message: Option<String>,
    },

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Invalid field '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Which user-facing failure class this error belongs to.
    ///
    /// Everything that prevented a usable response from arriving counts as a
    /// transport failure, including a 2xx body we could not decode.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            RelayError::RemoteRejection { .. } => FailureKind::RemoteRejection,
            RelayError::Validation { .. } => FailureKind::InvalidInput,
            RelayError::Transport(_)
            | RelayError::MalformedBody(_)
            | RelayError::Config(_)
            | RelayError::TomlParse(_)
            | RelayError::FileRead(_) => FailureKind::TransportFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
