//! Error types for token issuance and verification

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required issuance parameter is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The signature could not be computed, usually because of corrupt key material.
    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Grant mismatch: expected application {expected}, found {found}")]
    GrantMismatch { expected: String, found: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable name used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration_error",
            Error::Signing(_) => "signing_error",
            Error::InvalidToken(_) => "invalid_token",
            Error::TokenExpired => "token_expired",
            Error::GrantMismatch { .. } => "grant_mismatch",
            Error::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
