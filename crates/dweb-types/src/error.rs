//! Error types for dweb-nav.

use std::io;

/// Errors produced by the dweb-nav crates.
#[derive(Debug, thiserror::Error)]
pub enum DwebError {
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("resolution failed: {0}")]
    Resolution(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("bootstrap peer {peer} failed: {reason}")]
    BootstrapPeer { peer: String, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`DwebError`], used to pick how a failure
/// is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidReference,
    ResolutionFailure,
    DecodeFailure,
    BootstrapPeerFailure,
    Config,
    Io,
}

impl DwebError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DwebError::InvalidReference(_) => ErrorKind::InvalidReference,
            DwebError::Resolution(_) => ErrorKind::ResolutionFailure,
            DwebError::Decode(_) | DwebError::Json(_) => ErrorKind::DecodeFailure,
            DwebError::BootstrapPeer { .. } => ErrorKind::BootstrapPeerFailure,
            DwebError::Config(_) | DwebError::TomlParse(_) => ErrorKind::Config,
            DwebError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DwebError>;
