//! Error types for the audit pipeline.
//!
//! Discovery-source failures are non-fatal and never surface here; they
//! degrade the source to "no contribution". Per-page fetch failures are data
//! (`FetchErrorKind`), not errors. The only fatal runtime condition is
//! `NoPagesAnalyzable`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// Invalid or malformed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-level failure outside the per-page tolerance (e.g. the HTTP
    /// client could not be constructed)
    #[error("Network error: {0}")]
    Network(String),

    /// Failed to interpret fetched content
    #[error("Parse error: {0}")]
    Parse(String),

    /// Every discovered page failed to fetch or parse
    #[error("No pages analyzable: all {discovered} discovered pages failed")]
    NoPagesAnalyzable { discovered: usize },

    /// History store read/write failed
    #[error("History error: {0}")]
    History(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AuditError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }
}

/// Result type alias using AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;
