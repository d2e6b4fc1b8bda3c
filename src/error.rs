//! Error types for simtrace

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimtraceError>;

#[derive(Debug, Error)]
pub enum SimtraceError {
    /// The storage reader had nothing at this logical path
    #[error("document not found: {path}")]
    NotFound { path: String },

    #[error("failed to decode '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{path}' has format version {found}, only {supported} is supported")]
    UnsupportedFormatVersion {
        path: String,
        found: u32,
        supported: u32,
    },

    /// A cached document exists at this path but holds a different type
    #[error("cached document at '{path}' is not a {expected}")]
    DocumentKind { path: String, expected: &'static str },

    #[error("replication {0} is not in the catalog")]
    ReplicationNotFound(u32),

    #[error("no replication is active")]
    NoActiveReplication,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A config document that is not valid JSON for [`Config`](crate::Config)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimtraceError {
    /// Whether the failure came from the document content rather than storage.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            SimtraceError::Decode { .. } | SimtraceError::UnsupportedFormatVersion { .. }
        )
    }
}
