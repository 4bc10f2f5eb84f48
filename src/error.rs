use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by all siphon stages
#[derive(Debug, Error)]
pub enum SiphonError {
    /// Malformed JSON encountered by the streaming walker
    #[error("JSON parse error at byte {offset}: {reason}")]
    Parse { offset: usize, reason: String },

    /// The builder was driven with an unbalanced or misplaced operation
    #[error("JSON build error: {0}")]
    Build(String),

    /// A record is missing the integer `id` field the key scheme depends on
    #[error("record in table '{table}' has no integer 'id' field")]
    MissingRecordId { table: String },

    /// HTTP request could not be sent or came back with a failure status
    #[error("{context}: transport error: {reason}")]
    Transport { context: String, reason: String },

    /// A response body did not have the expected shape
    #[error("{context}: unexpected response body: {reason}")]
    BadResponse { context: String, reason: String },

    /// Ledger or keyset file could not be read or written
    #[error("file error for {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error without a more specific location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization through serde failed
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl SiphonError {
    pub fn transport(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn bad_response(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::BadResponse {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, SiphonError>;
