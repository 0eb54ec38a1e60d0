//! Error types for yak-context

use thiserror::Error;

/// Result type alias using yak-context Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during context operations
#[derive(Error, Debug)]
pub enum Error {
    /// The reply-generation call to the completion provider failed
    #[error(transparent)]
    Provider(#[from] yak_ai::Error),

    /// The summarization sub-call during compaction failed
    #[error("compaction failed: {0}")]
    Compaction(#[source] yak_ai::Error),
}

impl Error {
    /// Check if the underlying provider error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Provider(e) | Error::Compaction(e) => e.is_retryable(),
        }
    }
}
