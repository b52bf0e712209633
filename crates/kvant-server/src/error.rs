//! Error types for the server crate.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Errors raised on the connection path.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Peer closed the stream before a full frame arrived.
    #[error("connection closed by peer")]
    TransportClosed,

    /// Declared frame length above the configured cap.
    #[error("frame of {len} bytes exceeds the {limit} byte limit")]
    FrameTooLarge {
        /// Declared payload length.
        len: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Request payload was not the expected JSON.
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally valid JSON carrying an unusable request.
    #[error("invalid request: {0}")]
    BadRequest(&'static str),

    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected configuration.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Registry or kernel failure while executing a request.
    #[error(transparent)]
    Kernel(#[from] kvant_kernel::KernelError),
}

impl ServerError {
    /// Whether the connection should be torn down rather than continuing
    /// with the next request in the batch.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ServerError::Kernel(_) | ServerError::BadRequest(_))
    }
}
