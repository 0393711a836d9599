//! Error types for the driftmail-outbox crate.

use std::io;

use thiserror::Error;

/// Top-level outbox error type.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// I/O operation failed (file read/write/rename/delete).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoding a queue record failed.
    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Decoding a queue record failed; the entry is corrupt.
    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// Specialized `Result` type for outbox operations.
pub type Result<T> = std::result::Result<T, OutboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OutboxError = io_err.into();
        assert!(matches!(err, OutboxError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
