//! Error types for the VP9 decode core

use thiserror::Error;

/// Result type alias for decode operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the decode core
#[derive(Error, Debug)]
pub enum Error {
    /// Bitstream data is truncated or inconsistent; the frame must be dropped
    #[error("Corrupt frame: {0}")]
    CorruptFrame(String),

    /// Bitstream uses a construct this decoder refuses to handle
    #[error("Unsupported bitstream: {0}")]
    UnsupportedBitstream(String),

    /// A decoder resource could not be bound to its backing storage
    #[error("Memory error: {0}")]
    MemoryError(String),

    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a corrupt frame error
    pub fn corrupt_frame<S: Into<String>>(msg: S) -> Self {
        Error::CorruptFrame(msg.into())
    }

    /// Create an unsupported bitstream error
    pub fn unsupported_bitstream<S: Into<String>>(msg: S) -> Self {
        Error::UnsupportedBitstream(msg.into())
    }

    /// Create a memory error
    pub fn memory<S: Into<String>>(msg: S) -> Self {
        Error::MemoryError(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Whether this error aborts the frame because of bad bitstream data
    pub fn is_bitstream_error(&self) -> bool {
        matches!(
            self,
            Error::CorruptFrame(_) | Error::UnsupportedBitstream(_) | Error::MemoryError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::corrupt_frame("Failed to decode tile data");
        assert_eq!(err.to_string(), "Corrupt frame: Failed to decode tile data");

        let err = Error::unsupported_bitstream("Reference frame has invalid dimensions");
        assert!(err.to_string().starts_with("Unsupported bitstream"));
    }

    #[test]
    fn test_bitstream_error_kinds() {
        assert!(Error::memory("Failed to allocate bool decoder").is_bitstream_error());
        assert!(!Error::invalid_input("bad plane").is_bitstream_error());
    }
}
