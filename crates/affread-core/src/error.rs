//! Reader error types

use thiserror::Error;

/// The main error type for AFF reader operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error outside of a named read step (e.g. opening the file)
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A named read step failed
    #[error("{context}: {source}")]
    Read {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Signature or header layout is not an accepted AFF encoding
    #[error("{0}")]
    Format(String),

    /// Digest verification failed
    #[error("{0}")]
    Checksum(String),

    /// Structural error: truncated or oversized section, unresolved reference
    #[error("{0}")]
    Malformed(String),

    /// Resource limit exceeded
    #[error("{0}")]
    Resource(String),

    /// Node or path not found in a loaded archive
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type alias for AFF reader operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for a failed read step
    pub fn read(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Read {
            context: context.into(),
            source,
        }
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Create a checksum error
    pub fn checksum(msg: impl Into<String>) -> Self {
        Error::Checksum(msg.into())
    }

    /// Create a structural error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }

    /// Create a resource error
    pub fn resource(msg: impl Into<String>) -> Self {
        Error::Resource(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }

    /// True for digest mismatches
    pub fn is_checksum(&self) -> bool {
        matches!(self, Error::Checksum(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_display() {
        let err = Error::read(
            "Error reading stable",
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "failed to fill whole buffer"),
        );
        assert_eq!(err.to_string(), "Error reading stable: failed to fill whole buffer");
    }

    #[test]
    fn test_messages_are_verbatim() {
        assert_eq!(Error::format("Bad AFF header").to_string(), "Bad AFF header");
        assert_eq!(
            Error::checksum("Stable checksum mismatch").to_string(),
            "Stable checksum mismatch"
        );
        assert!(Error::checksum("x").is_checksum());
        assert!(!Error::malformed("x").is_checksum());
    }
}
