//! Error types for playlist editing operations.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the user as a transient notification.
///
/// Every variant is terminal for the operation that produced it; none of them
/// leave the collection partially mutated.
#[derive(Debug, Error)]
pub enum Error {
    /// Input is not an M3U playlist (missing `#EXTM3U` header).
    #[error("Invalid M3U playlist format: {0}")]
    Format(String),

    /// Playlist fetch or AI request failed.
    #[error("Network error: {0}")]
    Network(String),

    /// A group with this name already exists.
    #[error("Group already exists: {0}")]
    DuplicateGroup(String),

    /// Missing or malformed user input, detected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The AI service answered but produced nothing we could apply.
    #[error("AI returned no results")]
    NoSuggestions,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateGroup("Sports".to_string());
        assert_eq!(err.to_string(), "Group already exists: Sports");
    }

    #[test]
    fn test_validation_display_is_bare_message() {
        let err = Error::Validation("Please fill all Xtream fields.".to_string());
        assert_eq!(err.to_string(), "Please fill all Xtream fields.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
