//! Error types for Ship core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

/// Result type alias for Ship operations.
pub type Result<T> = std::result::Result<T, ShipError>;

/// Core error type for Ship operations.
#[derive(Debug, Error)]
pub enum ShipError {
    /// The store directory or one of its envelopes is missing
    #[error("Store is not initialized")]
    NotInitialized,

    /// `init` was run against a complete store
    #[error("Store is already initialized")]
    AlreadyInitialized,

    /// A ciphertext could not be opened with the supplied key material
    #[error("Incorrect passphrase")]
    WrongPassphrase,

    /// No id in the Ship is similar enough to the query
    #[error("No secret matches '{0}'")]
    IdNotFound(String),

    /// Reading or writing store files failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// An optional feature (such as VCS) failed; never fatal on its own
    #[error("Optional feature failed: {0}")]
    OptionalFeature(String),

    /// Key derivation or encryption failed for a reason other than a wrong passphrase
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A store file exists but cannot be parsed
    #[error("Corrupt store file: {0}")]
    Corrupt(String),

    /// The prompting collaborator failed or was cancelled
    #[error("Prompt failed: {0}")]
    PromptFailed(String),
}

impl ShipError {
    /// True for outcomes a user is expected to hit (typos, wrong passphrase).
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ShipError::WrongPassphrase
                | ShipError::IdNotFound(_)
                | ShipError::NotInitialized
                | ShipError::AlreadyInitialized
        )
    }
}

impl From<std::io::Error> for ShipError {
    fn from(err: std::io::Error) -> Self {
        ShipError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for ShipError {
    fn from(err: serde_json::Error) -> Self {
        ShipError::Corrupt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_persistence() {
        let err: ShipError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ShipError::Persistence(ref msg) if msg.contains("gone")));
    }

    #[test]
    fn test_json_error_maps_to_corrupt() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: ShipError = parse.unwrap_err().into();
        assert!(matches!(err, ShipError::Corrupt(_)));
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(ShipError::WrongPassphrase.is_user_facing());
        assert!(ShipError::IdNotFound("x".to_string()).is_user_facing());
        assert!(!ShipError::Persistence("disk".to_string()).is_user_facing());
        assert!(!ShipError::OptionalFeature("git".to_string()).is_user_facing());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(ShipError::WrongPassphrase.to_string(), "Incorrect passphrase");
        assert_eq!(
            ShipError::IdNotFound("emial".to_string()).to_string(),
            "No secret matches 'emial'"
        );
    }
}
