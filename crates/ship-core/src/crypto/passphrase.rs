//! Passphrase validation.
//!
//! Enforces minimum security requirements for new passphrases.

use crate::error::{Result, ShipError};

/// Minimum passphrase length in characters.
pub const MIN_PASSPHRASE_LENGTH: usize = 8;

/// Validate a new passphrase meets minimum security requirements.
///
/// Only applied when a passphrase is chosen; unlocking an existing store
/// accepts whatever passphrase it was created with.
///
/// # Requirements
///
/// - At least 8 characters long
/// - Not empty or only whitespace
///
/// # Examples
///
/// ```
/// use ship_core::crypto::validate_passphrase;
///
/// assert!(validate_passphrase("my-secure-passphrase-123").is_ok());
/// assert!(validate_passphrase("short").is_err());
/// ```
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.trim().is_empty() {
        return Err(ShipError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }

    let length = passphrase.chars().count();
    if length < MIN_PASSPHRASE_LENGTH {
        return Err(ShipError::InvalidInput(format!(
            "Passphrase must be at least {} characters (got {})",
            MIN_PASSPHRASE_LENGTH, length
        )));
    }

    Ok(())
}
