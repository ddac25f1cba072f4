//! Interactive input the core depends on.
//!
//! The core never talks to a terminal. Anything that needs a human answer
//! goes through a [`Prompter`] supplied by the caller.

use secrecy::SecretString;

use crate::error::Result;

/// Why a passphrase is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphrasePurpose {
    /// Unlock an existing store
    Unlock,
    /// Choose the passphrase for a new store (implementations should confirm it)
    Create,
}

/// Source of passphrases and yes/no decisions.
///
/// Implementations return `ShipError::PromptFailed` when input is cancelled or
/// unavailable. The core only calls a prompter before it writes anything, so a
/// cancelled prompt leaves the store untouched.
pub trait Prompter {
    fn ask_passphrase(&self, purpose: PassphrasePurpose) -> Result<SecretString>;

    fn ask_yes_no(&self, prompt: &str) -> Result<bool>;
}
