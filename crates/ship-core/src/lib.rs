//! # Ship Core
//!
//! Core library for Ship - a local, passphrase-protected secret store.
//!
//! This crate holds every rule about how secrets are encrypted, persisted and
//! looked up, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **document**: the recursive Document tree and its iterative walk
//! - **crypto**: Argon2id key derivation and per-value sealing
//! - **cipher**: shape-preserving encryption of whole documents
//! - **store**: envelopes, plaintext caches and atomic persistence
//! - **resolver**: approximate matching of typed ids
//! - **session**: prompt-once ownership of unlocked key material
//! - **prompt** / **vcs**: collaborators supplied by the caller

pub mod cipher;
pub mod crypto;
pub mod document;
pub mod error;
pub mod fs;
pub mod prompt;
pub mod resolver;
pub mod session;
pub mod store;
pub mod vcs;

pub use cipher::StructuredCipher;
pub use crypto::{KdfParams, KeyMaterial, Salt};
pub use document::{Document, EncryptedDocument, Node, Scalar};
pub use error::{Result, ShipError};
pub use prompt::{PassphrasePurpose, Prompter};
pub use resolver::{IdResolver, Match, DEFAULT_MATCH_THRESHOLD};
pub use session::Session;
pub use store::{InitReport, SecretStore, Slot, StoreSettings, VcsOutcome};
pub use vcs::{NoVcs, Vcs};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
