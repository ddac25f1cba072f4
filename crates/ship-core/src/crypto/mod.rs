//! Cryptographic operations for Ship.
//!
//! - **Argon2id** stretches the passphrase and per-store salt into a seed
//! - The seed becomes a static **X25519** key pair ([`KeyMaterial`])
//! - Every name and value is sealed on its own: a fresh ephemeral X25519 key,
//!   HKDF-SHA256, then **XChaCha20-Poly1305** with a random nonce
//!
//! ## Security Model
//!
//! - Nothing secret is written to disk; the salt and KDF parameters are
//!   stored next to the ciphertext
//! - There is no password hash: failing to open a sealed value is the
//!   passphrase check
//! - Secret key bytes are zeroized on drop
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the encrypted store files
//! - Offline brute-force attacks on the passphrase
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to the plaintext cache while a session is active

pub mod key;
pub mod passphrase;
pub mod sealed;

pub use key::{KdfParams, KeyMaterial, Salt, SALT_LENGTH};
pub use passphrase::validate_passphrase;
pub use sealed::{Role, Sealed};
