//! Per-value sealing (ECIES over X25519).
//!
//! Format of a sealed value before base64:
//! `[version (1)][ephemeral public key (32)][nonce (24)][ciphertext + tag]`
//!
//! Each seal uses a fresh ephemeral key and nonce, so sealing the same bytes
//! twice yields unrelated ciphertexts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret};
use zeroize::Zeroizing;

use super::key::KeyMaterial;
use crate::error::{Result, ShipError};

const SEALED_VERSION: u8 = 0x01;
const PUBLIC_KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 24;
const TAG_SIZE: usize = 16;
const HEADER_SIZE: usize = 1 + PUBLIC_KEY_SIZE + NONCE_SIZE;

/// HKDF info string used to domain-separate field keys.
const HKDF_INFO: &[u8] = b"ship/field/v1";

/// What a sealed value stands for; bound into the ciphertext as associated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A mapping key
    Name,
    /// A scalar value
    Value,
    /// The envelope's verification constant
    Canary,
}

impl Role {
    fn associated_data(self) -> &'static [u8] {
        match self {
            Role::Name => b"ship/name",
            Role::Value => b"ship/value",
            Role::Canary => b"ship/canary",
        }
    }
}

/// A base64 sealed value as it appears in an envelope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sealed(String);

impl Sealed {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Sealed {
    fn from(encoded: String) -> Self {
        Sealed(encoded)
    }
}

fn field_cipher(
    shared: &SharedSecret,
    ephemeral: &PublicKey,
    recipient: &PublicKey,
) -> Result<XChaCha20Poly1305> {
    let mut salt = [0u8; PUBLIC_KEY_SIZE * 2];
    salt[..PUBLIC_KEY_SIZE].copy_from_slice(ephemeral.as_bytes());
    salt[PUBLIC_KEY_SIZE..].copy_from_slice(recipient.as_bytes());

    let hk = Hkdf::<Sha256>::new(Some(&salt), shared.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(HKDF_INFO, &mut okm[..])
        .map_err(|e| ShipError::Crypto(format!("HKDF expand failed: {}", e)))?;
    Ok(XChaCha20Poly1305::new(Key::from_slice(&okm[..])))
}

impl KeyMaterial {
    /// Seal `plaintext` to this key pair's public half.
    pub fn seal(&self, role: Role, plaintext: &[u8]) -> Result<Sealed> {
        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(self.public_key());
        if !shared.was_contributory() {
            return Err(ShipError::Crypto(
                "Key exchange produced a non-contributory secret".to_string(),
            ));
        }
        let cipher = field_cipher(&shared, &ephemeral_public, self.public_key())?;

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: role.associated_data(),
                },
            )
            .map_err(|e| ShipError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut raw = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        raw.push(SEALED_VERSION);
        raw.extend_from_slice(ephemeral_public.as_bytes());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(Sealed(STANDARD.encode(raw)))
    }

    /// Open a sealed value.
    ///
    /// # Errors
    ///
    /// - `ShipError::WrongPassphrase` if authentication fails (wrong key, wrong
    ///   role, or tampered bytes)
    /// - `ShipError::Corrupt` if the value is not a well-formed sealed value
    pub fn open(&self, role: Role, sealed: &Sealed) -> Result<Zeroizing<Vec<u8>>> {
        let raw = STANDARD
            .decode(sealed.as_str())
            .map_err(|e| ShipError::Corrupt(format!("Sealed value is not valid base64: {}", e)))?;
        if raw.len() < HEADER_SIZE + TAG_SIZE {
            return Err(ShipError::Corrupt(format!(
                "Sealed value too short ({} bytes)",
                raw.len()
            )));
        }
        if raw[0] != SEALED_VERSION {
            return Err(ShipError::Corrupt(format!(
                "Unsupported sealed value version {}",
                raw[0]
            )));
        }

        let mut ephemeral_bytes = [0u8; PUBLIC_KEY_SIZE];
        ephemeral_bytes.copy_from_slice(&raw[1..1 + PUBLIC_KEY_SIZE]);
        let ephemeral_public = PublicKey::from(ephemeral_bytes);
        let nonce = XNonce::from_slice(&raw[1 + PUBLIC_KEY_SIZE..HEADER_SIZE]);

        let shared = self.secret().diffie_hellman(&ephemeral_public);
        if !shared.was_contributory() {
            return Err(ShipError::Corrupt(
                "Sealed value carries a low-order public key".to_string(),
            ));
        }
        let cipher = field_cipher(&shared, &ephemeral_public, self.public_key())?;

        let plaintext = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &raw[HEADER_SIZE..],
                    aad: role.associated_data(),
                },
            )
            .map_err(|_| ShipError::WrongPassphrase)?;
        Ok(Zeroizing::new(plaintext))
    }
}
