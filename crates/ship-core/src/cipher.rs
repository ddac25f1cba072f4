//! Shape-preserving document encryption.
//!
//! Every mapping name and every scalar is sealed independently; sequences
//! and mappings are rebuilt around the sealed leaves, so the encrypted tree
//! has exactly the shape of the plaintext one.
//!
//! A scalar's kind travels inside its ciphertext as a one-byte tag ahead of
//! the canonical text, keeping integers and floats distinct after a round trip
//! without exposing the kind on disk.

use zeroize::Zeroizing;

use crate::crypto::{KeyMaterial, Role, Sealed};
use crate::document::{Document, EncryptedDocument, Scalar};
use crate::error::{Result, ShipError};

const TAG_TEXT: u8 = b's';
const TAG_INTEGER: u8 = b'i';
const TAG_FLOAT: u8 = b'f';

/// Encrypts and decrypts whole documents with one store key.
#[derive(Debug, Clone, Copy)]
pub struct StructuredCipher<'k> {
    key: &'k KeyMaterial,
}

impl<'k> StructuredCipher<'k> {
    pub fn new(key: &'k KeyMaterial) -> Self {
        Self { key }
    }

    pub fn encrypt(&self, document: &Document) -> Result<EncryptedDocument> {
        document.try_map(
            |name| self.key.seal(Role::Name, name.as_bytes()),
            |value| self.key.seal(Role::Value, &encode_scalar(value)),
        )
    }

    /// Inverse of [`StructuredCipher::encrypt`].
    ///
    /// Fails with `WrongPassphrase` as soon as any single name or value does
    /// not authenticate; no partial document is returned.
    pub fn decrypt(&self, encrypted: &EncryptedDocument) -> Result<Document> {
        encrypted.try_map(
            |name| self.open_name(name),
            |value| decode_scalar(&self.key.open(Role::Value, value)?),
        )
    }

    fn open_name(&self, sealed: &Sealed) -> Result<String> {
        let raw = self.key.open(Role::Name, sealed)?;
        std::str::from_utf8(&raw)
            .map(str::to_string)
            .map_err(|_| ShipError::Corrupt("Mapping name is not UTF-8".to_string()))
    }
}

fn encode_scalar(value: &Scalar) -> Zeroizing<Vec<u8>> {
    let tag = match value {
        Scalar::Text(_) => TAG_TEXT,
        Scalar::Integer(_) => TAG_INTEGER,
        Scalar::Float(_) => TAG_FLOAT,
    };
    let text = Zeroizing::new(value.canonical());
    let mut encoded = Zeroizing::new(Vec::with_capacity(text.len() + 1));
    encoded.push(tag);
    encoded.extend_from_slice(text.as_bytes());
    encoded
}

fn decode_scalar(raw: &[u8]) -> Result<Scalar> {
    let (tag, body) = raw
        .split_first()
        .ok_or_else(|| ShipError::Corrupt("Empty scalar payload".to_string()))?;
    let text = std::str::from_utf8(body)
        .map_err(|_| ShipError::Corrupt("Scalar payload is not UTF-8".to_string()))?;

    match *tag {
        TAG_TEXT => Ok(Scalar::Text(text.to_string())),
        TAG_INTEGER => text
            .parse()
            .map(Scalar::Integer)
            .map_err(|e| ShipError::Corrupt(format!("Invalid integer scalar: {}", e))),
        TAG_FLOAT => text
            .parse()
            .map(Scalar::Float)
            .map_err(|e| ShipError::Corrupt(format!("Invalid float scalar: {}", e))),
        other => Err(ShipError::Corrupt(format!(
            "Unknown scalar tag 0x{:02x}",
            other
        ))),
    }
}
