//! On-disk format of an encrypted document.
//!
//! ```json
//! { "version": 1, "salt": "<b64>", "kdf": {..}, "canary": "<sealed>", "document": <encrypted> }
//! ```
//!
//! The canary is a sealed constant. Opening it first means a wrong
//! passphrase is detected even when the document itself is empty.

use serde::{Deserialize, Serialize};

use crate::cipher::StructuredCipher;
use crate::crypto::{KdfParams, KeyMaterial, Role, Salt, Sealed};
use crate::document::{Document, EncryptedDocument};
use crate::error::{Result, ShipError};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

const CANARY: &[u8] = b"ship/unlocked";

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope {
    pub version: u32,
    pub salt: Salt,
    pub kdf: KdfParams,
    pub canary: Sealed,
    pub document: EncryptedDocument,
}

impl Envelope {
    pub fn seal(key: &KeyMaterial, document: &Document) -> Result<Self> {
        Ok(Self {
            version: ENVELOPE_VERSION,
            salt: key.salt(),
            kdf: key.params(),
            canary: key.seal(Role::Canary, CANARY)?,
            document: StructuredCipher::new(key).encrypt(document)?,
        })
    }

    /// Check the canary, then decrypt the whole document.
    pub fn open(&self, key: &KeyMaterial) -> Result<Document> {
        let canary = key.open(Role::Canary, &self.canary)?;
        if canary.as_slice() != CANARY {
            return Err(ShipError::Corrupt("Envelope canary does not match".to_string()));
        }
        StructuredCipher::new(key).decrypt(&self.document)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: Self = serde_json::from_slice(bytes)
            .map_err(|e| ShipError::Corrupt(format!("Unreadable envelope: {}", e)))?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(ShipError::Corrupt(format!(
                "Unsupported envelope version {}",
                envelope.version
            )));
        }
        Ok(envelope)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
