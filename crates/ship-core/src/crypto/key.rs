//! Key derivation using Argon2id.
//!
//! The passphrase and the store's salt are stretched into a 32-byte seed,
//! which becomes the secret half of the store's X25519 key pair.

use argon2::Argon2;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{Result, ShipError};

/// Length of the per-store salt in bytes.
pub const SALT_LENGTH: usize = 16;

/// Length of the Argon2 output (the X25519 seed).
const SEED_LENGTH: usize = 32;

/// Argon2id cost parameters.
///
/// Chosen once at `init` and written into every envelope so a store keeps
/// opening with the parameters it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = argon2::Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(SEED_LENGTH),
        )
        .map_err(|e| ShipError::Crypto(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

/// Random per-store salt. Not secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LENGTH]);

impl Salt {
    /// Draw a fresh salt from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| ShipError::Corrupt(format!("Salt is not valid base64: {}", e)))?;
        let bytes: [u8; SALT_LENGTH] = decoded.try_into().map_err(|raw: Vec<u8>| {
            ShipError::Corrupt(format!(
                "Salt must be {} bytes (got {})",
                SALT_LENGTH,
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Salt::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// The store's key pair, derived from passphrase and salt.
///
/// The secret half zeroizes itself when dropped. Deliberately not `Clone`.
pub struct KeyMaterial {
    secret: StaticSecret,
    public: PublicKey,
    salt: Salt,
    params: KdfParams,
}

impl KeyMaterial {
    /// Derive key material from a passphrase.
    ///
    /// # Security
    ///
    /// - Same passphrase + salt + params always produce the same key pair
    /// - A wrong passphrase is NOT detected here; it surfaces when a sealed
    ///   value fails to open
    ///
    /// # Errors
    ///
    /// Returns `ShipError::Crypto` only if the parameters are rejected by Argon2.
    pub fn derive(passphrase: &str, salt: Salt, params: KdfParams) -> Result<Self> {
        let argon2 = params.argon2()?;
        let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
        argon2
            .hash_password_into(passphrase.as_bytes(), salt.as_bytes(), &mut seed[..])
            .map_err(|e| ShipError::Crypto(format!("Key derivation failed: {}", e)))?;

        let secret = StaticSecret::from(*seed);
        let public = PublicKey::from(&secret);
        debug!(
            memory_kib = params.memory_kib,
            iterations = params.iterations,
            "derived key material"
        );
        Ok(Self {
            secret,
            public,
            salt,
            params,
        })
    }

    /// Derive key material under a freshly generated salt (store creation).
    pub fn generate(passphrase: &str, params: KdfParams) -> Result<(Self, Salt)> {
        let salt = Salt::generate();
        let material = Self::derive(passphrase, salt, params)?;
        Ok((material, salt))
    }

    pub fn salt(&self) -> Salt {
        self.salt
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("secret", &"[REDACTED]")
            .field("salt", &self.salt)
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> KdfParams {
        KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let salt = Salt::from_bytes(*b"unique-salt-1234");

        let key1 = KeyMaterial::derive("test-passphrase", salt, cheap()).unwrap();
        let key2 = KeyMaterial::derive("test-passphrase", salt, cheap()).unwrap();

        assert_eq!(key1.public_key().as_bytes(), key2.public_key().as_bytes());
        assert_eq!(key1.secret().to_bytes(), key2.secret().to_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = KeyMaterial::derive("pass", Salt::from_bytes([1; 16]), cheap()).unwrap();
        let key2 = KeyMaterial::derive("pass", Salt::from_bytes([2; 16]), cheap()).unwrap();

        assert_ne!(key1.public_key().as_bytes(), key2.public_key().as_bytes());
    }

    #[test]
    fn test_different_passphrase_different_key() {
        let salt = Salt::from_bytes([7; 16]);
        let key1 = KeyMaterial::derive("p1", salt, cheap()).unwrap();
        let key2 = KeyMaterial::derive("p2", salt, cheap()).unwrap();

        assert_ne!(key1.public_key().as_bytes(), key2.public_key().as_bytes());
    }

    #[test]
    fn test_different_params_different_key() {
        let salt = Salt::from_bytes([7; 16]);
        let mut stronger = cheap();
        stronger.iterations = 2;

        let key1 = KeyMaterial::derive("pass", salt, cheap()).unwrap();
        let key2 = KeyMaterial::derive("pass", salt, stronger).unwrap();

        assert_ne!(key1.public_key().as_bytes(), key2.public_key().as_bytes());
    }

    #[test]
    fn test_generate_uses_fresh_salt() {
        let (key1, salt1) = KeyMaterial::generate("pass", cheap()).unwrap();
        let (_, salt2) = KeyMaterial::generate("pass", cheap()).unwrap();

        assert_eq!(key1.salt(), salt1);
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = KdfParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        let err = KeyMaterial::derive("pass", Salt::generate(), params).unwrap_err();
        assert!(matches!(err, ShipError::Crypto(_)));
    }

    #[test]
    fn test_salt_base64_validation() {
        let salt = Salt::from_bytes([9; 16]);
        assert_eq!(Salt::from_base64(&salt.to_base64()).unwrap(), salt);

        let short = STANDARD.encode([0u8; 8]);
        assert!(matches!(
            Salt::from_base64(&short),
            Err(ShipError::Corrupt(_))
        ));
        assert!(Salt::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_key_material_debug_redacts() {
        let key = KeyMaterial::derive("pass", Salt::from_bytes([3; 16]), cheap()).unwrap();

        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));

        let secret_hex = hex::encode(&key.secret().to_bytes()[..4]);
        assert!(!debug_output.contains(&secret_hex));
    }
}
