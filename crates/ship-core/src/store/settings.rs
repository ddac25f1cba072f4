//! Store-level settings kept in the encrypted Config document.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::document::{Document, Node, Scalar};
use crate::error::{Result, ShipError};
use crate::resolver::DEFAULT_MATCH_THRESHOLD;

/// Config key holding the plaintext cache lifetime in milliseconds.
pub const TIMEOUT_KEY: &str = "timeout";

/// Config key holding the resolver's minimum similarity.
pub const MATCH_THRESHOLD_KEY: &str = "matchThreshold";

/// Default plaintext cache lifetime: 15 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(900_000);

/// Typed view of the Config document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSettings {
    /// How long a plaintext cache stays valid after its last use; zero disables caching
    pub timeout: Duration,
    /// Minimum similarity for approximate id matches
    pub match_threshold: f64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl StoreSettings {
    /// Read settings from a Config document, falling back to defaults for absent keys.
    ///
    /// Keys other than the known settings are ignored.
    pub fn from_document(config: &Document) -> Result<Self> {
        let entries = config.as_mapping().ok_or_else(|| {
            ShipError::InvalidInput("Config must be a mapping of settings".to_string())
        })?;
        let mut settings = Self::default();

        if let Some(node) = entries.get(TIMEOUT_KEY) {
            settings.timeout = match node {
                Node::Scalar(Scalar::Integer(ms)) if *ms >= 0 => Duration::from_millis(*ms as u64),
                _ => {
                    return Err(ShipError::InvalidInput(format!(
                        "'{}' must be a non-negative integer number of milliseconds",
                        TIMEOUT_KEY
                    )))
                }
            };
        }

        if let Some(node) = entries.get(MATCH_THRESHOLD_KEY) {
            let threshold = match node {
                Node::Scalar(Scalar::Float(value)) => *value,
                Node::Scalar(Scalar::Integer(value)) => *value as f64,
                _ => f64::NAN,
            };
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ShipError::InvalidInput(format!(
                    "'{}' must be a number between 0 and 1",
                    MATCH_THRESHOLD_KEY
                )));
            }
            settings.match_threshold = threshold;
        }

        Ok(settings)
    }

    /// The Config document written at init.
    pub fn to_document(&self) -> Document {
        let timeout_ms = i64::try_from(self.timeout.as_millis()).unwrap_or(i64::MAX);
        Node::Mapping(BTreeMap::from([
            (TIMEOUT_KEY.to_string(), Document::from(timeout_ms)),
            (
                MATCH_THRESHOLD_KEY.to_string(),
                Document::from(self.match_threshold),
            ),
        ]))
    }

    pub fn caching_enabled(&self) -> bool {
        !self.timeout.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip() {
        let defaults = StoreSettings::default();
        let parsed = StoreSettings::from_document(&defaults.to_document()).unwrap();
        assert_eq!(parsed, defaults);
        assert_eq!(parsed.timeout, Duration::from_secs(15 * 60));
        assert!(parsed.caching_enabled());
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let settings = StoreSettings::from_document(&Document::from_json("{}").unwrap()).unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[test]
    fn test_zero_timeout_disables_caching() {
        let doc = Document::from_json(r#"{"timeout": 0}"#).unwrap();
        assert!(!StoreSettings::from_document(&doc).unwrap().caching_enabled());
    }

    #[test]
    fn test_integer_threshold_accepted() {
        let doc = Document::from_json(r#"{"matchThreshold": 1}"#).unwrap();
        assert_eq!(StoreSettings::from_document(&doc).unwrap().match_threshold, 1.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for input in [
            r#"{"timeout": -1}"#,
            r#"{"timeout": "soon"}"#,
            r#"{"timeout": 1.5}"#,
            r#"{"matchThreshold": 1.5}"#,
            r#"{"matchThreshold": "high"}"#,
            r#"["timeout"]"#,
        ] {
            let doc = Document::from_json(input).unwrap();
            assert!(
                matches!(
                    StoreSettings::from_document(&doc),
                    Err(ShipError::InvalidInput(_))
                ),
                "{}",
                input
            );
        }
    }
}
