//! Plaintext cache files.
//!
//! A decrypted copy of each document is kept in the store's scratch
//! directory so that later commands within the configured timeout do not
//! need the passphrase. A cache file records the blake3 fingerprint of the
//! envelope it mirrors; a cache whose fingerprint no longer matches the
//! envelope on disk is stale and never used.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::document::Document;
use crate::error::Result;
use crate::fs::{atomic_write, secure_delete, PRIVATE_FILE_MODE};

/// Fingerprint of envelope bytes, as recorded in a cache file.
pub(crate) fn fingerprint(envelope_bytes: &[u8]) -> String {
    blake3::hash(envelope_bytes).to_hex().to_string()
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    source: &'a str,
    document: &'a Document,
}

#[derive(Deserialize)]
pub(crate) struct CacheFile {
    pub source: String,
    pub document: Document,
}

/// Read a cache file, returning it with the time since it was last used.
///
/// A missing file is `None`. An unreadable or malformed one is removed and
/// also reported as `None`.
pub(crate) fn read(path: &Path) -> Result<Option<(CacheFile, Duration)>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => Zeroizing::new(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let cache: CacheFile = match serde_json::from_slice(&bytes) {
        Ok(cache) => cache,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "discarding unreadable plaintext cache");
            secure_delete(path)?;
            return Ok(None);
        }
    };

    // A modification time in the future counts as infinitely old.
    let age = fs::metadata(path)?
        .modified()?
        .elapsed()
        .unwrap_or(Duration::MAX);
    Ok(Some((cache, age)))
}

/// Stage and commit a cache file with owner-only permissions.
pub(crate) fn write(scratch_dir: &Path, path: &Path, source: &str, document: &Document) -> Result<()> {
    let bytes = Zeroizing::new(serde_json::to_vec(&CacheFileRef { source, document })?);
    atomic_write(scratch_dir, path, &bytes, PRIVATE_FILE_MODE)?;
    debug!(path = %path.display(), "wrote plaintext cache");
    Ok(())
}

/// Mark a cache file as just used.
pub(crate) fn touch(path: &Path) -> Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_modified(SystemTime::now())?;
    Ok(())
}
