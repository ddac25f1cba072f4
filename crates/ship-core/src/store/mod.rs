//! The secret store on disk.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   ship.json.enc      envelope holding the Ship
//!   config.json.enc    envelope holding the Config
//!   .gitignore         only when version control is enabled
//!   tmp/               scratch: staged writes and plaintext caches
//!     ship.json
//!     config.json
//! ```
//!
//! Both envelopes share one salt and KDF parameters, chosen at `init`.
//!
//! ## Known limitation
//!
//! There is no cross-process locking. Two commands writing the same store at
//! the same time can lose one of the writes.

pub mod cache;
pub mod envelope;
pub mod secrets;
pub mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::crypto::KdfParams;
use crate::document::Document;
use crate::error::{Result, ShipError};
use crate::fs::{
    atomic_write, make_private_dirs, read_bytes, secure_delete, PRIVATE_FILE_MODE,
    STAGED_EXTENSION,
};
use crate::session::Session;
use crate::vcs::Vcs;

use envelope::Envelope;
pub use settings::StoreSettings;

/// Scratch directory name under the store root.
pub const SCRATCH_DIR: &str = "tmp";

const GITIGNORE_FILE: &str = ".gitignore";
const GITIGNORE_CONTENTS: &[u8] = b"tmp/\n";
const PUBLIC_FILE_MODE: u32 = 0o644;

/// Which of the store's two documents to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Ship,
    Config,
}

impl Slot {
    pub fn envelope_file(self) -> &'static str {
        match self {
            Slot::Ship => "ship.json.enc",
            Slot::Config => "config.json.enc",
        }
    }

    pub fn cache_file(self) -> &'static str {
        match self {
            Slot::Ship => "ship.json",
            Slot::Config => "config.json",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Slot::Ship => "ship",
            Slot::Config => "config",
        }
    }
}

/// What happened to version control during `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsOutcome {
    Declined,
    Initialized,
    /// The store was created but the repository was not
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub root: PathBuf,
    pub vcs: VcsOutcome,
}

/// A store rooted at a directory.
#[derive(Debug, Clone)]
pub struct SecretStore {
    root: PathBuf,
    kdf_params: KdfParams,
}

impl SecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kdf_params: KdfParams::default(),
        }
    }

    /// Argon2 parameters used when this store is created.
    ///
    /// Existing stores always open with the parameters recorded in their envelopes.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = params;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join(SCRATCH_DIR)
    }

    pub fn envelope_path(&self, slot: Slot) -> PathBuf {
        self.root.join(slot.envelope_file())
    }

    pub fn cache_path(&self, slot: Slot) -> PathBuf {
        self.scratch_dir().join(slot.cache_file())
    }

    /// True only when the root, the scratch directory and both envelopes exist.
    pub fn is_initialized(&self) -> bool {
        self.root.is_dir()
            && self.scratch_dir().is_dir()
            && self.envelope_path(Slot::Ship).is_file()
            && self.envelope_path(Slot::Config).is_file()
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ShipError::NotInitialized)
        }
    }

    /// Create a new store.
    ///
    /// Asks for the new passphrase and the version control decision before
    /// anything is written, so a cancelled prompt leaves no trace. A failing
    /// `vcs` is reported in the returned [`InitReport`], not as an error.
    pub fn init(&self, session: &mut Session, vcs: &dyn Vcs) -> Result<InitReport> {
        if self.is_initialized() {
            return Err(ShipError::AlreadyInitialized);
        }

        session.create_key_material(self.kdf_params)?;
        let use_vcs = session
            .prompter()
            .ask_yes_no("Track the store with git?")?;
        let key = session
            .current()
            .ok_or_else(|| ShipError::Crypto("Session holds no key material".to_string()))?;

        make_private_dirs(&self.root)?;
        make_private_dirs(&self.scratch_dir())?;

        let settings = StoreSettings::default();
        let defaults = [
            (Slot::Config, settings.to_document()),
            (Slot::Ship, Document::empty_mapping()),
        ];
        for (slot, document) in &defaults {
            let bytes = Envelope::seal(key, document)?.to_bytes()?;
            self.write_envelope(*slot, &bytes)?;
            self.write_cache(*slot, &bytes, document, &settings)?;
        }
        info!(root = %self.root.display(), "initialized store");

        let vcs = if use_vcs {
            match self.enable_vcs(vcs) {
                Ok(()) => VcsOutcome::Initialized,
                Err(err) => {
                    warn!(error = %err, "version control setup failed; store is still usable");
                    VcsOutcome::Failed(err.to_string())
                }
            }
        } else {
            VcsOutcome::Declined
        };

        Ok(InitReport {
            root: self.root.clone(),
            vcs,
        })
    }

    /// Load a document, from the plaintext cache when it is valid.
    ///
    /// Otherwise the envelope is decrypted with the session's key material
    /// (prompting if needed) and a fresh cache is written. A wrong passphrase
    /// fails with `WrongPassphrase` and writes nothing.
    pub fn load(&self, slot: Slot, session: &mut Session) -> Result<Document> {
        self.load_with_settings(slot, session).map(|(document, _)| document)
    }

    fn load_with_settings(
        &self,
        slot: Slot,
        session: &mut Session,
    ) -> Result<(Document, StoreSettings)> {
        self.ensure_initialized()?;
        let envelope_bytes = read_bytes(&self.envelope_path(slot))?;

        let settings = match slot {
            Slot::Ship => Some(self.settings(session)?),
            Slot::Config => None,
        };
        if let Some(document) = self.cached(slot, &envelope_bytes, settings)? {
            let settings = match settings {
                Some(settings) => settings,
                None => StoreSettings::from_document(&document)?,
            };
            return Ok((document, settings));
        }

        let envelope = Envelope::from_bytes(&envelope_bytes)?;
        let mut opened = None;
        let key = session.key_material(envelope.salt, envelope.kdf, |candidate| {
            opened = Some(envelope.open(candidate)?);
            Ok(())
        })?;
        let document = match opened {
            Some(document) => document,
            None => envelope.open(key)?,
        };
        debug!(slot = slot.label(), "decrypted envelope");

        let settings = match settings {
            Some(settings) => settings,
            None => StoreSettings::from_document(&document)?,
        };
        self.write_cache(slot, &envelope_bytes, &document, &settings)?;
        Ok((document, settings))
    }

    /// Encrypt and persist a document, then refresh its plaintext cache.
    ///
    /// The session's key material is verified against the existing envelope
    /// before anything is written. The envelope is replaced atomically first;
    /// the cache is written second.
    pub fn save(&self, slot: Slot, session: &mut Session, document: &Document) -> Result<()> {
        self.ensure_initialized()?;
        if document.as_mapping().is_none() {
            return Err(ShipError::InvalidInput(format!(
                "The {} document must be a mapping",
                slot.label()
            )));
        }
        document.ensure_persistable()?;

        let settings = match slot {
            Slot::Ship => self.settings(session)?,
            Slot::Config => StoreSettings::from_document(document)?,
        };

        let existing = Envelope::from_bytes(&read_bytes(&self.envelope_path(slot))?)?;
        let key = session.key_material(existing.salt, existing.kdf, |candidate| {
            existing.open(candidate).map(|_| ())
        })?;

        let bytes = Envelope::seal(key, document)?.to_bytes()?;
        self.write_envelope(slot, &bytes)?;
        self.write_cache(slot, &bytes, document, &settings)?;
        if slot == Slot::Config && !settings.caching_enabled() {
            secure_delete(&self.cache_path(Slot::Ship))?;
        }
        info!(slot = slot.label(), "saved document");
        Ok(())
    }

    pub fn load_ship(&self, session: &mut Session) -> Result<Document> {
        self.load(Slot::Ship, session)
    }

    /// The Ship together with the settings read while loading it.
    pub fn load_ship_with_settings(
        &self,
        session: &mut Session,
    ) -> Result<(Document, StoreSettings)> {
        self.load_with_settings(Slot::Ship, session)
    }

    pub fn save_ship(&self, session: &mut Session, ship: &Document) -> Result<()> {
        self.save(Slot::Ship, session, ship)
    }

    pub fn load_config(&self, session: &mut Session) -> Result<Document> {
        self.load(Slot::Config, session)
    }

    pub fn save_config(&self, session: &mut Session, config: &Document) -> Result<()> {
        self.save(Slot::Config, session, config)
    }

    /// Typed settings from the Config document.
    pub fn settings(&self, session: &mut Session) -> Result<StoreSettings> {
        StoreSettings::from_document(&self.load_config(session)?)
    }

    /// Remove plaintext caches and abandoned staged files.
    ///
    /// Works on an uninitialized or partially created store; it only ever
    /// removes files from the scratch directory.
    pub fn lock(&self) -> Result<()> {
        for slot in [Slot::Ship, Slot::Config] {
            secure_delete(&self.cache_path(slot))?;
        }

        let scratch = self.scratch_dir();
        let entries = match fs::read_dir(&scratch) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let mut removed = 0usize;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(STAGED_EXTENSION) {
                secure_delete(&path)?;
                removed += 1;
            }
        }
        info!(staged_removed = removed, "locked store");
        Ok(())
    }

    fn cached(
        &self,
        slot: Slot,
        envelope_bytes: &[u8],
        settings: Option<StoreSettings>,
    ) -> Result<Option<Document>> {
        let path = self.cache_path(slot);
        let Some((cache, age)) = cache::read(&path)? else {
            debug!(slot = slot.label(), "no plaintext cache");
            return Ok(None);
        };

        // The Config cache carries its own timeout.
        let timeout = match settings {
            Some(settings) => settings.timeout,
            None => StoreSettings::from_document(&cache.document)
                .map(|settings| settings.timeout)
                .unwrap_or_default(),
        };
        let fresh = cache.source == cache::fingerprint(envelope_bytes) && age < timeout;

        if fresh {
            cache::touch(&path)?;
            debug!(slot = slot.label(), "using plaintext cache");
            Ok(Some(cache.document))
        } else {
            debug!(slot = slot.label(), "discarding stale plaintext cache");
            secure_delete(&path)?;
            Ok(None)
        }
    }

    /// Keeps the scratch directory out of the repository, then creates it.
    fn enable_vcs(&self, vcs: &dyn Vcs) -> Result<()> {
        atomic_write(
            &self.scratch_dir(),
            &self.root.join(GITIGNORE_FILE),
            GITIGNORE_CONTENTS,
            PUBLIC_FILE_MODE,
        )?;
        vcs.init_repository_at(&self.root)
    }

    fn write_envelope(&self, slot: Slot, bytes: &[u8]) -> Result<()> {
        atomic_write(
            &self.scratch_dir(),
            &self.envelope_path(slot),
            bytes,
            PRIVATE_FILE_MODE,
        )
    }

    fn write_cache(
        &self,
        slot: Slot,
        envelope_bytes: &[u8],
        document: &Document,
        settings: &StoreSettings,
    ) -> Result<()> {
        let path = self.cache_path(slot);
        if settings.caching_enabled() {
            cache::write(
                &self.scratch_dir(),
                &path,
                &cache::fingerprint(envelope_bytes),
                document,
            )
        } else {
            secure_delete(&path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{PassphrasePurpose, Prompter};
    use crate::vcs::NoVcs;
    use secrecy::SecretString;
    use tempfile::tempdir;

    struct Fixed {
        passphrase: &'static str,
        git: bool,
    }

    impl Prompter for Fixed {
        fn ask_passphrase(&self, _purpose: PassphrasePurpose) -> Result<SecretString> {
            Ok(SecretString::from(self.passphrase.to_string()))
        }

        fn ask_yes_no(&self, _prompt: &str) -> Result<bool> {
            Ok(self.git)
        }
    }

    fn session(passphrase: &'static str) -> Session {
        Session::new(Fixed {
            passphrase,
            git: false,
        })
    }

    fn store(root: &Path) -> SecretStore {
        SecretStore::new(root).with_kdf_params(KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
    }

    #[test]
    fn test_init_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("ship");
        let store = store(&root);
        assert!(!store.is_initialized());

        let report = store.init(&mut session("p1"), &NoVcs).unwrap();

        assert_eq!(report.vcs, VcsOutcome::Declined);
        assert!(store.is_initialized());
        assert!(store.cache_path(Slot::Ship).is_file());
        assert!(store.cache_path(Slot::Config).is_file());
        assert!(!root.join(GITIGNORE_FILE).exists());
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.init(&mut session("p1"), &NoVcs).unwrap();

        let err = store.init(&mut session("p1"), &NoVcs).unwrap_err();
        assert!(matches!(err, ShipError::AlreadyInitialized));
    }

    #[test]
    fn test_operations_before_init_fail() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let err = store.load_ship(&mut session("p1")).unwrap_err();
        assert!(matches!(err, ShipError::NotInitialized));
        store.lock().unwrap();
    }

    #[test]
    fn test_settings_default_after_init() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let mut session = session("p1");
        store.init(&mut session, &NoVcs).unwrap();

        assert_eq!(store.settings(&mut session).unwrap(), StoreSettings::default());
    }

    #[test]
    fn test_save_rejects_non_mapping() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let mut session = session("p1");
        store.init(&mut session, &NoVcs).unwrap();

        let err = store
            .save_ship(&mut session, &Document::from("flat"))
            .unwrap_err();
        assert!(matches!(err, ShipError::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_config_rejected_before_write() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let mut session = session("p1");
        store.init(&mut session, &NoVcs).unwrap();
        let before = fs::read(store.envelope_path(Slot::Config)).unwrap();

        let bad = Document::from_json(r#"{"timeout": "never"}"#).unwrap();
        assert!(store.save_config(&mut session, &bad).is_err());
        assert_eq!(fs::read(store.envelope_path(Slot::Config)).unwrap(), before);
    }

    #[test]
    fn test_lock_removes_caches_and_orphans() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.init(&mut session("p1"), &NoVcs).unwrap();
        let orphan = store.scratch_dir().join("ship.json.enc.1.2.tmp");
        fs::write(&orphan, b"partial").unwrap();

        store.lock().unwrap();

        assert!(!store.cache_path(Slot::Ship).exists());
        assert!(!store.cache_path(Slot::Config).exists());
        assert!(!orphan.exists());
        assert!(store.is_initialized());
    }
}
