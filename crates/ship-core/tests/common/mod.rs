#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use secrecy::SecretString;
use ship_core::{KdfParams, PassphrasePurpose, Prompter, SecretStore, Session, ShipError, Vcs};

/// Argon2 parameters cheap enough for tests.
pub fn cheap_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn store_at(root: &Path) -> SecretStore {
    SecretStore::new(root).with_kdf_params(cheap_kdf())
}

/// Answers every passphrase prompt with the same value and counts the prompts.
pub struct FixedPrompter {
    passphrase: Option<String>,
    git: bool,
    asked: Rc<Cell<usize>>,
}

impl Prompter for FixedPrompter {
    fn ask_passphrase(&self, _purpose: PassphrasePurpose) -> ship_core::Result<SecretString> {
        self.asked.set(self.asked.get() + 1);
        self.passphrase
            .clone()
            .map(SecretString::from)
            .ok_or_else(|| ShipError::PromptFailed("cancelled".to_string()))
    }

    fn ask_yes_no(&self, _prompt: &str) -> ship_core::Result<bool> {
        Ok(self.git)
    }
}

/// A fresh session (as in a new process) answering with `passphrase`.
pub fn session(passphrase: &str) -> (Session, Rc<Cell<usize>>) {
    prompted_session(Some(passphrase), false)
}

/// A session whose prompts are all cancelled.
pub fn cancelled_session() -> (Session, Rc<Cell<usize>>) {
    prompted_session(None, false)
}

pub fn prompted_session(passphrase: Option<&str>, git: bool) -> (Session, Rc<Cell<usize>>) {
    let asked = Rc::new(Cell::new(0));
    let prompter = FixedPrompter {
        passphrase: passphrase.map(str::to_string),
        git,
        asked: Rc::clone(&asked),
    };
    (Session::new(prompter), asked)
}

/// Records the paths it was asked to initialize, optionally failing.
#[derive(Default)]
pub struct RecordingVcs {
    pub fail: bool,
    pub calls: RefCell<Vec<PathBuf>>,
}

impl Vcs for RecordingVcs {
    fn init_repository_at(&self, path: &Path) -> ship_core::Result<()> {
        self.calls.borrow_mut().push(path.to_path_buf());
        if self.fail {
            Err(ShipError::OptionalFeature("git not installed".to_string()))
        } else {
            Ok(())
        }
    }
}
