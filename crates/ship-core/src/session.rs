//! Process-lifetime owner of unlocked key material.
//!
//! A [`Session`] prompts for the passphrase the first time a protected
//! operation needs it and hands out the derived [`KeyMaterial`] for the rest
//! of the process. Nothing held here is ever written to disk; a new process
//! starts locked.

use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::crypto::{KdfParams, KeyMaterial, Salt};
use crate::error::{Result, ShipError};
use crate::prompt::{PassphrasePurpose, Prompter};

pub struct Session {
    prompter: Box<dyn Prompter>,
    unlocked: Option<KeyMaterial>,
}

impl Session {
    pub fn new(prompter: impl Prompter + 'static) -> Self {
        Self {
            prompter: Box::new(prompter),
            unlocked: None,
        }
    }

    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked.is_some()
    }

    /// The cached key material, if any.
    pub fn current(&self) -> Option<&KeyMaterial> {
        self.unlocked.as_ref()
    }

    /// Forget the cached key material (its secret is zeroized on drop).
    pub fn lock(&mut self) {
        if self.unlocked.take().is_some() {
            debug!("session locked");
        }
    }

    /// Key material for a store created with `salt` and `params`.
    ///
    /// Reuses the cached material when it was derived for the same salt and
    /// parameters. Otherwise prompts once, derives, and runs `verify` against
    /// the candidate; only a candidate that passes is cached. A failed
    /// verification leaves the session as it was.
    pub fn key_material<F>(
        &mut self,
        salt: Salt,
        params: KdfParams,
        verify: F,
    ) -> Result<&KeyMaterial>
    where
        F: FnOnce(&KeyMaterial) -> Result<()>,
    {
        let cached = self
            .unlocked
            .as_ref()
            .is_some_and(|key| key.salt() == salt && key.params() == params);

        if cached {
            debug!("reusing unlocked key material");
        } else {
            let passphrase = self.prompter.ask_passphrase(PassphrasePurpose::Unlock)?;
            let candidate = KeyMaterial::derive(passphrase.expose_secret(), salt, params)?;
            verify(&candidate)?;
            info!("session unlocked");
            self.unlocked = Some(candidate);
        }

        self.current()
            .ok_or_else(|| ShipError::Crypto("Session holds no key material".to_string()))
    }

    /// Prompt for a new passphrase and derive key material under a fresh salt.
    ///
    /// Replaces whatever the session held before.
    pub fn create_key_material(&mut self, params: KdfParams) -> Result<&KeyMaterial> {
        let passphrase = self.prompter.ask_passphrase(PassphrasePurpose::Create)?;
        let (material, _salt) = KeyMaterial::generate(passphrase.expose_secret(), params)?;
        self.unlocked = Some(material);
        self.current()
            .ok_or_else(|| ShipError::Crypto("Session holds no key material".to_string()))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("unlocked", &self.is_unlocked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct CountingPrompter {
        answers: RefCell<Vec<&'static str>>,
        asked: Rc<Cell<usize>>,
    }

    impl Prompter for CountingPrompter {
        fn ask_passphrase(&self, _purpose: PassphrasePurpose) -> Result<SecretString> {
            self.asked.set(self.asked.get() + 1);
            self.answers
                .borrow_mut()
                .pop()
                .map(|answer| SecretString::from(answer.to_string()))
                .ok_or_else(|| ShipError::PromptFailed("no input".to_string()))
        }

        fn ask_yes_no(&self, _prompt: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn session(answers: &[&'static str]) -> (Session, Rc<Cell<usize>>) {
        let asked = Rc::new(Cell::new(0));
        let mut queue = answers.to_vec();
        queue.reverse();
        let prompter = CountingPrompter {
            answers: RefCell::new(queue),
            asked: Rc::clone(&asked),
        };
        (Session::new(prompter), asked)
    }

    fn cheap() -> KdfParams {
        KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_prompts_once_per_process() {
        let (mut session, asked) = session(&["p1"]);
        let salt = Salt::from_bytes([1; 16]);

        let first = *session
            .key_material(salt, cheap(), |_| Ok(()))
            .unwrap()
            .public_key();
        let second = *session
            .key_material(salt, cheap(), |_| panic!("cached key is not re-verified"))
            .unwrap()
            .public_key();

        assert_eq!(first, second);
        assert_eq!(asked.get(), 1);
        assert!(session.is_unlocked());
    }

    #[test]
    fn test_failed_verification_is_not_cached() {
        let (mut session, asked) = session(&["p2", "p1"]);
        let salt = Salt::from_bytes([1; 16]);

        let err = session
            .key_material(salt, cheap(), |_| Err(ShipError::WrongPassphrase))
            .unwrap_err();
        assert!(matches!(err, ShipError::WrongPassphrase));
        assert!(!session.is_unlocked());

        session.key_material(salt, cheap(), |_| Ok(())).unwrap();
        assert_eq!(asked.get(), 2);
    }

    #[test]
    fn test_other_salt_prompts_again() {
        let (mut session, asked) = session(&["p1", "p1"]);

        session
            .key_material(Salt::from_bytes([1; 16]), cheap(), |_| Ok(()))
            .unwrap();
        session
            .key_material(Salt::from_bytes([2; 16]), cheap(), |_| Ok(()))
            .unwrap();

        assert_eq!(asked.get(), 2);
    }

    #[test]
    fn test_lock_forgets_key() {
        let (mut session, asked) = session(&["p1", "p1"]);
        let salt = Salt::from_bytes([1; 16]);

        session.key_material(salt, cheap(), |_| Ok(())).unwrap();
        session.lock();
        assert!(!session.is_unlocked());

        session.key_material(salt, cheap(), |_| Ok(())).unwrap();
        assert_eq!(asked.get(), 2);
    }

    #[test]
    fn test_cancelled_prompt_propagates() {
        let (mut session, _) = session(&[]);
        let err = session
            .key_material(Salt::from_bytes([1; 16]), cheap(), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ShipError::PromptFailed(_)));
    }

    #[test]
    fn test_create_uses_fresh_salt() {
        let (mut session, _) = session(&["p1", "p1"]);
        let first = session.create_key_material(cheap()).unwrap().salt();
        let second = session.create_key_material(cheap()).unwrap().salt();
        assert_ne!(first, second);
    }

    #[test]
    fn test_debug_does_not_expose_key() {
        let (mut session, _) = session(&["p1"]);
        session.create_key_material(cheap()).unwrap();
        assert_eq!(format!("{:?}", session), "Session { unlocked: true }");
    }
}
