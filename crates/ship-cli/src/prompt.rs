//! Terminal implementation of the core's `Prompter`.

use std::io::{self, IsTerminal};

use dialoguer::{Confirm, Password};
use secrecy::SecretString;

use ship_core::crypto::validate_passphrase;
use ship_core::{PassphrasePurpose, Prompter, Result, ShipError};

use crate::constants::PASSPHRASE_ENV;

/// Asks on the terminal, or reads `SHIP_PASSPHRASE` when it is set.
pub struct TerminalPrompter {
    vcs_choice: Option<bool>,
}

impl TerminalPrompter {
    /// `vcs_choice` answers the git question without asking (from `--git` / `--no-git`).
    pub fn new(vcs_choice: Option<bool>) -> Self {
        Self { vcs_choice }
    }
}

fn prompt_failed(err: dialoguer::Error) -> ShipError {
    ShipError::PromptFailed(err.to_string())
}

fn passphrase_from_env() -> Option<SecretString> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
}

impl Prompter for TerminalPrompter {
    fn ask_passphrase(&self, purpose: PassphrasePurpose) -> Result<SecretString> {
        if let Some(passphrase) = passphrase_from_env() {
            return Ok(passphrase);
        }
        if !io::stdin().is_terminal() {
            return Err(ShipError::PromptFailed(format!(
                "No passphrase provided and no TTY available. Set {}.",
                PASSPHRASE_ENV
            )));
        }

        let passphrase = match purpose {
            PassphrasePurpose::Unlock => Password::new()
                .with_prompt("Passphrase")
                .interact()
                .map_err(prompt_failed)?,
            PassphrasePurpose::Create => loop {
                let candidate = Password::new()
                    .with_prompt("Enter a new passphrase")
                    .with_confirmation("Confirm passphrase", "Passphrases do not match")
                    .interact()
                    .map_err(prompt_failed)?;
                match validate_passphrase(&candidate) {
                    Ok(()) => break candidate,
                    Err(err) => eprintln!("{}", err),
                }
            },
        };
        Ok(SecretString::from(passphrase))
    }

    fn ask_yes_no(&self, prompt: &str) -> Result<bool> {
        if let Some(choice) = self.vcs_choice {
            return Ok(choice);
        }
        if !io::stdin().is_terminal() {
            return Ok(false);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(prompt_failed)
    }
}
