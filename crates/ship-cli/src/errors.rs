//! CLI error types for structured error handling.
//!
//! Handlers return `anyhow::Result`. Before exiting, `main` looks for a
//! [`CliError`] or a core [`ShipError`] in the error and picks the exit code
//! from it.

use std::fmt;

use ship_core::ShipError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (store, secret id)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong passphrase)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }

    /// Translate a core error, or `None` when it has no dedicated exit code.
    pub fn from_core(err: &ShipError) -> Option<Self> {
        let mapped = match err {
            ShipError::NotInitialized => CliError::not_found(
                "No store found.",
                "Hint: Run `ship init` to create one, or pass --store.",
            ),
            ShipError::IdNotFound(query) => CliError::not_found(
                format!("No secret matches '{}'.", query),
                "Hint: Run `ship list` to see stored ids.",
            ),
            ShipError::WrongPassphrase => CliError::auth_failed_with_hint(
                "Incorrect passphrase.",
                "Hint: Check SHIP_PASSPHRASE if it is set.",
            ),
            ShipError::AlreadyInitialized => {
                CliError::invalid_input("A store already exists at this location.")
            }
            ShipError::InvalidInput(message) => CliError::invalid_input(message.clone()),
            _ => return None,
        };
        Some(mapped)
    }
}

/// Message and exit code for an error that ended a command.
pub fn describe(err: &anyhow::Error) -> (String, i32) {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return (cli_err.to_string(), cli_err.exit_code());
    }
    if let Some(core_err) = err.downcast_ref::<ShipError>() {
        if let Some(cli_err) = CliError::from_core(core_err) {
            return (cli_err.to_string(), cli_err.exit_code());
        }
    }
    (format!("{:#}", err), exit_codes::FAILURE)
}
