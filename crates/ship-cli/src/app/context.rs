//! Application context for the Ship CLI.
//!
//! Bundles the parsed arguments with the store handle and the session that
//! holds key material for the rest of the invocation.

use once_cell::unsync::OnceCell;

use ship_core::{SecretStore, Session};

use crate::cli::{Cli, Commands};
use crate::prompt::TerminalPrompter;

use super::resolver::resolve_store_path;

pub struct AppContext<'a> {
    cli: &'a Cli,
    store: OnceCell<SecretStore>,
    session: Session,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        let vcs_choice = match &cli.command {
            Commands::Init(args) => args.vcs_choice(),
            _ => None,
        };
        Self {
            cli,
            store: OnceCell::new(),
            session: Session::new(TerminalPrompter::new(vcs_choice)),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// The store, resolved on first use, together with the session that unlocks it.
    pub fn store_and_session(&mut self) -> anyhow::Result<(&SecretStore, &mut Session)> {
        let cli = self.cli;
        let store = self.store.get_or_try_init(|| open_store(cli))?;
        Ok((store, &mut self.session))
    }
}

fn open_store(cli: &Cli) -> anyhow::Result<SecretStore> {
    let store = SecretStore::new(resolve_store_path(cli)?);
    Ok(match &cli.command {
        Commands::Init(args) => store.with_kdf_params(args.kdf_params()),
        _ => store,
    })
}
