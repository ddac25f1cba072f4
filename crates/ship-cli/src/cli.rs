use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use ship_core::{KdfParams, VERSION};

/// Ship - A local, passphrase-protected secret store
#[derive(Parser)]
#[command(name = "ship")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store directory (defaults to ~/.ship)
    #[arg(short, long, global = true, env = "SHIP_DIR", value_name = "DIR")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log cache and key derivation decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new encrypted store
    Init(InitArgs),

    /// Store a secret under an id
    Add(AddArgs),

    /// Print the secret that best matches an id
    Get(GetArgs),

    /// Delete the secret that best matches an id
    #[command(alias = "rm")]
    Remove(RemoveArgs),

    /// List secret ids
    #[command(alias = "ls")]
    List(ListArgs),

    /// Read or change store settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Remove plaintext caches so the next command asks for the passphrase
    Lock,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Track the store with git without asking
    #[arg(long, conflicts_with = "no_git")]
    pub git: bool,

    /// Do not track the store with git, without asking
    #[arg(long)]
    pub no_git: bool,

    /// Argon2 memory cost in KiB (advanced)
    #[arg(long, value_name = "KIB")]
    pub kdf_memory_kib: Option<u32>,

    /// Argon2 passes (advanced)
    #[arg(long, value_name = "N")]
    pub kdf_iterations: Option<u32>,

    /// Argon2 lanes (advanced)
    #[arg(long, value_name = "N")]
    pub kdf_parallelism: Option<u32>,
}

impl InitArgs {
    /// The git decision given on the command line, if any.
    pub fn vcs_choice(&self) -> Option<bool> {
        match (self.git, self.no_git) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn kdf_params(&self) -> KdfParams {
        let defaults = KdfParams::default();
        KdfParams {
            memory_kib: self.kdf_memory_kib.unwrap_or(defaults.memory_kib),
            iterations: self.kdf_iterations.unwrap_or(defaults.iterations),
            parallelism: self.kdf_parallelism.unwrap_or(defaults.parallelism),
        }
    }
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Id to store the secret under
    #[arg(value_name = "ID")]
    pub id: String,

    /// Secret value (read from stdin when omitted)
    #[arg(value_name = "VALUE", conflicts_with = "json")]
    pub value: Option<String>,

    /// Store a structured secret given as a JSON document
    #[arg(long, value_name = "DOC")]
    pub json: Option<String>,
}

/// Arguments for the `get` command
#[derive(Args)]
pub struct GetArgs {
    /// Id to look up; close misspellings are accepted
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `remove` command
#[derive(Args)]
pub struct RemoveArgs {
    /// Id to remove; close misspellings are accepted
    #[arg(value_name = "ID")]
    pub id: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print one setting, or the whole config
    Get {
        #[arg(value_name = "KEY")]
        key: Option<String>,
    },

    /// Change a setting
    Set {
        #[arg(value_name = "KEY")]
        key: String,

        /// New value; numbers are stored as numbers
        #[arg(value_name = "VALUE")]
        value: String,
    },
}
