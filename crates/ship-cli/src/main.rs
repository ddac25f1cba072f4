//! Ship CLI - A local, passphrase-protected secret store
//!
//! This is the command-line interface for Ship. It parses arguments, wires
//! the terminal prompter and git into the core library, and maps failures to
//! exit codes.

mod app;
mod cli;
mod commands;
mod constants;
mod errors;
mod git;
mod prompt;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::AppContext;
use cli::{Cli, Commands, ConfigCommand};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut ctx = AppContext::new(&cli);

    if let Err(err) = run(&mut ctx, &cli) {
        let (message, code) = errors::describe(&err);
        eprintln!("Error: {}", message);
        std::process::exit(code);
    }
}

/// Logs go to stderr so stdout stays clean for secret values.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(ctx: &mut AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init(_) => commands::handle_init(ctx),
        Commands::Add(args) => commands::handle_add(ctx, args),
        Commands::Get(args) => commands::handle_get(ctx, args),
        Commands::Remove(args) => commands::handle_remove(ctx, args),
        Commands::List(args) => commands::handle_list(ctx, args),
        Commands::Config { command } => match command {
            ConfigCommand::Get { key } => commands::handle_config_get(ctx, key.as_deref()),
            ConfigCommand::Set { key, value } => commands::handle_config_set(ctx, key, value),
        },
        Commands::Lock => commands::handle_lock(ctx),
        Commands::Completions { shell } => commands::handle_completions(*shell),
    }
}
