//! Store path resolution.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::constants::DEFAULT_STORE_DIR;

/// The store directory: `--store` / `SHIP_DIR`, else `~/.ship`.
pub fn resolve_store_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = &cli.store {
        return Ok(path.clone());
    }
    Ok(home_dir()?.join(DEFAULT_STORE_DIR))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; pass --store or set SHIP_DIR"))?;
    Ok(PathBuf::from(home))
}
