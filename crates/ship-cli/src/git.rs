use std::path::Path;
use std::process::Command;

use tracing::debug;

use ship_core::{Result, ShipError, Vcs};

/// Initializes a git repository in the store directory with the `git` binary.
pub struct GitVcs;

impl Vcs for GitVcs {
    fn init_repository_at(&self, path: &Path) -> Result<()> {
        let output = Command::new("git")
            .arg("init")
            .arg("--quiet")
            .current_dir(path)
            .output()
            .map_err(|e| ShipError::OptionalFeature(format!("could not run git: {}", e)))?;

        if !output.status.success() {
            return Err(ShipError::OptionalFeature(format!(
                "git init failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        debug!(path = %path.display(), "initialized git repository");
        Ok(())
    }
}
