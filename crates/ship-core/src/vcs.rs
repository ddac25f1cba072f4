//! Optional version control of the store directory.

use std::path::Path;

use crate::error::Result;

/// Snapshots the store directory in a version control system.
///
/// Failures are reported as `ShipError::OptionalFeature`; the store treats
/// them as warnings.
pub trait Vcs {
    fn init_repository_at(&self, path: &Path) -> Result<()>;
}

/// A `Vcs` that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVcs;

impl Vcs for NoVcs {
    fn init_repository_at(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
