//! Filesystem utilities for atomic operations.
//!
//! Every file the store writes goes through [`StagedFile`]: the bytes are
//! written and synced to a temp file inside the store's scratch directory, then
//! renamed over the destination. A process killed between the two steps leaves
//! the previous destination untouched and an orphaned temp file behind.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, ShipError};

/// Extension used for staged temp files.
pub const STAGED_EXTENSION: &str = "tmp";

/// Owner-only permissions for files holding store data.
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Owner-only permissions for store directories.
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails even after the fallback attempt.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        // Best-effort replace on platforms where rename fails if target exists.
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Create `path` and any missing parents, restricting the leaf to the owner.
pub fn make_private_dirs(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        ShipError::Persistence(format!(
            "Failed to create directory {}: {}",
            path.display(),
            e
        ))
    })?;
    set_mode(path, PRIVATE_DIR_MODE)
}

/// Read a whole file, mapping errors to [`ShipError::Persistence`] with the path attached.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .map_err(|e| ShipError::Persistence(format!("Failed to read {}: {}", path.display(), e)))
}

/// A fully written temp file waiting to be renamed over its destination.
///
/// Dropping a `StagedFile` without calling [`StagedFile::commit`] removes the
/// temp file. Forgetting it (or crashing) leaves the orphan in place, which is
/// harmless: readers only ever look at the destination.
#[derive(Debug)]
pub struct StagedFile {
    temp_path: PathBuf,
    destination: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Write `data` to a fresh temp file in `scratch_dir` and sync it to disk.
    pub fn stage(scratch_dir: &Path, destination: &Path, data: &[u8], mode: u32) -> Result<Self> {
        let filename = destination
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ShipError::Persistence(format!("Invalid destination {}", destination.display()))
            })?;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ShipError::Persistence(format!("System time error: {}", e)))?
            .as_nanos();
        let temp_path = scratch_dir.join(format!(
            "{}.{}.{}.{}",
            filename,
            std::process::id(),
            nanos,
            STAGED_EXTENSION
        ));

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options
            .open(&temp_path)
            .map_err(|e| ShipError::Persistence(format!("Temp file create failed: {}", e)))?;
        let staged = Self {
            temp_path,
            destination: destination.to_path_buf(),
            committed: false,
        };
        file.write_all(data)
            .map_err(|e| ShipError::Persistence(format!("Temp file write failed: {}", e)))?;
        file.sync_all()
            .map_err(|e| ShipError::Persistence(format!("Temp file sync failed: {}", e)))?;

        Ok(staged)
    }

    /// Path of the temp file holding the staged bytes.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file over the destination.
    pub fn commit(mut self) -> Result<()> {
        rename_with_fallback(&self.temp_path, &self.destination).map_err(|e| {
            ShipError::Persistence(format!(
                "Failed to replace {}: {}",
                self.destination.display(),
                e
            ))
        })?;
        self.committed = true;
        sync_parent(&self.destination);
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Stage and commit in one step.
pub fn atomic_write(scratch_dir: &Path, destination: &Path, data: &[u8], mode: u32) -> Result<()> {
    StagedFile::stage(scratch_dir, destination, data, mode)?.commit()
}

/// Best-effort secure file deletion (overwrite + remove).
///
/// Overwrites the file with zeros before removing it. This is not
/// cryptographically secure (SSD wear leveling, filesystem journals),
/// but better than direct deletion. A missing file is not an error.
pub fn secure_delete(path: &Path) -> Result<()> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    if let Ok(mut file) = OpenOptions::new().write(true).open(path) {
        let zeros = vec![0u8; len.min(1024 * 1024) as usize];
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(zeros.len() as u64) as usize;
            if file.write_all(&zeros[..chunk]).is_err() {
                break;
            }
            remaining -= chunk as u64;
        }
        let _ = file.sync_all();
    }

    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ShipError::Persistence(format!(
            "Failed to remove {}: {}",
            path.display(),
            err
        ))),
    }
}

fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| {
            ShipError::Persistence(format!(
                "Failed to set permissions on {}: {}",
                path.display(),
                e
            ))
        })?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

// Durability of the rename itself; failure here does not undo the commit.
fn sync_parent(path: &Path) {
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}
