//! Best-effort removal of files a run leaves behind.
//!
//! Failures are logged one by one and never abort the run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Removes the archive left over by the previous run.
pub fn remove_previous_archive(archive: &Path) {
    log::info!(target: "cleanup", "Deleting temp files");
    remove(archive);
}

/// Removes the dumps of the current run, returns how many couldn't be removed.
pub fn remove_dumps(files: &[PathBuf]) -> usize {
    log::info!(target: "cleanup", "Deleting backup files");
    files.iter().filter(|file| !remove(file)).count()
}

/// Removes what a failed dump may have left at `path`.
pub fn remove_partial_dump(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!(target: "cleanup", "Removed partial dump {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!(target: "cleanup", "Error deleting partial dump {}: {e}", path.display()),
    }
}

/// Removes the archive after it has been uploaded.
pub fn remove_archive(archive: &Path) {
    remove(archive);
}

fn remove(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!(target: "cleanup", "Deleted {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!(target: "cleanup", "{} doesn't exist, nothing to delete", path.display());
            true
        }
        Err(e) => {
            log::error!(target: "cleanup", "Error deleting file {}: {e}", path.display());
            false
        }
    }
}
