//! Flush and garbage-collection sweeps

use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::operations::Inspection;
use super::types::FileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    /// Remove every entry
    Flush,
    /// Remove expired and undecodable entries only
    Expired,
}

impl FileStore {
    /// Remove every expired or undecodable entry under the base directory.
    ///
    /// Shard directories left empty are removed. Returns `false` as soon as a
    /// file or directory that should go cannot be removed.
    pub fn gc(&self) -> bool {
        self.sweep(&self.base_dir, Sweep::Expired)
    }

    pub(super) fn flush_all(&self) -> bool {
        self.sweep(&self.base_dir, Sweep::Flush)
    }

    fn sweep(&self, dir: &Path, mode: Sweep) -> bool {
        let Some((dir, entries)) = self.open_dir(dir) else {
            return false;
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "failed to list cache directory");
                    return false;
                }
            };
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let path = entry.path();
            if path.is_dir() {
                if !self.sweep(&path, mode) || !remove_dir_if_empty(&path) {
                    return false;
                }
                continue;
            }

            let ok = match mode {
                Sweep::Flush => self.delete_file(&path),
                Sweep::Expired => !matches!(
                    self.inspect(&path),
                    Inspection::Evicted { removed: false }
                ),
            };
            if !ok {
                return false;
            }
        }

        true
    }

    /// Resolve a directory for sweeping, refusing anything outside the root
    fn open_dir(&self, dir: &Path) -> Option<(PathBuf, ReadDir)> {
        let real = match fs::canonicalize(dir) {
            Ok(real) => real,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to resolve cache directory");
                return None;
            }
        };
        if !real.starts_with(&self.root) {
            warn!(
                path = %real.display(),
                root = %self.root.display(),
                "refusing to sweep a directory outside of the cache root"
            );
            return None;
        }

        match fs::read_dir(&real) {
            Ok(entries) => Some((real, entries)),
            Err(e) => {
                warn!(path = %real.display(), error = %e, "failed to open cache directory");
                None
            }
        }
    }
}

fn is_empty_dir(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

fn remove_dir_if_empty(dir: &Path) -> bool {
    match is_empty_dir(dir) {
        Ok(true) => {}
        Ok(false) => return true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to inspect cache directory");
            return false;
        }
    }

    match fs::remove_dir(dir) {
        Ok(()) => {
            debug!(path = %dir.display(), "removed empty cache directory");
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        // A writer repopulated it in the meantime
        Err(_) if matches!(is_empty_dir(dir), Ok(false)) => true,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to remove cache directory");
            false
        }
    }
}
