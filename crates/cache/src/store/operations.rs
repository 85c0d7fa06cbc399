//! Single-key read, write and delete

use crate::entry;
use chrono::Utc;
use filestash_core::{resolve_ttl, Error, Result};
use filestash_utils::lock;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::paths::{entry_path, hash_key};
use super::types::FileStore;

/// Outcome of looking at one entry file
pub(super) enum Inspection {
    /// Decodable and not yet expired
    Live(Vec<u8>),
    /// No file, or a file that could not be read
    Absent,
    /// Expired or undecodable; `removed` tells whether the file is gone
    Evicted { removed: bool },
}

pub(super) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl FileStore {
    /// File a key is stored in
    pub fn entry_path(&self, key: &str) -> PathBuf {
        entry_path(&self.base_dir, &hash_key(&self.keys.render(key)))
    }

    pub(super) fn get_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.entry_path(key);
        let Inspection::Live(bytes) = self.inspect(&path) else {
            return None;
        };

        match entry::open(self.serializer, &bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                // Valid entry of another type; leave it for whoever wrote it
                debug!(
                    path = %path.display(),
                    error = %e,
                    "cached value does not decode as the requested type"
                );
                None
            }
        }
    }

    /// Read an entry file, removing it if it is expired or corrupt
    pub(super) fn inspect(&self, path: &Path) -> Inspection {
        if !path.is_file() {
            return Inspection::Absent;
        }

        let bytes = match lock::read_shared(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Inspection::Absent,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read cache file");
                return Inspection::Absent;
            }
        };

        match entry::expires_at(self.serializer, &bytes) {
            Ok(expires_at) if expires_at > now_millis() => Inspection::Live(bytes),
            Ok(expires_at) => {
                debug!(path = %path.display(), expires_at, "removing expired cache file");
                Inspection::Evicted {
                    removed: self.delete_file(path),
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "removing undecodable cache file");
                Inspection::Evicted {
                    removed: self.delete_file(path),
                }
            }
        }
    }

    pub(super) fn set_value<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<i64>,
    ) -> Result<bool> {
        let path = self.entry_path(key);
        let ttl = resolve_ttl(ttl, self.default_ttl);
        let expires_at = now_millis().saturating_add(ttl.saturating_mul(1000));
        let bytes = entry::seal(self.serializer, value, expires_at)?;

        self.create_shard_dirs(&path)?;

        match lock::write_exclusive(&path, &bytes, self.files_permission) {
            Ok(created) => {
                if created {
                    debug!(
                        path = %path.display(),
                        mode = %format!("{:o}", self.files_permission),
                        "created cache file"
                    );
                }
                Ok(true)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write cache file");
                Ok(false)
            }
        }
    }

    fn create_shard_dirs(&self, path: &Path) -> Result<()> {
        let Some(dir) = path.parent() else {
            return Ok(());
        };
        if dir.is_dir() {
            return Ok(());
        }

        match fs::create_dir_all(dir) {
            Ok(()) => Ok(()),
            // Created concurrently by another writer
            Err(_) if dir.is_dir() => Ok(()),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to create cache directory");
                Err(Error::file_system(dir, "create cache directory", e))
            }
        }
    }

    /// Unlink one file; a file that is already gone counts as deleted
    pub(super) fn delete_file(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete cache file");
                false
            }
        }
    }
}
