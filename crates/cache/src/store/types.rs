//! FileStore type and lifetime

use filestash_core::{KeyRenderer, Serializer};
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cache backend storing one file per key
pub struct FileStore {
    /// Canonical configured directory; sweeps never leave it
    pub(super) root: PathBuf,
    /// Canonical `root` joined with the prefix
    pub(super) base_dir: PathBuf,
    pub(super) keys: KeyRenderer,
    pub(super) serializer: Serializer,
    pub(super) files_permission: u32,
    /// Percentage chance of a GC sweep on drop
    pub(super) gc_probability: u8,
    pub(super) default_ttl: i64,
}

impl FileStore {
    /// Canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory entries are sharded under
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn files_permission(&self) -> u32 {
        self.files_permission
    }

    pub fn gc_probability(&self) -> u8 {
        self.gc_probability
    }

    /// End the store's lifetime, running the probabilistic GC sweep
    pub fn close(self) {}

    fn should_collect(&self) -> bool {
        rand::thread_rng().gen_range(1..=100u8) <= self.gc_probability
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if !self.should_collect() {
            return;
        }
        let ok = self.gc();
        debug!(
            base_dir = %self.base_dir.display(),
            ok,
            "garbage collection sweep on close"
        );
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("base_dir", &self.base_dir)
            .field("prefix", &self.keys.prefix())
            .field("serializer", &self.serializer)
            .field("default_ttl", &self.default_ttl)
            .field("gc_probability", &self.gc_probability)
            .finish()
    }
}
