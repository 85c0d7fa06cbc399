//! Store construction and validation

use crate::config::FileStoreConfig;
use filestash_core::{validate_default_ttl, Error, KeyRenderer, Result, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::FileStore;

/// Directory under the platform temp directory used when none is configured
const TEMP_SUBDIR: &str = "filestash";

impl FileStore {
    /// Build a store from validated configuration.
    ///
    /// The configured directory must exist; the prefix directory, when a prefix
    /// is set, must exist inside it and be writable.
    pub fn new(config: FileStoreConfig) -> Result<Self> {
        let serializer: Serializer = config.serializer.parse()?;
        let gc_probability = validate_gc(config.gc)?;
        let default_ttl = validate_default_ttl(config.default_ttl)?;
        let keys = KeyRenderer::new(config.prefix);

        let directory = match config.directory {
            Some(directory) => directory,
            None => default_directory()?,
        };
        let root = fs::canonicalize(&directory)
            .map_err(|_| Error::InvalidDirectory { path: directory })?;
        if !root.is_dir() {
            return Err(Error::InvalidDirectoryPath { path: root });
        }

        let base_dir = resolve_base_dir(&root, keys.prefix())?;
        ensure_writable(&base_dir)?;

        debug!(
            base_dir = %base_dir.display(),
            serializer = %serializer,
            default_ttl,
            gc = gc_probability,
            "file store ready"
        );

        Ok(Self {
            root,
            base_dir,
            keys,
            serializer,
            files_permission: config.files_permission,
            gc_probability,
            default_ttl,
        })
    }
}

fn validate_gc(gc: i64) -> Result<u8> {
    match u8::try_from(gc) {
        Ok(value) if (1..=100).contains(&value) => Ok(value),
        _ => Err(Error::InvalidGc { value: gc }),
    }
}

fn default_directory() -> Result<PathBuf> {
    let directory = std::env::temp_dir().join(TEMP_SUBDIR);
    fs::create_dir_all(&directory)
        .map_err(|e| Error::file_system(&directory, "create default cache directory", e))?;
    Ok(directory)
}

fn resolve_base_dir(root: &Path, prefix: Option<&str>) -> Result<PathBuf> {
    let Some(prefix) = prefix else {
        return Ok(root.to_path_buf());
    };

    let joined = root.join(prefix);
    match fs::canonicalize(&joined) {
        Ok(base_dir) if base_dir.is_dir() && base_dir.starts_with(root) => Ok(base_dir),
        _ => Err(Error::InvalidDirectoryPath { path: joined }),
    }
}

fn ensure_writable(base_dir: &Path) -> Result<()> {
    match tempfile::Builder::new()
        .prefix(".filestash-probe")
        .tempfile_in(base_dir)
    {
        Ok(_) => Ok(()),
        Err(e) => Err(Error::DirectoryNotWritable {
            path: base_dir.to_path_buf(),
            source: Some(e),
        }),
    }
}
