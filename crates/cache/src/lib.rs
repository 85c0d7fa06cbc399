//! Filesystem cache backend for filestash
//!
//! This crate provides [`FileStore`], a [`filestash_core::Cache`]
//! implementation keeping one file per key:
//! - SHA-256 named entry files sharded two directories deep
//! - Per-entry expiry, enforced on read and by a probabilistic GC sweep
//! - Advisory file locks around every read and write
//! - Configuration from code, JSON files or environment variables
//!
//! ```no_run
//! use filestash_cache::{FileStore, FileStoreConfig};
//! use filestash_core::Cache;
//!
//! let store = FileStore::new(FileStoreConfig::builder().directory("/var/cache/app").build())?;
//! store.set("greeting", "hello", Some(30))?;
//! assert_eq!(store.get::<String>("greeting").as_deref(), Some("hello"));
//! # Ok::<(), filestash_core::Error>(())
//! ```

pub mod config;
pub mod entry;
pub mod store;

pub use config::{
    ConfigSource, FileStoreConfig, FileStoreConfigBuilder, FileStoreConfigLoader, LoadedConfig,
};
pub use store::FileStore;
