//! Shared utilities for filestash
//!
//! Locked file I/O used by the file store, and tracing setup for embedding
//! applications and tests.

pub mod lock;
pub mod logging;

pub use lock::{read_shared, write_exclusive};
