//! Filesystem-backed cache store
//!
//! Each key lives in its own file at `base/h0/h1/hash`, where `hash` is the
//! SHA-256 of the rendered key and `base` is the configured directory joined
//! with the prefix. Reads take a shared advisory lock, writes an exclusive
//! one. Expired or undecodable entries are removed when they are read, and by
//! the GC sweep that may run when a store is dropped.

mod builder;
mod cleanup;
mod operations;
pub mod paths;
mod trait_impl;
mod types;

#[cfg(test)]
mod tests;

pub use self::types::FileStore;
