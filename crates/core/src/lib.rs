//! Core contract, errors and encodings for the `filestash` cache.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias. Only configuration
//!   validation and hard write failures are reported as errors.
//! - **`cache`**: the `Cache` trait every backend implements, with batch and
//!   counter operations built on the single-key primitives.
//! - **`serializer`**: the four selectable value encodings.
//! - **`keys`**: prefix-based key rendering.
//! - **`debug`**: a decorator recording per-command timings.

pub mod cache;
pub mod debug;
pub mod errors;
pub mod keys;
pub mod serializer;

pub use self::{
    cache::{resolve_ttl, validate_default_ttl, Cache, DEFAULT_TTL},
    debug::{Activity, CacheCollector, Collected, CollectorInfo, Command, CommandRecord},
    errors::{Error, RecoveryHint, Result, SerializationOp},
    keys::KeyRenderer,
    serializer::Serializer,
};
