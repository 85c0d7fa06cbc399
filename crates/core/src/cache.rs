//! The cache contract every storage backend implements
//!
//! Backends only provide the four single-key primitives plus a little
//! metadata. Batch operations, counters and TTL resolution are shared default
//! methods built on those primitives, so every backend behaves identically.

use crate::errors::{Error, Result};
use crate::serializer::Serializer;
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// TTL used when neither the caller nor the configuration provide one
pub const DEFAULT_TTL: i64 = 60;

/// Pick the effective TTL for a write.
///
/// A missing or non-positive TTL falls back to the backend default.
#[inline]
pub fn resolve_ttl(ttl: Option<i64>, default_ttl: i64) -> i64 {
    match ttl {
        Some(seconds) if seconds > 0 => seconds,
        _ => default_ttl,
    }
}

/// Validate a default TTL
pub fn validate_default_ttl(ttl: i64) -> Result<i64> {
    if ttl <= 0 {
        return Err(Error::InvalidTtl { value: ttl });
    }
    Ok(ttl)
}

/// Uniform key-value cache contract
///
/// `get` distinguishes a miss (`None`) from stored falsy values: storing
/// `false` yields `Some(false)` and storing `Option::<T>::None` yields
/// `Some(None)`.
pub trait Cache {
    /// Short backend name, e.g. `"files"`
    fn handler(&self) -> &'static str;

    /// Encoding used for stored values
    fn serializer(&self) -> Serializer;

    /// Key namespace, if any
    fn prefix(&self) -> Option<&str>;

    /// TTL in seconds applied when a write does not carry one
    fn default_ttl(&self) -> i64;

    /// Replace the default TTL; non-positive values are rejected
    fn set_default_ttl(&mut self, ttl: i64) -> Result<()>;

    /// Fetch one value, `None` on a miss
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T>;

    /// Store one value.
    ///
    /// Returns `Ok(false)` when the write failed and was logged, and `Err` for
    /// failures the caller must see (unencodable value, unusable storage
    /// layout).
    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<i64>) -> Result<bool>;

    /// Remove one value; removing a missing key succeeds
    fn delete(&self, key: &str) -> bool;

    /// Remove every value in this backend's namespace
    fn flush(&self) -> bool;

    /// Fetch several values, keyed and ordered like the input
    fn get_multi<T, K>(&self, keys: &[K]) -> IndexMap<String, Option<T>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        keys.iter()
            .map(|key| (key.as_ref().to_string(), self.get(key.as_ref())))
            .collect()
    }

    /// Store several values with one TTL.
    ///
    /// Each write is independent; an `Err` stops the batch but writes made
    /// before it are kept.
    fn set_multi<T, K, I>(&self, items: I, ttl: Option<i64>) -> Result<IndexMap<String, bool>>
    where
        T: Serialize,
        K: Into<String>,
        I: IntoIterator<Item = (K, T)>,
    {
        let mut statuses = IndexMap::new();
        for (key, value) in items {
            let key = key.into();
            let status = self.set(&key, &value, ttl)?;
            statuses.insert(key, status);
        }
        Ok(statuses)
    }

    /// Remove several values
    fn delete_multi<K: AsRef<str>>(&self, keys: &[K]) -> IndexMap<String, bool> {
        keys.iter()
            .map(|key| (key.as_ref().to_string(), self.delete(key.as_ref())))
            .collect()
    }

    /// Add `|offset|` to the stored integer and return the new value.
    ///
    /// The stored value is coerced to an integer: floats are truncated,
    /// numeric strings are parsed, booleans count as 0 or 1, and anything else
    /// (or a missing key) counts as 0. This is a read followed by a write, not
    /// an atomic operation: concurrent callers can lose updates.
    fn increment(&self, key: &str, offset: i64, ttl: Option<i64>) -> Result<i64> {
        let value = current_count(self, key).saturating_add(offset.saturating_abs());
        store_count(self, key, value, ttl)
    }

    /// Subtract `|offset|` from the stored integer and return the new value.
    ///
    /// Same read-then-write semantics as [`Cache::increment`].
    fn decrement(&self, key: &str, offset: i64, ttl: Option<i64>) -> Result<i64> {
        let value = current_count(self, key).saturating_sub(offset.saturating_abs());
        store_count(self, key, value, ttl)
    }
}

/// Stored value as read by the counters
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCount {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl StoredCount {
    fn to_count(&self) -> i64 {
        match self {
            StoredCount::Int(value) => *value,
            // `as` saturates and maps NaN to 0
            StoredCount::Float(value) => value.trunc() as i64,
            StoredCount::Bool(value) => i64::from(*value),
            StoredCount::Text(text) => parse_count(text),
        }
    }
}

fn parse_count(text: &str) -> i64 {
    let text = text.trim();
    text.parse::<i64>()
        .or_else(|_| text.parse::<f64>().map(|value| value.trunc() as i64))
        .unwrap_or(0)
}

fn current_count<C: Cache + ?Sized>(cache: &C, key: &str) -> i64 {
    if cache.serializer().is_self_describing() {
        return cache
            .get::<StoredCount>(key)
            .map_or(0, |stored| stored.to_count());
    }

    // The native encoding cannot be probed for its type. An 8-byte payload
    // always reads as an integer, so a stored f64 comes back as its bits.
    cache
        .get::<i64>(key)
        .or_else(|| cache.get::<String>(key).map(|text| parse_count(&text)))
        .or_else(|| cache.get::<bool>(key).map(i64::from))
        .unwrap_or(0)
}

fn store_count<C: Cache + ?Sized>(cache: &C, key: &str, value: i64, ttl: Option<i64>) -> Result<i64> {
    if !cache.set(key, &value, ttl)? {
        tracing::debug!(key = %key, value, "counter value was not persisted");
    }
    Ok(value)
}
