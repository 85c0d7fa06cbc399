//! On-disk entry envelope
//!
//! Every cache file holds one serialized `{ expires_at, data }` record, where
//! `expires_at` is an absolute Unix timestamp in milliseconds. With
//! self-describing encodings `data` is the value itself. The native encoding
//! cannot skip a value without knowing its type, so there `data` holds the
//! value's own encoded bytes; that keeps the expiry readable by sweeps that do
//! not know what type was stored. It does not make the value itself typed:
//! decoding a native payload as another type of the same width succeeds.

use filestash_core::{Result, Serializer};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EntryRef<'a, T: ?Sized> {
    expires_at: i64,
    data: &'a T,
}

#[derive(Deserialize)]
struct Entry<T> {
    expires_at: i64,
    data: T,
}

/// Wrap a value with its expiry and encode it
pub fn seal<T: Serialize + ?Sized>(
    serializer: Serializer,
    value: &T,
    expires_at: i64,
) -> Result<Vec<u8>> {
    if serializer.is_self_describing() {
        return serializer.encode(&EntryRef {
            expires_at,
            data: value,
        });
    }

    let payload = serializer.encode(value)?;
    serializer.encode(&EntryRef {
        expires_at,
        data: &payload,
    })
}

/// Validate the envelope and return its expiry, without decoding the value
pub fn expires_at(serializer: Serializer, bytes: &[u8]) -> Result<i64> {
    if serializer.is_self_describing() {
        serializer
            .decode::<Entry<IgnoredAny>>(bytes)
            .map(|entry| entry.expires_at)
    } else {
        serializer
            .decode::<Entry<Vec<u8>>>(bytes)
            .map(|entry| entry.expires_at)
    }
}

/// Decode the wrapped value
pub fn open<T: DeserializeOwned>(serializer: Serializer, bytes: &[u8]) -> Result<T> {
    if serializer.is_self_describing() {
        serializer.decode::<Entry<T>>(bytes).map(|entry| entry.data)
    } else {
        let entry: Entry<Vec<u8>> = serializer.decode(bytes)?;
        serializer.decode(&entry.data)
    }
}
