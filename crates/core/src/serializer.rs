//! Value encodings selectable per cache instance

use crate::errors::{Error, Result};
use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy used to turn cached values into bytes and back
///
/// All variants are stateless; picking one is a per-instance decision made
/// at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Serializer {
    /// Rust-native binary encoding (bincode, fixed-width integers).
    ///
    /// Payloads carry no type tags, so values of the same width decode as
    /// each other: an `f64` read back as `i64` yields its raw bits.
    #[default]
    Native,
    /// Compact cross-language binary encoding (CBOR)
    Cbor,
    /// JSON, objects decoded into the caller's target type
    Json,
    /// JSON, objects decoded as associative maps by callers that ask for one
    JsonArray,
}

impl Serializer {
    /// All supported serializers
    pub const ALL: [Serializer; 4] = [
        Serializer::Native,
        Serializer::Cbor,
        Serializer::Json,
        Serializer::JsonArray,
    ];

    /// Configuration name of this serializer
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Serializer::Native => "native",
            Serializer::Cbor => "cbor",
            Serializer::Json => "json",
            Serializer::JsonArray => "json-array",
        }
    }

    /// Whether payloads carry their own type information.
    ///
    /// Self-describing payloads can be skipped without knowing the value
    /// type; the native encoding cannot.
    #[must_use]
    pub const fn is_self_describing(&self) -> bool {
        !matches!(self, Serializer::Native)
    }

    /// Encode a value
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Serializer::Native => bincode_options()
                .serialize(value)
                .map_err(|e| Error::encode(self.as_str(), e)),
            Serializer::Cbor => {
                let mut buffer = Vec::new();
                ciborium::ser::into_writer(value, &mut buffer)
                    .map_err(|e| Error::encode(self.as_str(), e))?;
                Ok(buffer)
            }
            Serializer::Json | Serializer::JsonArray => {
                serde_json::to_vec(value).map_err(|e| Error::encode(self.as_str(), e))
            }
        }
    }

    /// Decode a value
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Serializer::Native => bincode_options()
                .deserialize(bytes)
                .map_err(|e| Error::decode(self.as_str(), e)),
            Serializer::Cbor => {
                ciborium::de::from_reader(bytes).map_err(|e| Error::decode(self.as_str(), e))
            }
            Serializer::Json | Serializer::JsonArray => {
                serde_json::from_slice(bytes).map_err(|e| Error::decode(self.as_str(), e))
            }
        }
    }
}

// Trailing bytes are rejected so a payload of one type never decodes as a
// prefix of another.
fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

impl fmt::Display for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Serializer {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "native" | "bincode" => Ok(Serializer::Native),
            "cbor" => Ok(Serializer::Cbor),
            "json" => Ok(Serializer::Json),
            "json-array" => Ok(Serializer::JsonArray),
            other => Err(Error::UnknownSerializer {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_names() {
        for serializer in Serializer::ALL {
            assert_eq!(serializer.as_str().parse::<Serializer>().unwrap(), serializer);
        }
        assert_eq!("bincode".parse::<Serializer>().unwrap(), Serializer::Native);

        let err = "foo".parse::<Serializer>().unwrap_err();
        assert!(matches!(err, Error::UnknownSerializer { ref name } if name == "foo"));
    }

    #[test]
    fn test_falsy_values_survive_every_encoding() {
        for serializer in Serializer::ALL {
            let bytes = serializer.encode(&false).unwrap();
            assert!(!serializer.decode::<bool>(&bytes).unwrap());

            let bytes = serializer.encode(&Option::<String>::None).unwrap();
            assert_eq!(serializer.decode::<Option<String>>(&bytes).unwrap(), None);

            let bytes = serializer.encode(&0_i64).unwrap();
            assert_eq!(serializer.decode::<i64>(&bytes).unwrap(), 0);
        }
    }

    #[test]
    fn test_json_variants_decode_maps() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1_i64);
        for serializer in [Serializer::Json, Serializer::JsonArray] {
            let bytes = serializer.encode(&map).unwrap();
            assert_eq!(bytes, br#"{"a":1}"#);
            let value: serde_json::Value = serializer.decode(&bytes).unwrap();
            assert_eq!(value["a"], 1);
        }
    }

    #[test]
    fn test_native_rejects_type_confusion() {
        let bytes = Serializer::Native.encode("bar").unwrap();
        assert!(Serializer::Native.decode::<i64>(&bytes).is_err());
        assert!(Serializer::Native.decode::<bool>(&[]).is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        for serializer in [Serializer::Cbor, Serializer::Json, Serializer::JsonArray] {
            assert!(serializer.decode::<String>(b"").is_err());
        }
        assert!(Serializer::Json.decode::<i64>(b"not json").is_err());
    }
}
