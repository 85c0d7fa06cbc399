use std::path::PathBuf;

/// Result type alias for filestash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for filestash operations
///
/// Only construction-time validation and hard write failures surface as
/// errors. Lookups, deletes and sweeps report through `Option`/`bool` and log
/// their diagnostics instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The configured cache directory does not resolve
    #[error("Invalid cache directory: {}", .path.display())]
    InvalidDirectory { path: PathBuf },

    /// The base directory (root plus prefix) is not a directory
    #[error("Invalid cache directory path: {}", .path.display())]
    InvalidDirectoryPath { path: PathBuf },

    /// The base directory cannot be written to
    #[error("Cache directory is not writable: {}", .path.display())]
    DirectoryNotWritable {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// GC probability outside of `1..=100`
    #[error("Invalid cache GC: {value}")]
    InvalidGc { value: i64 },

    /// Default TTL must be strictly positive
    #[error("Default TTL must be greater than 0. {value} given")]
    InvalidTtl { value: i64 },

    /// Unknown serializer name
    #[error("unknown serializer '{name}' (expected one of: native, cbor, json, json-array)")]
    UnknownSerializer { name: String },

    /// Encoding or decoding of a value failed
    #[error("failed to {operation} value with {serializer} serializer: {message}")]
    Serialization {
        serializer: &'static str,
        operation: SerializationOp,
        message: String,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{}': {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Direction of a failed serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Encode,
    Decode,
}

impl std::fmt::Display for SerializationOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationOp::Encode => f.write_str("encode"),
            SerializationOp::Decode => f.write_str("decode"),
        }
    }
}

/// How a caller can react to an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Fix the configuration; retrying will not help
    UpdateConfiguration,
    /// Check permissions on the given path
    CheckPermissions { path: PathBuf },
    /// The value itself cannot be encoded
    FixValue,
    /// Transient failure, the operation may succeed later
    Retry,
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create an encoding error for the named serializer
    #[must_use]
    pub fn encode(serializer: &'static str, message: impl std::fmt::Display) -> Self {
        Error::Serialization {
            serializer,
            operation: SerializationOp::Encode,
            message: message.to_string(),
        }
    }

    /// Create a decoding error for the named serializer
    #[must_use]
    pub fn decode(serializer: &'static str, message: impl std::fmt::Display) -> Self {
        Error::Serialization {
            serializer,
            operation: SerializationOp::Decode,
            message: message.to_string(),
        }
    }

    /// Get the recovery hint for this error
    #[must_use]
    pub fn recovery_hint(&self) -> RecoveryHint {
        match self {
            Error::Configuration { .. }
            | Error::InvalidDirectory { .. }
            | Error::InvalidDirectoryPath { .. }
            | Error::InvalidGc { .. }
            | Error::InvalidTtl { .. }
            | Error::UnknownSerializer { .. } => RecoveryHint::UpdateConfiguration,
            Error::DirectoryNotWritable { path, .. } => {
                RecoveryHint::CheckPermissions { path: path.clone() }
            }
            Error::Serialization { .. } => RecoveryHint::FixValue,
            Error::FileSystem { path, source, .. } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    RecoveryHint::CheckPermissions { path: path.clone() }
                }
                _ => RecoveryHint::Retry,
            },
        }
    }

    /// Check if this error was raised while validating configuration
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::UpdateConfiguration)
            || matches!(self, Error::DirectoryNotWritable { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Configuration {
            message: format!("invalid JSON configuration: {error}"),
        }
    }
}
