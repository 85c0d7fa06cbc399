//! FileStore configuration with precedence and validation
use filestash_core::{Error, Result, Serializer, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables read by [`FileStoreConfigLoader`]
pub const ENV_DIRECTORY: &str = "FILESTASH_DIRECTORY";
pub const ENV_PREFIX: &str = "FILESTASH_PREFIX";
pub const ENV_GC: &str = "FILESTASH_GC";
pub const ENV_DEFAULT_TTL: &str = "FILESTASH_DEFAULT_TTL";
pub const ENV_FILES_PERMISSION: &str = "FILESTASH_FILES_PERMISSION";
pub const ENV_SERIALIZER: &str = "FILESTASH_SERIALIZER";

const ENV_VARS: [&str; 6] = [
    ENV_DIRECTORY,
    ENV_PREFIX,
    ENV_GC,
    ENV_DEFAULT_TTL,
    ENV_FILES_PERMISSION,
    ENV_SERIALIZER,
];

/// Options accepted by [`crate::FileStore::new`]
///
/// Values are validated when the store is built, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Root directory; must already exist. Falls back to a `filestash`
    /// directory under the platform temp directory.
    pub directory: Option<PathBuf>,
    /// Mode applied to newly created entry files
    #[serde(with = "octal_mode")]
    pub files_permission: u32,
    /// Percentage chance, `1..=100`, of a GC sweep when a store is dropped
    pub gc: i64,
    /// TTL in seconds for writes that do not carry one
    pub default_ttl: i64,
    /// Key namespace, also used as a subdirectory of `directory`
    pub prefix: Option<String>,
    /// Serializer name: `native`, `cbor`, `json` or `json-array`
    pub serializer: String,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            directory: None,
            files_permission: 0o644,
            gc: 1,
            default_ttl: DEFAULT_TTL,
            prefix: None,
            serializer: Serializer::default().as_str().to_string(),
        }
    }
}

impl FileStoreConfig {
    pub fn builder() -> FileStoreConfigBuilder {
        FileStoreConfigBuilder::new()
    }

    /// Parse a JSON configuration document; missing fields keep their defaults
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variables
    EnvironmentVariable(String),
}

/// Builder for creating store configurations
#[derive(Debug, Default)]
pub struct FileStoreConfigBuilder {
    config: FileStoreConfig,
}

impl FileStoreConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.directory = Some(directory.into());
        self
    }

    pub fn files_permission(mut self, mode: u32) -> Self {
        self.config.files_permission = mode;
        self
    }

    pub fn gc(mut self, gc: i64) -> Self {
        self.config.gc = gc;
        self
    }

    pub fn default_ttl(mut self, ttl: i64) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = Some(prefix.into());
        self
    }

    pub fn serializer(mut self, serializer: Serializer) -> Self {
        self.config.serializer = serializer.as_str().to_string();
        self
    }

    /// Set the serializer by name, validated when the store is built
    pub fn serializer_name(mut self, name: impl Into<String>) -> Self {
        self.config.serializer = name.into();
        self
    }

    pub fn build(self) -> FileStoreConfig {
        self.config
    }
}

/// Loaded configuration along with where its last layer came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: FileStoreConfig,
    pub source: ConfigSource,
}

/// Configuration loader that handles precedence: defaults, then an optional
/// JSON file, then `FILESTASH_*` environment variables
pub struct FileStoreConfigLoader;

impl FileStoreConfigLoader {
    /// Load configuration with full precedence handling
    pub fn load(config_file: Option<&Path>) -> Result<LoadedConfig> {
        let mut loaded = LoadedConfig {
            config: FileStoreConfig::default(),
            source: ConfigSource::Default,
        };

        if let Some(path) = config_file {
            loaded = LoadedConfig {
                config: Self::load_from_file(path)?,
                source: ConfigSource::ConfigFile(path.to_path_buf()),
            };
        }

        if Self::apply_env(&mut loaded.config)? {
            loaded.source = ConfigSource::EnvironmentVariable("FILESTASH_*".to_string());
        }

        Ok(loaded)
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<FileStoreConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read config file", e))?;
        serde_json::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "invalid JSON configuration in {}: {e}",
                path.display()
            ))
        })
    }

    /// Override values from environment variables.
    ///
    /// Returns whether any variable was set.
    pub fn apply_env(config: &mut FileStoreConfig) -> Result<bool> {
        let mut has_env_config = false;

        if let Some(directory) = env_var(ENV_DIRECTORY) {
            config.directory = Some(PathBuf::from(directory));
            has_env_config = true;
        }

        if let Some(prefix) = env_var(ENV_PREFIX) {
            config.prefix = Some(prefix);
            has_env_config = true;
        }

        if let Some(gc) = env_var(ENV_GC) {
            config.gc = parse_number(ENV_GC, &gc)?;
            has_env_config = true;
        }

        if let Some(ttl) = env_var(ENV_DEFAULT_TTL) {
            config.default_ttl = parse_number(ENV_DEFAULT_TTL, &ttl)?;
            has_env_config = true;
        }

        if let Some(mode) = env_var(ENV_FILES_PERMISSION) {
            config.files_permission = parse_octal(&mode).map_err(|message| {
                Error::configuration(format!("{ENV_FILES_PERMISSION}: {message}"))
            })?;
            has_env_config = true;
        }

        if let Some(serializer) = env_var(ENV_SERIALIZER) {
            config.serializer = serializer;
            has_env_config = true;
        }

        Ok(has_env_config)
    }

    /// Names of every environment variable the loader reads
    pub fn env_vars() -> &'static [&'static str] {
        &ENV_VARS
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_number(name: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::configuration(format!("{name}: expected an integer, got '{value}'")))
}

/// Parse a file mode written in octal, with or without a `0o` or `0` prefix
pub fn parse_octal(value: &str) -> std::result::Result<u32, String> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    match u32::from_str_radix(digits, 8) {
        Ok(mode) if mode <= 0o7777 => Ok(mode),
        _ => Err(format!("invalid octal file mode '{value}'")),
    }
}

// Modes are written as octal strings ("0644") and read from either an octal
// string or a plain integer.
mod octal_mode {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    pub fn serialize<S: Serializer>(mode: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{mode:04o}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(mode) => Ok(mode),
            Raw::Text(text) => super::parse_octal(&text).map_err(D::Error::custom),
        }
    }
}
