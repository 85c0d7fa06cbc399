//! Cache trait implementation for FileStore

use filestash_core::{validate_default_ttl, Cache, Result, Serializer};
use serde::{de::DeserializeOwned, Serialize};

use super::types::FileStore;

impl Cache for FileStore {
    fn handler(&self) -> &'static str {
        "files"
    }

    fn serializer(&self) -> Serializer {
        self.serializer
    }

    fn prefix(&self) -> Option<&str> {
        self.keys.prefix()
    }

    fn default_ttl(&self) -> i64 {
        self.default_ttl
    }

    fn set_default_ttl(&mut self, ttl: i64) -> Result<()> {
        self.default_ttl = validate_default_ttl(ttl)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_value(key)
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<i64>) -> Result<bool> {
        self.set_value(key, value, ttl)
    }

    fn delete(&self, key: &str) -> bool {
        self.delete_file(&self.entry_path(key))
    }

    fn flush(&self) -> bool {
        self.flush_all()
    }
}
