//! Key hashing and sharded entry paths

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Hash a rendered key into 64 lowercase hex characters
pub fn hash_key(rendered: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rendered.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Two-level sharded path for a key hash: `base/h0/h1/hash`
pub fn entry_path(base_dir: &Path, hash: &str) -> PathBuf {
    base_dir.join(&hash[..1]).join(&hash[1..2]).join(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_hash() {
        assert_eq!(
            hash_key("foo"),
            "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae"
        );
        assert_eq!(
            entry_path(Path::new("/cache"), &hash_key("foo")),
            PathBuf::from(
                "/cache/2/c/2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae"
            )
        );
    }

    proptest! {
        #[test]
        fn prop_hash_is_fixed_width_hex(key in ".*") {
            let hash = hash_key(&key);
            prop_assert_eq!(hash.len(), 64);
            prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }

        #[test]
        fn prop_path_stays_under_base(key in ".*") {
            let base = Path::new("/cache/base");
            let hash = hash_key(&key);
            let path = entry_path(base, &hash);

            prop_assert!(path.starts_with(base));
            let relative: Vec<_> = path
                .strip_prefix(base)
                .unwrap()
                .iter()
                .map(|c| c.to_string_lossy().into_owned())
                .collect();
            prop_assert_eq!(relative.len(), 3);
            prop_assert_eq!(&relative[0], &hash[..1]);
            prop_assert_eq!(&relative[1], &hash[1..2]);
            prop_assert_eq!(&relative[2], &hash);
        }
    }
}
