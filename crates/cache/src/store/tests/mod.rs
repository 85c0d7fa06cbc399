use super::operations::now_millis;
use super::FileStore;
use crate::config::FileStoreConfig;
use crate::entry;
use filestash_core::Serializer;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

mod cleanup;

fn store_in(dir: &TempDir, serializer: Serializer) -> FileStore {
    FileStore::new(
        FileStoreConfig::builder()
            .directory(dir.path())
            .serializer(serializer)
            .build(),
    )
    .unwrap()
}

fn write_raw(store: &FileStore, key: &str, bytes: &[u8]) -> PathBuf {
    let path = store.entry_path(key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, bytes).unwrap();
    path
}

fn write_expired(store: &FileStore, key: &str) -> PathBuf {
    let bytes = entry::seal(store.serializer, "stale", now_millis() - 1_000).unwrap();
    write_raw(store, key, &bytes)
}

/// Permission-based failures cannot be provoked as root
#[cfg(unix)]
fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(unix)]
fn chmod(path: &std::path::Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}
