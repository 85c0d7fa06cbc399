use super::*;
use filestash_core::Cache;

fn count_files(dir: &std::path::Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

fn assert_no_empty_dirs(dir: &std::path::Path) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            assert!(count_files(&path) > 0, "{} left empty", path.display());
            assert_no_empty_dirs(&path);
        }
    }
}

#[test]
fn test_gc_removes_only_stale_entries() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, Serializer::Cbor);

    store.set("live", "value", None).unwrap();
    let expired = write_expired(&store, "expired");
    let corrupt = write_raw(&store, "corrupt", b"garbage");

    assert!(store.gc());
    assert!(!expired.exists());
    assert!(!corrupt.exists());
    assert_no_empty_dirs(store.base_dir());
    assert_eq!(store.get::<String>("live").as_deref(), Some("value"));
}

#[test]
fn test_gc_keeps_entries_of_other_types() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, Serializer::Native);
    store.set("text", "value", None).unwrap();
    store.set("number", &7_i64, None).unwrap();

    assert!(store.gc());
    assert_eq!(count_files(store.base_dir()), 2);
}

#[test]
fn test_flush_empties_base_dir_but_skips_dotfiles() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, Serializer::Json);
    for i in 0..20 {
        store.set(&format!("key-{i}"), &i, None).unwrap();
    }
    fs::write(store.base_dir().join(".keep"), b"").unwrap();

    assert!(store.flush());
    let remaining: Vec<_> = fs::read_dir(store.base_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(remaining, vec![std::ffi::OsString::from(".keep")]);
    assert!(store.base_dir().is_dir());
}

#[test]
fn test_flush_on_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, Serializer::Native);
    assert!(store.flush());
    assert!(store.gc());
}

#[cfg(unix)]
#[test]
fn test_sweep_refuses_directories_outside_root() {
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("victim"), b"keep me").unwrap();

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, Serializer::Json);
    std::os::unix::fs::symlink(outside.path(), store.base_dir().join("escape")).unwrap();

    assert!(!store.flush());
    assert!(outside.path().join("victim").is_file());
}

#[cfg(unix)]
#[test]
fn test_flush_stops_on_undeletable_entry() {
    if running_as_root() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, Serializer::Json);
    store.set("k", "v", None).unwrap();
    let path = store.entry_path("k");
    let shard = path.parent().unwrap();
    chmod(shard, 0o555);

    let ok = store.flush();
    chmod(shard, 0o755);

    assert!(!ok);
    assert!(path.is_file());
}

#[cfg(unix)]
#[test]
fn test_gc_stops_on_undeletable_expired_entry() {
    if running_as_root() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, Serializer::Cbor);
    let path = write_expired(&store, "old");
    let shard = path.parent().unwrap();
    chmod(shard, 0o555);

    let ok = store.gc();
    chmod(shard, 0o755);

    assert!(!ok);
    assert!(path.is_file());
    assert!(store.gc());
    assert!(!path.exists());
}

#[cfg(unix)]
#[test]
fn test_gc_keeps_live_entries_in_read_only_shards() {
    if running_as_root() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, Serializer::Json);
    store.set("k", "v", None).unwrap();
    let shard = store.entry_path("k").parent().unwrap().to_path_buf();
    chmod(&shard, 0o555);

    let ok = store.gc();
    chmod(&shard, 0o755);

    assert!(ok);
    assert_eq!(store.get::<String>("k").as_deref(), Some("v"));
}
