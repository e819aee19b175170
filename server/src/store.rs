//! Key-value storage behind the scoreboard
//!
//! The service only needs a tiny surface: string get/set, an integer
//! increment and a compare-and-set used to make read-modify-write cycles
//! safe under concurrent submissions for the same context.

use crate::error::StoreError;
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Adds `delta` to the integer at `key` (absent counts as 0) and returns
    /// the new value.
    fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError>;

    /// Writes `new` only if the current value equals `expected`
    /// (`None` meaning absent). Returns whether the write happened.
    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError>;
}

fn incr_entry(
    entries: &mut HashMap<String, String>,
    key: &str,
    delta: i64,
) -> Result<i64, StoreError> {
    let current = match entries.get(key) {
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| StoreError::NotAnInteger {
            key: key.to_string(),
        })?,
        None => 0,
    };
    let next = current.saturating_add(delta);
    entries.insert(key.to_string(), next.to_string());
    Ok(next)
}

fn cas_entry(
    entries: &mut HashMap<String, String>,
    key: &str,
    expected: Option<&str>,
    new: &str,
) -> bool {
    if entries.get(key).map(String::as_str) != expected {
        return false;
    }
    entries.insert(key.to_string(), new.to_string());
    true
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let mut entries = self.lock()?;
        incr_entry(&mut entries, key, delta)
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        Ok(cas_entry(&mut entries, key, expected, new))
    }
}

/// Store that snapshots every mutation to a single file.
///
/// The snapshot is written to a sibling temp file and renamed over the
/// previous one, so a crash mid-write leaves the last good snapshot behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let bytes = fs::read(&path)?;
            let entries: HashMap<String, String> = bincode::deserialize(&bytes)?;
            info!("Loaded {} keys from {}", entries.len(), path.display());
            entries
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            info!("Starting empty store at {}", path.display());
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let bytes = bincode::serialize(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Persisted {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// Applies `mutate` to a copy of the entries. The copy replaces the live
    /// map only after it has been written, so a failed write changes nothing.
    fn update<T>(
        &self,
        mutate: impl FnOnce(&mut HashMap<String, String>) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let mut entries = self.lock()?;
        let mut next = entries.clone();
        let (result, changed) = mutate(&mut next)?;
        if changed {
            self.persist(&next)?;
            *entries = next;
        }
        Ok(result)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            Ok(((), true))
        })
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        self.update(|entries| incr_entry(entries, key, delta).map(|next| (next, true)))
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError> {
        self.update(|entries| {
            let written = cas_entry(entries, key, expected, new);
            Ok((written, written))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_memory_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));

        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_memory_incr() {
        let store = MemoryStore::new();
        assert_eq!(store.incr_by("plays", 1).unwrap(), 1);
        assert_eq!(store.incr_by("plays", 4).unwrap(), 5);
        assert_eq!(store.incr_by("plays", -2).unwrap(), 3);

        store.set("name", "ada").unwrap();
        assert!(matches!(
            store.incr_by("name", 1),
            Err(StoreError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn test_memory_compare_and_set() {
        let store = MemoryStore::new();

        assert!(store.compare_and_set("k", None, "1").unwrap());
        assert!(!store.compare_and_set("k", None, "2").unwrap());
        assert!(!store.compare_and_set("k", Some("0"), "2").unwrap());
        assert!(store.compare_and_set("k", Some("1"), "2").unwrap());
        assert_eq!(store.get("k").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_concurrent_incr_loses_nothing() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.incr_by("hits", 1).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("hits").unwrap(), Some("800".to_string()));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.bin");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("post:high_score", "15").unwrap();
            assert!(store.compare_and_set("post:comments", None, "[]").unwrap());
            assert_eq!(store.incr_by("post:plays", 3).unwrap(), 3);
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.get("post:high_score").unwrap(), Some("15".to_string()));
        assert_eq!(store.get("post:comments").unwrap(), Some("[]".to_string()));
        assert_eq!(store.get("post:plays").unwrap(), Some("3".to_string()));
    }

    #[test]
    fn test_file_store_failed_cas_leaves_no_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.bin");

        let store = FileStore::open(&path).unwrap();
        assert!(!store.compare_and_set("k", Some("x"), "y").unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_failed_write_changes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.bin");
        let store = FileStore::open(&path).unwrap();
        store.set("post:plays", "1").unwrap();

        // A directory where the snapshot goes makes the final rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), b"x").unwrap();

        assert!(matches!(
            store.compare_and_set("post:high_score", None, "99"),
            Err(StoreError::Io(_))
        ));
        assert_eq!(store.get("post:high_score").unwrap(), None);

        assert!(store.set("post:plays", "5").is_err());
        assert!(store.incr_by("post:plays", 1).is_err());
        assert_eq!(store.get("post:plays").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_file_store_rejects_garbage_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.bin");
        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();

        assert!(matches!(FileStore::open(&path), Err(StoreError::Codec(_))));
    }
}
