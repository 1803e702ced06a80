//! Local key-value persistence
//!
//! Everything the admin core remembers lives in a flat string-to-string
//! store, the same shape a browser's local storage offers. Two backends are
//! provided:
//!
//! - [`MemoryStore`] - process-local, used by tests and throwaway sessions
//! - [`FileStore`] - a single JSON object on disk, written atomically
//!
//! The store is assumed to have a single writer. Two processes sharing one
//! store file will overwrite each other's updates; that setup is not
//! supported.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::StoreError;

/// Persisted key names
pub mod keys {
    /// Current admin password
    pub const ADMIN_PASSWORD: &str = "portfolio_admin_password";
    /// Failed login attempts since the last successful login
    pub const FAILED_ATTEMPTS: &str = "failed_login_attempts";
    /// Epoch milliseconds of the most recent failed login
    pub const LAST_FAILED_ATTEMPT: &str = "last_failed_login_attempt";
    /// Epoch milliseconds of the most recent password change
    pub const PASSWORD_LAST_CHANGED: &str = "password_last_changed";
}

/// One mutation inside a [`KeyValueStore::apply`] batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write<'a> {
    Set(&'a str, &'a str),
    Remove(&'a str),
}

impl Write<'_> {
    fn key(&self) -> &str {
        match self {
            Self::Set(key, _) | Self::Remove(key) => *key,
        }
    }
}

/// Synchronous string key-value storage
///
/// Methods take `&self` so one store can back several components through
/// shared handles (see the `Arc` impl below).
pub trait KeyValueStore {
    /// Read a value, `None` if the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Apply every write in `batch` or none of them
    fn apply(&self, batch: &[Write<'_>]) -> Result<(), StoreError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.apply(&[Write::Set(key, value)])
    }

    /// Delete a key; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.apply(&[Write::Remove(key)])
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn apply(&self, batch: &[Write<'_>]) -> Result<(), StoreError> {
        (**self).apply(batch)
    }
}

fn apply_to(entries: &mut BTreeMap<String, String>, batch: &[Write<'_>]) {
    for write in batch {
        match *write {
            Write::Set(key, value) => {
                entries.insert(key.to_string(), value.to_string());
            }
            Write::Remove(key) => {
                entries.remove(key);
            }
        }
    }
}

/// Read a key and parse it, reporting unparsable values as corrupt
pub(crate) fn get_parsed<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: KeyValueStore + ?Sized,
    T: FromStr,
{
    match store.get(key)? {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| StoreError::Corrupt {
                key: key.to_string(),
                value: raw,
            }),
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn apply(&self, batch: &[Write<'_>]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        apply_to(&mut entries, batch);
        Ok(())
    }
}

/// JSON-file store
///
/// The whole map is kept in memory and rewritten on every mutation.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// The file itself is only created by the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    /// One file rewrite per batch; on failure every touched key is restored
    fn apply(&self, batch: &[Write<'_>]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;

        let previous: Vec<(String, Option<String>)> = batch
            .iter()
            .map(|write| (write.key().to_string(), entries.get(write.key()).cloned()))
            .collect();
        apply_to(&mut entries, batch);

        if let Err(e) = self.persist(&entries) {
            // Keep memory in step with disk
            for (key, old) in previous {
                match old {
                    Some(old) => entries.insert(key, old),
                    None => entries.remove(&key),
                };
            }
            return Err(e);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

        store.set("k", "w").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("w"));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.remove("k").unwrap();
    }

    #[test]
    fn test_shared_handles_see_same_data() {
        let store = Arc::new(MemoryStore::new());
        let other = Arc::clone(&store);

        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            assert!(!path.exists());
            store.set(keys::FAILED_ATTEMPTS, "3").unwrap();
            assert!(path.exists());
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::FAILED_ATTEMPTS).unwrap().as_deref(),
            Some("3")
        );

        reopened.remove(keys::FAILED_ATTEMPTS).unwrap();
        let again = FileStore::open(&path).unwrap();
        assert_eq!(again.get(keys::FAILED_ATTEMPTS).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_store_batch() {
        let store = MemoryStore::new();
        store.set("gone", "x").unwrap();

        store
            .apply(&[Write::Set("a", "1"), Write::Set("b", "2"), Write::Remove("gone")])
            .unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
        assert_eq!(store.get("gone").unwrap(), None);
    }

    #[test]
    fn test_file_store_failed_batch_changes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        // A directory where the temp file goes makes the next write fail
        let blocker = path.with_extension("json.tmp");
        fs::create_dir(&blocker).unwrap();

        let result = store.apply(&[
            Write::Set("a", "changed"),
            Write::Remove("b"),
            Write::Set("c", "new"),
            Write::Set("a", "twice"),
        ]);
        assert!(matches!(result, Err(StoreError::Io(_))));

        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
        assert_eq!(store.get("c").unwrap(), None);

        fs::remove_dir(&blocker).unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
        assert_eq!(reopened.get("c").unwrap(), None);
    }

    #[test]
    fn test_limited_store_rejects_whole_batch() {
        let store = testing::LimitedStore::allowing(1);
        store.apply(&[Write::Set("a", "1"), Write::Set("b", "2")]).unwrap();

        assert!(store.apply(&[Write::Set("a", "3"), Write::Remove("b")]).is_err());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_get_parsed_reports_corrupt_values() {
        let store = MemoryStore::new();
        store.set("count", "seven").unwrap();

        let err = get_parsed::<_, u32>(&store, "count").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "count"));

        store.set("count", "7").unwrap();
        assert_eq!(get_parsed::<_, u32>(&store, "count").unwrap(), Some(7));
        assert_eq!(get_parsed::<_, u32>(&store, "missing").unwrap(), None);
    }
}
