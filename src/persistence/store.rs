//! Key/value backends for save blobs

use std::collections::HashMap;

use crate::error::PersistError;

/// Where save blobs live. Keys are short identifiers like `"slot1"`.
pub trait SaveStore {
    /// `Ok(None)` when nothing is stored under `key`
    fn read(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

/// Keys become file names and storage keys; keep them plain
fn check_key(key: &str) -> Result<(), PersistError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(PersistError::Storage(format!("invalid save key {key:?}")))
    }
}

/// In-process store for tests and headless hosts
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        check_key(key)?;
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
        check_key(key)?;
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        check_key(key)?;
        self.blobs.remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::io::ErrorKind;
    use std::path::PathBuf;

    use super::{SaveStore, check_key};
    use crate::error::PersistError;

    /// One `<key>.json` file per save under a directory.
    ///
    /// Writes go to `<key>.json.tmp` first and are renamed over the target,
    /// so a crash mid-write leaves the previous save intact.
    #[derive(Debug, Clone)]
    pub struct FileStore {
        dir: PathBuf,
    }

    impl FileStore {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        fn path(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl SaveStore for FileStore {
        fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
            check_key(key)?;
            match std::fs::read_to_string(self.path(key)) {
                Ok(blob) => Ok(Some(blob)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
            check_key(key)?;
            std::fs::create_dir_all(&self.dir)?;
            let target = self.path(key);
            let tmp = target.with_extension("json.tmp");
            std::fs::write(&tmp, blob)?;
            std::fs::rename(&tmp, &target)?;
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), PersistError> {
            check_key(key)?;
            match std::fs::remove_file(self.path(key)) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{SaveStore, check_key};
    use crate::error::PersistError;

    /// Browser LocalStorage, keys namespaced with a prefix
    #[derive(Debug, Clone)]
    pub struct LocalStorageStore {
        prefix: String,
    }

    impl LocalStorageStore {
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
            }
        }

        fn storage(&self) -> Result<web_sys::Storage, PersistError> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or_else(|| PersistError::Storage("LocalStorage unavailable".to_string()))
        }

        fn full_key(&self, key: &str) -> String {
            format!("{}_{}", self.prefix, key)
        }
    }

    impl SaveStore for LocalStorageStore {
        fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
            check_key(key)?;
            self.storage()?
                .get_item(&self.full_key(key))
                .map_err(|e| PersistError::Storage(format!("{e:?}")))
        }

        fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
            check_key(key)?;
            self.storage()?
                .set_item(&self.full_key(key), blob)
                .map_err(|e| PersistError::Storage(format!("{e:?}")))
        }

        fn remove(&mut self, key: &str) -> Result<(), PersistError> {
            check_key(key)?;
            self.storage()?
                .remove_item(&self.full_key(key))
                .map_err(|e| PersistError::Storage(format!("{e:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.read("slot1").unwrap(), None);
        store.write("slot1", "{}").unwrap();
        assert_eq!(store.read("slot1").unwrap().as_deref(), Some("{}"));
        store.remove("slot1").unwrap();
        assert_eq!(store.read("slot1").unwrap(), None);
    }

    #[test]
    fn test_bad_keys_refused() {
        let mut store = MemoryStore::new();
        assert!(matches!(store.write("../etc", "x"), Err(PersistError::Storage(_))));
        assert!(matches!(store.read(""), Err(PersistError::Storage(_))));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("arcade-core-test-{}", std::process::id()));
        let mut store = FileStore::new(&dir);
        assert_eq!(store.read("run").unwrap(), None);
        store.write("run", "first").unwrap();
        store.write("run", "second").unwrap();
        assert_eq!(store.read("run").unwrap().as_deref(), Some("second"));
        store.remove("run").unwrap();
        store.remove("run").unwrap();
        assert_eq!(store.read("run").unwrap(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
