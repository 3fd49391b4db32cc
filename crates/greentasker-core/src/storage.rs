use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error("storage i/o failed for key {key}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("value stored under {key} is not valid UTF-8")]
    Utf8 {
        key: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("failed decoding value stored under {key}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed encoding value for {key}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// True when a value was read but could not be understood.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Utf8 { .. } | Self::Decode { .. })
    }
}

/// String key-value storage, shaped like browser local/session storage.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory. Writes are atomic.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[tracing::instrument(skip(dir))]
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        info!(dir = %dir.display(), "opened file store");
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    #[tracing::instrument(skip(self))]
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(file = %path.display(), bytes = bytes.len(), "loaded key");
                String::from_utf8(bytes)
                    .map(Some)
                    .map_err(|source| StoreError::Utf8 {
                        key: key.to_string(),
                        source,
                    })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    #[tracing::instrument(skip(self, value))]
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        debug!(file = %path.display(), bytes = value.len(), "saving key atomically");

        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        temp.write_all(value.as_bytes()).map_err(io_err)?;
        temp.flush().map_err(io_err)?;
        temp.persist(&path).map_err(|err| io_err(err.error))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.load(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })
}

pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.save(key, &json)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn memory_store_overwrites_and_removes() {
        let mut store = MemoryStore::new();
        store.save("k", "one").expect("save");
        store.save("k", "two").expect("overwrite");
        assert_eq!(store.load("k").expect("load").as_deref(), Some("two"));

        store.remove("k").expect("remove");
        store.remove("k").expect("remove missing key");
        assert_eq!(store.load("k").expect("load"), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let temp = tempdir().expect("tempdir");
        {
            let mut store = FileStore::open(temp.path()).expect("open");
            store.save("greentasker-theme", "dark").expect("save");
        }
        let store = FileStore::open(temp.path()).expect("reopen");
        assert_eq!(
            store.load("greentasker-theme").expect("load").as_deref(),
            Some("dark")
        );
        assert_eq!(store.load("missing").expect("load missing"), None);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let temp = tempdir().expect("tempdir");
        let mut store = FileStore::open(temp.path()).expect("open");
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                store.save(key, "x"),
                Err(StoreError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn file_store_reports_non_utf8_values() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("greentasker-todos"), [0xff, 0xfe, b'[', b']'])
            .expect("seed");
        let store = FileStore::open(temp.path()).expect("open");
        let err = store.load("greentasker-todos").expect_err("bad utf-8");
        assert!(err.is_malformed());
        assert!(matches!(err, StoreError::Utf8 { .. }));
    }

    #[test]
    fn load_json_reports_malformed_values() {
        let store = MemoryStore::new().with_entry("list", "[{not json");
        let result = load_json::<Vec<u32>, _>(&store, "list");
        assert!(matches!(result, Err(StoreError::Decode { .. })));
    }

    #[test]
    fn save_json_then_load_json() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "nums", &[3_u32, 1, 2]).expect("save");
        let loaded: Option<Vec<u32>> = load_json(&store, "nums").expect("load");
        assert_eq!(loaded, Some(vec![3, 1, 2]));
    }
}
