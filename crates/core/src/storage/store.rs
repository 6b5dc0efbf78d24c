use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::CoreError;

/// Durable key-value state, the tracker's stand-in for browser local storage.
///
/// Synchronous on purpose: reads happen on the render path and must never
/// wait on the network.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. An absent key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError>;

    /// Write a value, replacing any previous one.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), CoreError>;

    /// Delete a value. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), CoreError>;

    fn contains(&self, key: &str) -> Result<bool, CoreError> {
        Ok(self.get(key)?.is_some())
    }
}

/// In-process store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), CoreError> {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(key);
        Ok(())
    }
}

/// Store backed by a directory, one file per key.
///
/// Failing to create the directory is `CoreError::FileIO`; failing to read,
/// write or remove a key is `CoreError::Storage` naming the key.
///
/// Key characters outside `[A-Za-z0-9._-]` (and a leading `.`) are written
/// as `%XX` so any key maps to a single, safe file name.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, CoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the value for `key` lives at.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(escape_key(key))
    }
}

fn escape_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for (i, b) in key.bytes().enumerate() {
        let safe = b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || (b == b'.' && i > 0);
        if safe {
            name.push(b as char);
        } else {
            name.push_str(&format!("%{b:02X}"));
        }
    }
    if name.is_empty() {
        name.push('%');
    }
    name
}

fn storage_error(action: &str, key: &str, e: std::io::Error) -> CoreError {
    CoreError::Storage(format!("could not {action} \"{key}\": {e}"))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", key, e)),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), CoreError> {
        let path = self.path_for(key);
        // Write-then-rename: readers never see a partial value.
        let mut tmp = path.clone().into_os_string();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, value).map_err(|e| storage_error("write", key, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(storage_error("write", key, e));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", key, e)),
        }
    }
}
