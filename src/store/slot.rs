//! The single local key-value slot the store persists into.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on slot '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid journal entry: {0}")]
    InvalidEntry(String),
    #[error("Slot '{0}' rejected the write")]
    WriteRejected(String),
}

/// A named slot holding one serialized document.
pub trait StorageSlot: Send {
    /// Name of the slot.
    fn key(&self) -> &str;

    /// Read the slot contents; `None` when nothing has been written yet.
    fn read(&self) -> Result<Option<String>, StoreError>;

    /// Replace the slot contents.
    fn write(&mut self, contents: &str) -> Result<(), StoreError>;

    /// Remove the slot contents.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Slot backed by a JSON file `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    key: String,
    path: PathBuf,
}

impl FileSlot {
    /// Create a slot named `key` inside `dir`. Nothing touches the disk until
    /// the first write.
    pub fn new(dir: impl AsRef<Path>, key: impl Into<String>) -> Self {
        let key = key.into();
        let path = dir.as_ref().join(format!("{key}.json"));
        Self { key, path }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: self.key.clone(),
            source,
        }
    }
}

impl StorageSlot for FileSlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write beside the target and rename so a crash never leaves half a document.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory slot. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    key: String,
    contents: Arc<Mutex<Option<String>>>,
    reject_writes: Arc<Mutex<bool>>,
}

impl MemorySlot {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Create a slot pre-filled with `contents`.
    pub fn with_contents(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let slot = Self::new(key);
        *lock(&slot.contents) = Some(contents.into());
        slot
    }

    /// Current raw contents.
    pub fn contents(&self) -> Option<String> {
        lock(&self.contents).clone()
    }

    /// Make subsequent writes fail (simulates a full or locked storage area).
    pub fn set_reject_writes(&self, reject: bool) {
        *lock(&self.reject_writes) = reject;
    }
}

impl StorageSlot for MemorySlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.contents())
    }

    fn write(&mut self, contents: &str) -> Result<(), StoreError> {
        if *lock(&self.reject_writes) {
            return Err(StoreError::WriteRejected(self.key.clone()));
        }
        *lock(&self.contents) = Some(contents.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        *lock(&self.contents) = None;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut slot = FileSlot::new(dir.path(), "sakina-store");

        assert_eq!(slot.read().unwrap(), None);
        slot.write("{\"a\":1}").unwrap();
        assert!(slot.path().ends_with("sakina-store.json"));
        assert_eq!(slot.read().unwrap().as_deref(), Some("{\"a\":1}"));

        slot.clear().unwrap();
        assert_eq!(slot.read().unwrap(), None);
        // Clearing twice is fine
        slot.clear().unwrap();
    }

    #[test]
    fn test_file_slot_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut slot = FileSlot::new(dir.path().join("nested").join("data"), "slot");
        slot.write("[]").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_slot_shared_between_clones() {
        let slot = MemorySlot::new("k");
        let mut writer = slot.clone();
        writer.write("hello").unwrap();
        assert_eq!(slot.contents().as_deref(), Some("hello"));

        slot.set_reject_writes(true);
        assert!(matches!(
            writer.write("again"),
            Err(StoreError::WriteRejected(_))
        ));
        assert_eq!(slot.contents().as_deref(), Some("hello"));
    }
}
