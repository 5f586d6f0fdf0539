//! Durable marker for the one in-flight question.
//!
//! A single key, persisted outside memory so a restarted session can resume
//! polling. The reader enforces the staleness window.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use inference_common::{PendingQuestion, Result};

pub trait PendingStore: Send + Sync {
    fn load(&self) -> Result<Option<PendingQuestion>>;
    fn save(&self, pending: &PendingQuestion) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed store holding the marker as a small JSON document.
pub struct FilePendingStore {
    path: PathBuf,
}

impl FilePendingStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PendingStore for FilePendingStore {
    fn load(&self) -> Result<Option<PendingQuestion>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, pending: &PendingQuestion) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(pending)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory store for tests and push-less embedding.
#[derive(Default)]
pub struct MemoryPendingStore {
    slot: Mutex<Option<PendingQuestion>>,
}

impl PendingStore for MemoryPendingStore {
    fn load(&self) -> Result<Option<PendingQuestion>> {
        Ok(self.slot.lock().expect("pending slot poisoned").clone())
    }

    fn save(&self, pending: &PendingQuestion) -> Result<()> {
        *self.slot.lock().expect("pending slot poisoned") = Some(pending.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().expect("pending slot poisoned") = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePendingStore::new(dir.path().join("pending_question.json"));

        assert!(store.load().unwrap().is_none());

        let pending = PendingQuestion::new("what was revenue guidance?");
        store.save(&pending).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.id, pending.id);
        assert_eq!(loaded.question, pending.question);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePendingStore::new(dir.path().join("pending_question.json"));
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePendingStore::new(dir.path().join("nested/state/pending.json"));
        store.save(&PendingQuestion::new("q")).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_memory_store_holds_one_marker() {
        let store = MemoryPendingStore::default();
        let first = PendingQuestion::new("first");
        let second = PendingQuestion::new("second");
        store.save(&first).unwrap();
        store.save(&second).unwrap();
        assert_eq!(store.load().unwrap().unwrap().id, second.id);
    }
}
