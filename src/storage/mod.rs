//! Persistence adapter for the store state.
//!
//! The engine talks to storage only through [`StateStore`]: get the whole
//! state, put the whole state. The durable implementation keeps one JSON
//! file so persisted state round-trips exactly (`get` after `put` yields an
//! equal value). [`MemoryStore`] backs tests.

use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use crate::models::StoreState;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("state file io: {0}")]
    Io(#[from] std::io::Error),

    #[error("state encoding: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("could not determine a data directory for the state file")]
    NoDataDir,
}

/// Get/put port the engine persists through.
pub trait StateStore: Send + Sync {
    /// Load the persisted state, or `None` if nothing has been saved yet.
    fn get(&self) -> Result<Option<StoreState>, StorageError>;

    /// Replace the persisted state.
    fn put(&self, state: &StoreState) -> Result<(), StorageError>;
}

/// Durable store: one pretty-printed JSON file on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn open(path: PathBuf) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn open_default() -> Result<Self, StorageError> {
        let dirs = directories::ProjectDirs::from("", "", "evomart")
            .ok_or(StorageError::NoDataDir)?;
        Self::open(dirs.data_dir().join("store.json"))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn get(&self) -> Result<Option<StoreState>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn put(&self, state: &StoreState) -> Result<(), StorageError> {
        // Write-then-rename so a crash mid-write never leaves a torn file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Option<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self) -> Result<Option<StoreState>, StorageError> {
        Ok(self.inner.lock().expect("state lock poisoned").clone())
    }

    fn put(&self, state: &StoreState) -> Result<(), StorageError> {
        *self.inner.lock().expect("state lock poisoned") = Some(state.clone());
        Ok(())
    }
}
