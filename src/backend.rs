//! The durable key-value contract the stores persist through.
//!
//! A backend is a dumb blob store: it knows nothing about records, ids or
//! ordering. Each collection lives under one well-known key and is always
//! overwritten as a whole.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use log::trace;

use crate::{JotError, Result};

/// Asynchronous get/set-by-key string store.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Reads the value under `key`. `Ok(None)` means it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Wipes every key.
    async fn clear(&self) -> Result<()>;
}

/// In-process backend, used for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds `value` under `key`.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let backend = Self::new();
        if let Ok(mut entries) = backend.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        backend
    }

    /// While offline every operation fails with `BackendUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Synchronous peek at the raw stored value.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(JotError::BackendUnavailable {
                message: "memory backend is offline".to_string(),
            });
        }
        Ok(())
    }

    fn lock_entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| JotError::LockAcquisitionFailed {
                message: "Failed to acquire lock on memory backend".to_string(),
            })
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_online()?;
        Ok(self.lock_entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_online()?;
        self.lock_entries()?
            .insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        trace!("Memory backend stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check_online()?;
        self.lock_entries()?.clear();
        Ok(())
    }
}
