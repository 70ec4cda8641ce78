use std::{sync::Arc, time::Duration};

use log::{debug, error, info, warn};

use crate::{Config, FileStorage, JotError, KvBackend, NoteStore, Result, TodoStore};

/// The note and todo stores of one application run, sharing a backend.
///
/// Built once at startup and handed to whatever presents it.
pub struct Workspace {
    backend: Arc<dyn KvBackend>,
    notes: NoteStore,
    todos: TodoStore,
}

impl Workspace {
    /// Loads both collections from `backend`.
    pub async fn open(backend: Arc<dyn KvBackend>) -> Self {
        let notes = NoteStore::open(Arc::clone(&backend)).await;
        let todos = TodoStore::open(Arc::clone(&backend)).await;

        info!(
            "Workspace ready with {} notes and {} todos",
            notes.len(),
            todos.len()
        );

        Self {
            backend,
            notes,
            todos,
        }
    }

    /// Opens a workspace on the file backend in `config.data_dir`.
    pub async fn from_config(config: &Config) -> Self {
        info!("Opening workspace in {}", config.data_dir.display());
        Self::open(Arc::new(FileStorage::new(config.data_dir.clone()))).await
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn todos(&self) -> &TodoStore {
        &self.todos
    }

    /// Wipes every stored collection and empties both caches.
    ///
    /// Unlike normal mutations the backend result is returned, so the
    /// caller can tell the user whether the reset happened.
    pub async fn reset_all(&self) -> Result<()> {
        warn!("Resetting all stored notes and todos");

        let notes_mark = self.notes.scheduled_writes();
        let todos_mark = self.todos.scheduled_writes();

        // Pending writes must land before the wipe, not after it
        if let Err(e) = self.flush().await {
            warn!("Flush before reset failed: {}", e);
        }

        self.backend.clear().await.map_err(|e| {
            error!("Failed to clear backend: {}", e);
            e
        })?;

        self.notes.reset_cache(notes_mark);
        self.todos.reset_cache(todos_mark);

        info!("All notes and todos have been reset");
        Ok(())
    }

    /// Waits until both stores have handed every scheduled write to the
    /// backend.
    pub async fn flush(&self) -> Result<()> {
        self.notes.flush().await?;
        self.todos.flush().await?;
        debug!("Workspace flushed");
        Ok(())
    }

    /// Flushes pending writes, giving up after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        info!("Shutting down workspace...");

        match tokio::time::timeout(timeout, self.flush()).await {
            Ok(Ok(())) => {
                info!("Workspace shutdown complete");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Error flushing pending writes: {}", e);
                Err(e)
            }
            Err(_) => {
                let error_msg = format!(
                    "Timed out after {:?} while flushing pending writes",
                    timeout
                );
                warn!("{}", error_msg);
                Err(JotError::ApplicationError { message: error_msg })
            }
        }
    }
}
