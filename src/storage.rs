use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{JotError, KvBackend, Result};

/// File extension used for every stored key.
const KEY_EXTENSION: &str = "json";

/// Durable backend keeping one JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory holding the key files
    root: PathBuf,
}

impl FileStorage {
    /// Creates a file backend rooted at `root`. The directory is created
    /// lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this backend writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Helper method to get the file path for a key
    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, KEY_EXTENSION))
    }
}

#[async_trait]
impl KvBackend for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        debug!("Reading key '{}' from {}", key, path.display());

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                trace!("Read {} bytes for key '{}'", contents.len(), key);
                Ok(Some(contents))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Key '{}' has never been written", key);
                Ok(None)
            }
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                Err(JotError::BackendUnavailable {
                    message: format!("cannot read {}: {}", path.display(), e),
                })
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let root = self.root.clone();
        let path = self.key_path(key);
        let contents = value.to_string();

        tokio::task::spawn_blocking(move || write_atomically(&root, &path, &contents))
            .await
            .map_err(|e| JotError::ApplicationError {
                message: format!("Write task for key '{}' failed: {}", key, e),
            })?
    }

    async fn clear(&self) -> Result<()> {
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || remove_key_files(&root))
            .await
            .map_err(|e| JotError::ApplicationError {
                message: format!("Clear task failed: {}", e),
            })?
    }
}

/// Writes `contents` to `path` using a temp file and rename so a crash never
/// leaves a half-written collection behind.
fn write_atomically(root: &Path, path: &Path, contents: &str) -> Result<()> {
    if !root.exists() {
        debug!("Creating data directory: {}", root.display());
        fs::create_dir_all(root).map_err(|e| {
            error!("Failed to create directory {}: {}", root.display(), e);
            JotError::DirectoryError {
                path: root.to_path_buf(),
            }
        })?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let mut temp_file = NamedTempFile::new_in(root).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        JotError::Io(e)
    })?;

    trace!("Writing to temporary file");
    temp_file.write_all(contents.as_bytes()).map_err(|e| {
        error!("Failed to write to temporary file: {}", e);
        JotError::Io(e)
    })?;

    temp_file.flush().map_err(|e| {
        error!("Failed to flush temporary file: {}", e);
        JotError::Io(e)
    })?;

    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        JotError::Io(e.error)
    })?;

    debug!("Persisted {}", path.display());
    Ok(())
}

/// Removes every key file directly inside `root`.
fn remove_key_files(root: &Path) -> Result<()> {
    if !root.exists() {
        debug!("Data directory {} does not exist, nothing to clear", root.display());
        return Ok(());
    }

    let mut removed = 0;
    let mut failures = 0;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == KEY_EXTENSION) {
            match fs::remove_file(path) {
                Ok(_) => removed += 1,
                Err(e) => {
                    warn!("Failed to remove {}: {}", path.display(), e);
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        return Err(JotError::BackendUnavailable {
            message: format!("{} key files in {} could not be removed", failures, root.display()),
        });
    }

    info!("Cleared {} key files from {}", removed, root.display());
    Ok(())
}
