// src/persister.rs - Background writer mirroring a collection into the backend
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use log::{debug, error, trace};
use tokio::sync::{mpsc, oneshot};

use crate::{JotError, KvBackend, Result};

#[derive(Debug)]
pub enum WriteCommand {
    /// Overwrite the stored collection with this serialized snapshot
    Persist(String),
    /// Acknowledge once everything queued before it has been written
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget writer for one well-known key.
///
/// Snapshots are written strictly in the order they were scheduled. When
/// several are waiting only the newest is written, since each one is a full
/// overwrite of the collection. Failed writes are logged and dropped.
#[derive(Debug)]
pub struct Persister {
    /// Key every snapshot is written under
    key: &'static str,

    /// Channel to send commands to the writer task
    command_tx: mpsc::UnboundedSender<WriteCommand>,

    /// Snapshots scheduled since spawn
    scheduled: AtomicU64,
}

impl Persister {
    /// Spawns the writer task. Must be called from inside a tokio runtime.
    pub fn spawn(backend: Arc<dyn KvBackend>, key: &'static str) -> Self {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            debug!("Writer for '{}' started", key);

            while let Some(cmd) = command_rx.recv().await {
                let mut latest = None;
                let mut waiters = Vec::new();
                absorb(cmd, &mut latest, &mut waiters);

                // Drain whatever queued up while the previous write ran
                while let Ok(cmd) = command_rx.try_recv() {
                    absorb(cmd, &mut latest, &mut waiters);
                }

                if let Some(blob) = latest {
                    match backend.set(key, &blob).await {
                        Ok(_) => debug!("Persisted '{}' ({} bytes)", key, blob.len()),
                        Err(e) => error!("Failed to persist '{}': {}", key, e),
                    }
                }

                for waiter in waiters {
                    let _ = waiter.send(());
                }
            }

            debug!("Writer for '{}' stopped", key);
        });

        Self {
            key,
            command_tx,
            scheduled: AtomicU64::new(0),
        }
    }

    /// Queues a snapshot for writing and returns immediately.
    pub fn schedule(&self, blob: String) {
        trace!("Scheduling write of '{}'", self.key);
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.command_tx.send(WriteCommand::Persist(blob)) {
            error!("Writer for '{}' is gone, dropping snapshot: {}", self.key, e);
        }
    }

    /// How many snapshots have been scheduled so far.
    pub fn scheduled(&self) -> u64 {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Waits until every snapshot scheduled so far has been handed to the
    /// backend. Write failures are not reported here.
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();

        self.command_tx
            .send(WriteCommand::Flush(ack_tx))
            .map_err(|e| JotError::ApplicationError {
                message: format!("Failed to send flush to writer for '{}': {}", self.key, e),
            })?;

        ack_rx.await.map_err(|e| JotError::ApplicationError {
            message: format!("Writer for '{}' stopped before flushing: {}", self.key, e),
        })
    }
}

fn absorb(cmd: WriteCommand, latest: &mut Option<String>, waiters: &mut Vec<oneshot::Sender<()>>) {
    match cmd {
        WriteCommand::Persist(blob) => *latest = Some(blob),
        WriteCommand::Flush(ack) => waiters.push(ack),
    }
}
