//! The collection cache and the facade presentation code talks to.
//!
//! The cache is the single source of truth while the process runs. Every
//! mutation lands in memory, queues the full collection for the backend and
//! wakes subscribers before returning. Callers never wait on the write: a
//! crash can lose the latest mutation but never corrupts earlier state,
//! because each write replaces the whole stored blob.
//!
//! Every mutation re-serializes the whole collection. That is fine for
//! personal notes and todos; it would need per-record keys for large sets.
use std::{collections::HashSet, sync::Arc};

use log::{debug, error, info, warn};
use tokio::sync::watch;

use crate::{
    next_id, parse_collection, partition_todos, KvBackend, Note, NoteBody, Payload, Persister,
    Placement, Record, Result, TodoBody, TodoPartition,
};

/// Immutable view of a collection at one point in time.
pub type Snapshot<P> = Arc<Vec<Record<P>>>;

pub type NoteStore = Store<NoteBody>;
pub type TodoStore = Store<TodoBody>;

/// Reads the collection stored under `P::STORAGE_KEY`.
///
/// An absent key is an empty collection. Fails with `BackendUnavailable` or
/// `CorruptState`.
pub async fn load<P: Payload>(backend: &dyn KvBackend) -> Result<Vec<Record<P>>> {
    match backend.get(P::STORAGE_KEY).await? {
        Some(blob) => parse_collection(&blob),
        None => {
            debug!("No stored {} collection yet", P::KIND);
            Ok(Vec::new())
        }
    }
}

/// Write-through cache over one collection.
pub struct Store<P: Payload> {
    /// Current records; also the channel subscribers watch
    cache: watch::Sender<Snapshot<P>>,

    /// Background writer for this collection's key
    persister: Persister,
}

impl<P: Payload> Store<P> {
    /// Loads the collection once and starts the writer.
    ///
    /// Load failures are logged and degrade to an empty collection.
    pub async fn open(backend: Arc<dyn KvBackend>) -> Self {
        let records = match load::<P>(backend.as_ref()).await {
            Ok(records) => {
                info!("Loaded {} {} records", records.len(), P::KIND);
                records
            }
            Err(e) => {
                error!("Failed to load {} collection, starting empty: {}", P::KIND, e);
                Vec::new()
            }
        };

        let (cache, _) = watch::channel(Arc::new(records));
        let persister = Persister::spawn(backend, P::STORAGE_KEY);

        Self { cache, persister }
    }

    /// The current collection.
    pub fn list(&self) -> Snapshot<P> {
        Arc::clone(&self.cache.borrow())
    }

    /// A receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<P>> {
        self.cache.subscribe()
    }

    pub fn get(&self, id: &str) -> Option<Record<P>> {
        self.cache.borrow().iter().find(|r| r.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// Adds a record with a fresh id and returns that id.
    ///
    /// Blank payloads are rejected silently with `None`.
    pub fn add(&self, payload: P) -> Option<String> {
        if let Err(e) = payload.validate() {
            debug!("Not adding {}: {}", P::KIND, e);
            return None;
        }

        let mut assigned = None;
        self.mutate(|records| {
            let id = next_id(records.iter().map(|r| r.id()));
            let record = Record::new(id.clone(), payload);
            match P::PLACEMENT {
                Placement::Head => records.insert(0, record),
                Placement::Tail => records.push(record),
            }
            assigned = Some(id);
            true
        });

        if let Some(id) = &assigned {
            info!("Added {} {}", P::KIND, id);
        }
        assigned
    }

    /// Removes the record with `id`. Absent ids are a no-op.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.mutate(|records| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            records.len() != before
        });

        if removed {
            info!("Removed {} {}", P::KIND, id);
        } else {
            debug!("No {} {} to remove", P::KIND, id);
        }
        removed
    }

    /// Removes every record whose id is in `ids` with a single write.
    /// Returns how many records were removed.
    pub fn remove_many<S: AsRef<str>>(&self, ids: &[S]) -> usize {
        let targets: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        let mut removed = 0;

        self.mutate(|records| {
            let before = records.len();
            records.retain(|r| !targets.contains(r.id()));
            removed = before - records.len();
            removed > 0
        });

        if removed > 0 {
            info!("Removed {} of {} requested {} records", removed, targets.len(), P::KIND);
        } else {
            debug!("None of {} requested {} records to remove", targets.len(), P::KIND);
        }
        removed
    }

    /// Replaces the payload of `id` wholesale, keeping its position.
    ///
    /// Absent ids and blank payloads are a no-op.
    pub fn update(&self, id: &str, payload: P) -> bool {
        if let Err(e) = payload.validate() {
            warn!("Not updating {} {}: {}", P::KIND, id, e);
            return false;
        }

        let updated = self.mutate(|records| match records.iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                record.replace_payload(payload);
                true
            }
            None => false,
        });

        if updated {
            info!("Updated {} {}", P::KIND, id);
        } else {
            debug!("No {} {} to update", P::KIND, id);
        }
        updated
    }

    /// Waits for all writes scheduled so far to reach the backend.
    pub async fn flush(&self) -> Result<()> {
        self.persister.flush().await
    }

    /// Number of snapshots handed to the writer so far.
    pub(crate) fn scheduled_writes(&self) -> u64 {
        self.persister.scheduled()
    }

    /// Empties the cache after the backend has been wiped.
    ///
    /// `mark` is `scheduled_writes()` from before the wipe. Snapshots
    /// scheduled after it may still land on the wiped backend, so an empty
    /// collection is queued behind them. Otherwise nothing is written.
    pub(crate) fn reset_cache(&self, mark: u64) {
        self.cache.send_if_modified(|snapshot| {
            if self.persister.scheduled() != mark {
                debug!("Writes raced the {} reset, queueing an empty collection", P::KIND);
                self.persister.schedule("[]".to_string());
            }
            if snapshot.is_empty() {
                return false;
            }
            *snapshot = Arc::new(Vec::new());
            true
        });
    }

    /// Applies `change` under the cache lock. When it reports a change the
    /// full collection is queued for writing before subscribers are woken,
    /// so queued snapshots always follow mutation order.
    fn mutate<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut Vec<Record<P>>) -> bool,
    {
        self.cache.send_if_modified(|snapshot| {
            let records = Arc::make_mut(snapshot);
            if !change(records) {
                return false;
            }

            match serde_json::to_string(&*records) {
                Ok(blob) => self.persister.schedule(blob),
                Err(e) => error!("Failed to serialize {} collection: {}", P::KIND, e),
            }
            true
        })
    }
}

impl Store<NoteBody> {
    /// Notes whose title or text contains `query`, ignoring case, in
    /// collection order.
    pub fn search(&self, query: &str) -> Vec<Note> {
        self.list()
            .iter()
            .filter(|note| note.payload().matches(query))
            .cloned()
            .collect()
    }
}

impl Store<TodoBody> {
    /// Important and normal todos, recomputed from the current snapshot.
    pub fn partition(&self) -> TodoPartition {
        partition_todos(&self.list())
    }
}
