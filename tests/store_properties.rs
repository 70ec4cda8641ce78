use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use jotter::{
    FileStorage, Importance, JotError, KvBackend, MemoryBackend, NoteBody, NoteStore, Result,
    TodoBody, TodoStore,
};

const SEEDED_NOTES: &str = r#"[
    {"id":"a","title":"alpha","time":{"day":1,"month":1,"hour":8,"minutes":0},"text":""},
    {"id":"b","title":"beta","time":{"day":2,"month":1,"hour":9,"minutes":15},"text":"two"},
    {"id":"c","title":"","time":{"day":3,"month":1,"hour":10,"minutes":30},"text":"gamma"}
]"#;

/// Backend whose writes block until permits are released.
struct GatedBackend {
    inner: MemoryBackend,
    gate: Semaphore,
}

impl GatedBackend {
    fn closed() -> Self {
        Self {
            inner: MemoryBackend::new(),
            gate: Semaphore::new(0),
        }
    }

    fn open_gate(&self) {
        self.gate.add_permits(1_000);
    }
}

#[async_trait]
impl KvBackend for GatedBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| JotError::ApplicationError {
                message: e.to_string(),
            })?;
        self.inner.set(key, value).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}

fn ids<P>(records: &[jotter::Record<P>]) -> Vec<String> {
    records.iter().map(|r| r.id().to_string()).collect()
}

#[tokio::test]
async fn remove_twice_equals_remove_once() {
    let backend = Arc::new(MemoryBackend::with_entry("notes", SEEDED_NOTES));
    let notes = NoteStore::open(backend.clone()).await;

    assert!(notes.remove("b"));
    let after_first = notes.list();
    assert!(!notes.remove("b"));

    assert_eq!(*notes.list(), *after_first);
    assert_eq!(ids(&notes.list()), ["a", "c"]);
}

#[tokio::test]
async fn added_records_survive_reload() {
    let backend = Arc::new(MemoryBackend::new());

    let note = NoteBody::new("Groceries", "milk, eggs");
    let todo = TodoBody::new("Call bank", Importance::Important).scheduled(
        chrono::NaiveDate::from_ymd_opt(2026, 10, 20),
        chrono::NaiveTime::from_hms_opt(9, 30, 0),
    );
    {
        let notes = NoteStore::open(backend.clone()).await;
        let todos = TodoStore::open(backend.clone()).await;
        notes.add(note.clone()).unwrap();
        todos.add(todo.clone()).unwrap();
        notes.flush().await.unwrap();
        todos.flush().await.unwrap();
    }

    let notes = NoteStore::open(backend.clone()).await;
    let todos = TodoStore::open(backend.clone()).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes.list()[0].payload(), &note);
    assert_eq!(todos.len(), 1);
    assert_eq!(todos.list()[0].payload(), &todo);
}

#[tokio::test]
async fn blank_adds_never_change_size() {
    let backend = Arc::new(MemoryBackend::with_entry("notes", SEEDED_NOTES));
    let notes = NoteStore::open(backend.clone()).await;
    let todos = TodoStore::open(backend.clone()).await;

    assert_eq!(notes.add(NoteBody::new("", "")), None);
    assert_eq!(notes.add(NoteBody::new("   ", "\t")), None);
    assert_eq!(todos.add(TodoBody::new("", Importance::Important)), None);

    assert_eq!(notes.len(), 3);
    assert!(todos.is_empty());
}

#[tokio::test]
async fn remove_many_matches_sequential_removes() {
    let batch_backend = Arc::new(MemoryBackend::with_entry("notes", SEEDED_NOTES));
    let single_backend = Arc::new(MemoryBackend::with_entry("notes", SEEDED_NOTES));
    let batched = NoteStore::open(batch_backend.clone()).await;
    let sequential = NoteStore::open(single_backend.clone()).await;

    assert_eq!(batched.remove_many(&["a", "c", "missing"]), 2);
    sequential.remove("a");
    sequential.remove("c");

    assert_eq!(*batched.list(), *sequential.list());

    batched.flush().await.unwrap();
    sequential.flush().await.unwrap();
    assert_eq!(batch_backend.raw("notes"), single_backend.raw("notes"));
    assert_eq!(batch_backend.write_count(), 1);
}

#[tokio::test]
async fn update_keeps_id_and_position() {
    let backend = Arc::new(MemoryBackend::with_entry("notes", SEEDED_NOTES));
    let notes = NoteStore::open(backend.clone()).await;

    let replacement = NoteBody::new("beta v2", "");
    assert!(notes.update("b", replacement.clone()));

    let updated = notes.get("b").unwrap();
    assert_eq!(updated.payload(), &replacement);
    assert_eq!(ids(&notes.list()), ["a", "b", "c"]);

    assert!(!notes.update("nope", NoteBody::new("x", "")));
    assert_eq!(notes.len(), 3);
}

#[tokio::test]
async fn notes_scenario_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let backend: Arc<dyn KvBackend> = Arc::new(FileStorage::new(dir.path()));

    let groceries_id = {
        let notes = NoteStore::open(Arc::clone(&backend)).await;

        let groceries_id = notes.add(NoteBody::new("Groceries", "milk, eggs")).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.list()[0].id(), groceries_id);

        notes.add(NoteBody::new("Plan", "trip")).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes.list()[0].payload().title, "Plan");

        assert!(notes.remove(&groceries_id));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.list()[0].payload().title, "Plan");

        notes.flush().await.unwrap();
        groceries_id
    };

    let reloaded = NoteStore::open(backend).await;
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.list()[0].payload().title, "Plan");
    assert!(reloaded.get(&groceries_id).is_none());
}

#[tokio::test]
async fn todo_partition_scenario() {
    let todos = TodoStore::open(Arc::new(MemoryBackend::new())).await;

    todos.add(TodoBody::new("Call bank", Importance::Important)).unwrap();
    todos.add(TodoBody::new("Water plants", Importance::Relaxed)).unwrap();

    let partition = todos.partition();
    assert_eq!(partition.important.len(), 1);
    assert_eq!(partition.normal.len(), 1);
    assert_eq!(partition.important[0].payload().text, "Call bank");
    assert_eq!(partition.normal[0].payload().text, "Water plants");

    // Always derived from the live collection
    let id = partition.important[0].id().to_string();
    todos.update(&id, TodoBody::new("Call bank", Importance::Relaxed));
    let partition = todos.partition();
    assert!(partition.important.is_empty());
    assert_eq!(partition.normal.len(), 2);
}

#[tokio::test]
async fn cache_is_ahead_of_pending_writes() {
    let backend = Arc::new(GatedBackend::closed());
    let notes = NoteStore::open(backend.clone()).await;

    let id = notes.add(NoteBody::new("Pending", "not on disk yet")).unwrap();
    assert_eq!(notes.get(&id).unwrap().payload().title, "Pending");

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.inner.raw("notes"), None);
    assert_eq!(notes.len(), 1);

    backend.open_gate();
    notes.flush().await.unwrap();

    let stored = backend.inner.raw("notes").unwrap();
    assert!(stored.contains("not on disk yet"));
}

#[tokio::test]
async fn corrupt_state_degrades_to_empty() {
    let backend = Arc::new(MemoryBackend::with_entry("notes", "{{{ definitely not json"));

    let err = jotter::load::<NoteBody>(backend.as_ref()).await.unwrap_err();
    assert!(matches!(err, JotError::CorruptState { .. }));

    let notes = NoteStore::open(backend.clone()).await;
    assert!(notes.is_empty());

    // The next mutation replaces the corrupt blob
    notes.add(NoteBody::new("fresh", "")).unwrap();
    notes.flush().await.unwrap();
    let reloaded = NoteStore::open(backend.clone()).await;
    assert_eq!(reloaded.len(), 1);
}

#[tokio::test]
async fn unavailable_backend_is_swallowed() {
    let backend = Arc::new(MemoryBackend::with_entry("todos", "[]"));
    backend.set_offline(true);

    let err = jotter::load::<TodoBody>(backend.as_ref()).await.unwrap_err();
    assert!(matches!(err, JotError::BackendUnavailable { .. }));

    let todos = TodoStore::open(backend.clone()).await;
    assert!(todos.is_empty());

    let id = todos.add(TodoBody::new("still works", Importance::Relaxed)).unwrap();
    todos.flush().await.unwrap();

    assert!(todos.get(&id).is_some());
    assert_eq!(backend.write_count(), 0);
}

#[tokio::test]
async fn subscribers_see_every_change() {
    let notes = NoteStore::open(Arc::new(MemoryBackend::new())).await;
    let mut rx = notes.subscribe();

    let id = notes.add(NoteBody::new("watched", "")).unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    assert!(!notes.remove("unknown"));
    assert!(!rx.has_changed().unwrap());

    notes.remove(&id);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_empty());
}

#[tokio::test]
async fn legacy_note_blob_rehydrates() {
    let legacy = r#"[
        {"id":"123456","title":"Groceries","time":{"day":19,"month":"Oct","hour":9,"minutes":5},"text":"milk, eggs"}
    ]"#;
    let backend = Arc::new(MemoryBackend::with_entry("notes", legacy));
    let notes = NoteStore::open(backend.clone()).await;

    assert_eq!(notes.len(), 1);
    let groceries = notes.get("123456").unwrap();
    assert_eq!(groceries.payload().stamp.month, 10);
    assert_eq!(groceries.payload().stamp.to_string(), "19 Oct, 9:05");

    // A later write keeps the existing note and its stored shape
    notes.add(NoteBody::new("Plan", "trip")).unwrap();
    notes.flush().await.unwrap();
    let stored = backend.raw("notes").unwrap();
    assert!(stored.contains("Groceries"));
    assert!(stored.contains(r#""month":"Oct""#));
    assert_eq!(NoteStore::open(backend).await.len(), 2);
}

fn local(raw: &str) -> chrono::NaiveDateTime {
    chrono::DateTime::parse_from_rfc3339(raw)
        .unwrap()
        .with_timezone(&chrono::Local)
        .naive_local()
}

#[tokio::test]
async fn legacy_todo_blob_rehydrates() {
    let legacy = r#"[
        {"id":"1718000000000","text":"Call bank","important":"important",
         "date":"2024-06-10T08:15:00.000Z","time":"2024-06-10T08:15:00.000Z"},
        {"id":"1718000000001","text":"Water plants","important":"relaxed",
         "date":"2024-06-11T00:00:00.000Z","time":"2024-06-11T17:45:00.000Z"}
    ]"#;
    let todos = TodoStore::open(Arc::new(MemoryBackend::with_entry("todos", legacy))).await;

    assert_eq!(todos.len(), 2);
    let first = todos.get("1718000000000").unwrap();
    assert_eq!(
        first.payload().scheduled_at(),
        Some(local("2024-06-10T08:15:00.000Z"))
    );
    assert_eq!(todos.partition().normal[0].payload().text, "Water plants");
}
