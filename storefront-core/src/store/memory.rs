//! In-process document store.
//!
//! Behaves like the hosted store: identifiers are assigned on `add`, `update`
//! of a missing document fails, `delete` of a missing document succeeds, and
//! listeners receive a full snapshot after every write to their collection.
//!
//! Faults and latency can be injected per [`Operation`] to exercise error
//! paths and response ordering.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{Fields, RawDocument, RemoteStore, Snapshots, StoreError};

/// Capacity of the change channel. Lagging listeners resync from a snapshot.
const CHANGE_CAPACITY: usize = 64;

/// Store operations, for fault injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetAll,
    Add,
    Update,
    Delete,
    Subscribe,
    GetDocument,
    SetDocument,
}

#[derive(Debug, Default)]
struct Faults {
    failing: HashSet<Operation>,
    delays: HashMap<Operation, Duration>,
}

#[derive(Debug)]
struct Inner {
    collections: Mutex<HashMap<String, Vec<RawDocument>>>,
    documents: Mutex<HashMap<String, Value>>,
    faults: Mutex<Faults>,
    calls: Mutex<HashMap<Operation, usize>>,
    changes: broadcast::Sender<String>,
}

/// Shared in-memory store. Clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                documents: Mutex::new(HashMap::new()),
                faults: Mutex::new(Faults::default()),
                calls: Mutex::new(HashMap::new()),
                changes,
            }),
        }
    }

    /// Inserts documents directly, bypassing faults and call accounting.
    /// Returns the assigned identifiers.
    pub fn seed(&self, collection: &str, documents: Vec<Fields>) -> Vec<String> {
        let ids: Vec<String> = {
            let mut collections = lock(&self.inner.collections);
            let docs = collections.entry(collection.to_string()).or_default();
            documents
                .into_iter()
                .map(|fields| {
                    let doc = RawDocument::new(new_id(), fields);
                    let id = doc.id.clone();
                    docs.push(doc);
                    id
                })
                .collect()
        };
        self.notify(collection);
        ids
    }

    /// Current contents of a collection.
    pub fn documents(&self, collection: &str) -> Vec<RawDocument> {
        lock(&self.inner.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Current value of a singleton document.
    pub fn document(&self, path: &str) -> Option<Value> {
        lock(&self.inner.documents).get(path).cloned()
    }

    /// Makes every subsequent `operation` fail with a network error.
    pub fn fail(&self, operation: Operation) {
        lock(&self.inner.faults).failing.insert(operation);
    }

    /// Makes every operation fail, as if the connection were down.
    pub fn go_offline(&self) {
        let mut faults = lock(&self.inner.faults);
        faults.failing.extend([
            Operation::GetAll,
            Operation::Add,
            Operation::Update,
            Operation::Delete,
            Operation::Subscribe,
            Operation::GetDocument,
            Operation::SetDocument,
        ]);
    }

    /// Clears all injected failures.
    pub fn recover(&self) {
        lock(&self.inner.faults).failing.clear();
    }

    /// Delays every subsequent `operation` by `delay` before it runs.
    pub fn delay(&self, operation: Operation, delay: Duration) {
        lock(&self.inner.faults).delays.insert(operation, delay);
    }

    /// Number of times `operation` was invoked, including failed calls.
    pub fn calls(&self, operation: Operation) -> usize {
        lock(&self.inner.calls)
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of write calls (add, update, delete, set_document).
    pub fn write_count(&self) -> usize {
        [
            Operation::Add,
            Operation::Update,
            Operation::Delete,
            Operation::SetDocument,
        ]
        .into_iter()
        .map(|op| self.calls(op))
        .sum()
    }

    /// Records the call, waits out any injected delay, then applies faults.
    async fn enter(&self, operation: Operation) -> Result<(), StoreError> {
        *lock(&self.inner.calls).entry(operation).or_insert(0) += 1;

        let delay = lock(&self.inner.faults).delays.get(&operation).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.inner.faults).failing.contains(&operation) {
            return Err(StoreError::Network(format!(
                "simulated failure for {:?}",
                operation
            )));
        }
        Ok(())
    }

    fn snapshot(&self, collection: &str) -> Vec<RawDocument> {
        self.documents(collection)
    }

    fn notify(&self, collection: &str) {
        // No listeners is fine.
        let _ = self.inner.changes.send(collection.to_string());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        self.enter(Operation::GetAll).await?;
        Ok(self.snapshot(collection))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<RawDocument, StoreError> {
        self.enter(Operation::Add).await?;

        let doc = RawDocument::new(new_id(), fields);
        lock(&self.inner.collections)
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        self.notify(collection);

        Ok(doc)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.enter(Operation::Update).await?;

        {
            let mut collections = lock(&self.inner.collections);
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            for (key, value) in fields {
                doc.fields.insert(key, value);
            }
        }
        self.notify(collection);

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.enter(Operation::Delete).await?;

        if let Some(docs) = lock(&self.inner.collections).get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        self.notify(collection);

        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> Result<Snapshots, StoreError> {
        self.enter(Operation::Subscribe).await?;

        // Subscribe before taking the first snapshot so no change is missed.
        let changes = self.inner.changes.subscribe();
        let initial = self.snapshot(collection);
        let name = collection.to_string();
        let store = self.clone();

        let updates = stream::unfold(
            (changes, store, name),
            |(mut changes, store, name)| async move {
                loop {
                    match changes.recv().await {
                        Ok(changed) if changed == name => break,
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(_)) => break,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
                let snapshot = store.snapshot(&name);
                Some((Ok::<_, StoreError>(snapshot), (changes, store, name)))
            },
        );

        Ok(stream::once(async move { Ok::<_, StoreError>(initial) })
            .chain(updates)
            .boxed())
    }

    async fn get_document(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.enter(Operation::GetDocument).await?;
        Ok(self.document(path))
    }

    async fn set_document(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.enter(Operation::SetDocument).await?;
        lock(&self.inner.documents).insert(path.to_string(), value);
        Ok(())
    }
}
