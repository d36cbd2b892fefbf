//! Generic data-access handle over one remote collection.
//!
//! A [`Collection`] mirrors a remote collection into a local, observable
//! [`CollectionState`] and forwards writes to the store. The cache is only
//! mutated after the store confirms a write.
//!
//! # Sync modes
//!
//! - [`SyncMode::FetchOnce`]: one fetch on activation; call
//!   [`Collection::refetch`] to reload.
//! - [`SyncMode::Subscribe`]: a standing listener replaces the whole list on
//!   every snapshot. A fetch that started before the latest snapshot is
//!   discarded.
//!
//! Writes to the same document id are applied in call order; writes to
//! different ids run concurrently.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo(store: std::sync::Arc<dyn storefront_core::RemoteStore>) {
//! use storefront_core::{Collection, Contact, SyncMode};
//!
//! let contacts: Collection<Contact> = Collection::activate(store, "contacts", SyncMode::FetchOnce);
//! let state = contacts.ready().await;
//! println!("{} contacts", state.items.len());
//! # }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use crate::error::CollectionError;
use crate::models::{Category, Contact, Item};
use crate::store::{Fields, RawDocument, RemoteStore, StoreError};

/// A document type held in a collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

impl Entity for Item {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Contact {
    fn id(&self) -> &str {
        &self.id
    }
}

/// How a collection keeps its cache in step with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncMode {
    #[default]
    #[serde(rename = "fetch")]
    FetchOnce,
    #[serde(rename = "subscribe")]
    Subscribe,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::FetchOnce => write!(f, "fetch"),
            SyncMode::Subscribe => write!(f, "subscribe"),
        }
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fetch" | "fetch-once" | "once" => Ok(SyncMode::FetchOnce),
            "subscribe" | "listen" | "live" => Ok(SyncMode::Subscribe),
            _ => Err(format!(
                "Invalid sync mode '{}'. Valid options: fetch, subscribe",
                s
            )),
        }
    }
}

/// Observable state of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<T> {
    /// Cached documents, in the order the store delivered them.
    pub items: Vec<T>,
    /// True from activation until the first fetch or snapshot settles.
    pub loading: bool,
    /// Message from the last failed operation; cleared by the next success.
    pub error: Option<String>,
}

impl<T> CollectionState<T> {
    fn loading() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

/// State shared between the handle and its background task.
struct Shared<T> {
    name: String,
    store: Arc<dyn RemoteStore>,
    state: watch::Sender<CollectionState<T>>,
    /// Bumped on every applied snapshot; lets fetches detect they are stale.
    snapshots_applied: AtomicU64,
}

impl<T: Entity> Shared<T> {
    async fn fetch(&self) -> Result<(), StoreError> {
        let started_at = self.snapshots_applied.load(Ordering::SeqCst);

        let docs = match self.store.get_all(&self.name).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!("Failed to load {}: {}", self.name, e);
                let message = format!("Failed to load {}: {}", self.name, e);
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message);
                });
                return Err(e);
            }
        };

        let items = decode_all(&self.name, docs);

        // Compared under the watch lock so a snapshot cannot slip in between
        let applied = self.state.send_if_modified(|state| {
            if self.snapshots_applied.load(Ordering::SeqCst) != started_at {
                return false;
            }
            state.items = items;
            state.loading = false;
            state.error = None;
            true
        });
        if !applied {
            tracing::debug!("Discarding stale fetch of {}", self.name);
        }
        Ok(())
    }

    fn apply_snapshot(&self, docs: Vec<RawDocument>) {
        let items = decode_all(&self.name, docs);
        tracing::debug!("Snapshot of {}: {} document(s)", self.name, items.len());
        self.state.send_modify(|state| {
            self.snapshots_applied.fetch_add(1, Ordering::SeqCst);
            state.items = items;
            state.loading = false;
            state.error = None;
        });
    }

    fn listener_failed(&self, error: &StoreError) {
        tracing::error!("Listener for {} failed: {}", self.name, error);
        let message = format!("Failed to listen to {}: {}", self.name, error);
        self.state.send_modify(|state| {
            state.loading = false;
            state.error = Some(message);
        });
    }

    /// Records a failed write in the error slot and hands the error back.
    fn write_failed(&self, action: &str, error: StoreError) -> CollectionError {
        tracing::error!("Failed to {} {}: {}", action, self.name, error);
        let message = format!("Failed to {} {}: {}", action, self.name, error);
        self.state.send_modify(|state| state.error = Some(message));
        CollectionError::Store(error)
    }
}

async fn listen<T: Entity>(shared: Arc<Shared<T>>) {
    let mut snapshots = match shared.store.subscribe(&shared.name).await {
        Ok(snapshots) => snapshots,
        Err(e) => {
            shared.listener_failed(&e);
            return;
        }
    };

    while let Some(next) = snapshots.next().await {
        match next {
            Ok(docs) => shared.apply_snapshot(docs),
            Err(e) => shared.listener_failed(&e),
        }
    }

    // Only reached while the handle is alive; dropping it aborts the task.
    shared.listener_failed(&StoreError::Listener("stream closed".to_string()));
}

fn decode_all<T: Entity>(collection: &str, docs: Vec<RawDocument>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping {}/{}: {}", collection, doc.id, e);
                None
            }
        })
        .collect()
}

fn to_fields<S: Serialize + ?Sized>(value: &S) -> Result<Fields, CollectionError> {
    match serde_json::to_value(value).map_err(CollectionError::Encode)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(CollectionError::NotAnObject),
    }
}

/// Overlays `fields` onto `item`, leaving other fields untouched.
fn merge<T: Entity>(item: &T, fields: &Fields) -> Result<T, serde_json::Error> {
    let mut value = serde_json::to_value(item)?;
    if let Value::Object(existing) = &mut value {
        for (key, field) in fields {
            existing.insert(key.clone(), field.clone());
        }
    }
    serde_json::from_value(value)
}

/// Aborts the background task when dropped.
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-document FIFO queue for writes.
#[derive(Default)]
struct WriteQueue {
    slots: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WriteQueue {
    async fn acquire(&self, id: &str) -> Turn<'_> {
        let slot = lock(&self.slots).entry(id.to_string()).or_default().clone();
        let guard = slot.clone().lock_owned().await;
        Turn {
            queue: self,
            id: id.to_string(),
            slot,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        lock(&self.slots).len()
    }
}

/// Exclusive turn to write one document. Released on drop.
struct Turn<'a> {
    queue: &'a WriteQueue,
    id: String,
    slot: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = lock(&self.queue.slots);
        // Only the map and this turn still hold the slot: nobody is waiting.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.id);
        }
    }
}

/// Handle mirroring one remote collection.
///
/// Dropping the handle (or calling [`Collection::deactivate`]) stops its
/// listener or pending initial fetch; no state changes happen afterwards.
pub struct Collection<T: Entity> {
    shared: Arc<Shared<T>>,
    mode: SyncMode,
    writes: WriteQueue,
    task: Option<TaskGuard>,
}

impl<T: Entity> Collection<T> {
    /// Starts the initial fetch or listener and returns immediately with
    /// `loading` set. Must be called within a tokio runtime.
    pub fn activate(store: Arc<dyn RemoteStore>, name: impl Into<String>, mode: SyncMode) -> Self {
        let (state, _) = watch::channel(CollectionState::loading());
        let shared = Arc::new(Shared {
            name: name.into(),
            store,
            state,
            snapshots_applied: AtomicU64::new(0),
        });

        tracing::debug!("Activating {} ({})", shared.name, mode);

        let task = match mode {
            SyncMode::FetchOnce => {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    // Failures are already recorded in the error slot
                    let _ = shared.fetch().await;
                })
            }
            SyncMode::Subscribe => tokio::spawn(listen(Arc::clone(&shared))),
        };

        Self {
            shared,
            mode,
            writes: WriteQueue::default(),
            task: Some(TaskGuard(task)),
        }
    }

    /// Stops the background task. Equivalent to dropping the handle.
    pub fn deactivate(mut self) {
        if self.task.take().is_some() {
            tracing::debug!("Deactivated {}", self.shared.name);
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Current state snapshot.
    pub fn state(&self) -> CollectionState<T> {
        self.shared.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.shared.state.borrow().items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.borrow().error.clone()
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.shared
            .state
            .borrow()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Returns a receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<CollectionState<T>> {
        self.shared.state.subscribe()
    }

    /// Waits until loading has settled and returns the state.
    pub async fn ready(&self) -> CollectionState<T> {
        let mut receiver = self.shared.state.subscribe();
        // Bound first: the borrowed `Ref` must drop before `receiver` does.
        let state = match receiver.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Reloads the whole collection, replacing the cache.
    pub async fn refetch(&self) -> Result<(), CollectionError> {
        self.shared.fetch().await?;
        Ok(())
    }

    /// Creates a document from `draft` (any `id` field is dropped) and
    /// appends the stored entity to the cache.
    pub async fn add<D: Serialize + ?Sized>(&self, draft: &D) -> Result<T, CollectionError> {
        let mut fields = to_fields(draft)?;
        fields.remove("id");

        let doc = match self.shared.store.add(&self.shared.name, fields).await {
            Ok(doc) => doc,
            Err(e) => return Err(self.shared.write_failed("add to", e)),
        };

        let entity: T = doc.decode().map_err(|source| CollectionError::Decode {
            id: doc.id.clone(),
            source,
        })?;

        self.shared.state.send_modify(|state| {
            // A listener may have delivered the new document already
            match state.items.iter_mut().find(|item| item.id() == entity.id()) {
                Some(existing) => *existing = entity.clone(),
                None => state.items.push(entity.clone()),
            }
            state.error = None;
        });

        Ok(entity)
    }

    /// Sends a partial update and merges it into the cached entry.
    ///
    /// If `id` is not cached the store is still updated; the cache catches up
    /// on the next fetch or snapshot.
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        id: &str,
        partial: &P,
    ) -> Result<(), CollectionError> {
        let fields = to_fields(partial)?;
        let _turn = self.writes.acquire(id).await;

        if let Err(e) = self
            .shared
            .store
            .update(&self.shared.name, id, fields.clone())
            .await
        {
            return Err(self.shared.write_failed("update", e));
        }

        let name = &self.shared.name;
        self.shared.state.send_modify(|state| {
            state.error = None;
            let Some(item) = state.items.iter_mut().find(|item| item.id() == id) else {
                tracing::debug!("Updated {}/{} is not cached", name, id);
                return;
            };
            match merge(item, &fields) {
                Ok(merged) => *item = merged,
                Err(e) => tracing::warn!("Could not merge update into {}/{}: {}", name, id, e),
            }
        });

        Ok(())
    }

    /// Deletes a document and drops it from the cache.
    pub async fn delete(&self, id: &str) -> Result<(), CollectionError> {
        let _turn = self.writes.acquire(id).await;

        if let Err(e) = self.shared.store.delete(&self.shared.name, id).await {
            return Err(self.shared.write_failed("delete from", e));
        }

        self.shared.state.send_modify(|state| {
            state.items.retain(|item| item.id() != id);
            state.error = None;
        });

        Ok(())
    }
}
