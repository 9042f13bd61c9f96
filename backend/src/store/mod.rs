//! Abstract document store
//!
//! The backing database is an external collaborator; the application only
//! relies on the primitives modeled here: get, create-if-absent, partial
//! patch, atomic merge (numeric increment + array append), live
//! subscription with immediate-plus-on-change delivery, and inclusive
//! range scans over string-sortable keys.
//!
//! Mutations to a document are never expressed as read-modify-write in
//! application code, since that pattern loses concurrent updates. Every
//! implementation must apply a [`MergeUpdate`] atomically with respect to
//! other callers.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors from document-store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("subscription closed")]
    SubscriptionClosed,
}

/// Address of one document: a collection path plus a document id.
///
/// Collections are namespaced per user (e.g. `users/{uid}/daily_logs`), so
/// no document is ever shared between accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub collection: String,
    pub id: String,
}

impl DocKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// An atomic combination of numeric increments and array appends.
///
/// Field names are compile-time constants owned by the repositories; they
/// are never taken from request input.
#[derive(Debug, Clone, Default)]
pub struct MergeUpdate {
    pub increments: Vec<(&'static str, i64)>,
    pub appends: Vec<(&'static str, Value)>,
}

impl MergeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(mut self, field: &'static str, delta: i64) -> Self {
        self.increments.push((field, delta));
        self
    }

    pub fn append(mut self, field: &'static str, value: Value) -> Self {
        self.appends.push((field, value));
        self
    }
}

/// Live view of one document.
///
/// The current state is delivered on the first `next()` call, then every
/// committed change afterwards. Delivery is asynchronous and at-least-once
/// per change; it is not serialized with write completion. Dropping the
/// watch unsubscribes.
pub struct DocumentWatch {
    initial: Option<Option<Value>>,
    rx: broadcast::Receiver<Option<Value>>,
}

impl DocumentWatch {
    /// Next observed state: `Some(doc)` when present, `None` when absent
    pub async fn next(&mut self) -> Result<Option<Value>, StoreError> {
        if let Some(current) = self.initial.take() {
            return Ok(current);
        }
        loop {
            match self.rx.recv().await {
                Ok(state) => return Ok(state),
                // Skipped intermediate states; the next one is still current
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(StoreError::SubscriptionClosed)
                }
            }
        }
    }
}

/// The abstract store interface the rest of the backend programs against
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, if present
    async fn get(&self, key: &DocKey) -> Result<Option<Value>, StoreError>;

    /// Create a document unless it already exists.
    ///
    /// First-writer-wins: when the document exists the seed is discarded
    /// and the stored document is returned unmodified.
    async fn create_if_absent(&self, key: &DocKey, seed: Value) -> Result<Value, StoreError>;

    /// Overwrite only the named top-level fields of an existing document
    async fn patch(
        &self,
        key: &DocKey,
        fields: serde_json::Map<String, Value>,
    ) -> Result<Value, StoreError>;

    /// Apply increments and appends atomically, seeding a fresh document
    /// when none exists. Concurrent callers never overwrite each other's
    /// contributions.
    async fn upsert_merge(
        &self,
        key: &DocKey,
        seed: Value,
        update: MergeUpdate,
    ) -> Result<Value, StoreError>;

    /// Register a live observer for one document
    async fn subscribe(&self, key: &DocKey) -> Result<DocumentWatch, StoreError>;

    /// Inclusive id-range scan within a collection.
    ///
    /// Implementations may return documents in any order; callers sort.
    async fn list_range(
        &self,
        collection: &str,
        start_id: &str,
        end_id: &str,
    ) -> Result<Vec<Value>, StoreError>;

    /// Liveness probe for readiness checks
    async fn ping(&self) -> Result<(), StoreError>;
}

/// In-process subscription fan-out shared by the store implementations.
///
/// Senders are created lazily per key and pruned once no receiver is left.
pub(crate) struct WatcherRegistry {
    inner: Mutex<HashMap<DocKey, broadcast::Sender<Option<Value>>>>,
}

impl WatcherRegistry {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn watch(
        &self,
        key: &DocKey,
        current: Option<Value>,
    ) -> DocumentWatch {
        let mut map = self.inner.lock().expect("watcher registry poisoned");
        let sender = map
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(64).0);
        DocumentWatch {
            initial: Some(current),
            rx: sender.subscribe(),
        }
    }

    pub(crate) fn notify(&self, key: &DocKey, state: Option<Value>) {
        let mut map = self.inner.lock().expect("watcher registry poisoned");
        if let Some(sender) = map.get(key) {
            if sender.send(state).is_err() {
                // Last receiver dropped; release the channel
                map.remove(key);
            }
        }
    }
}
