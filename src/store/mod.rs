//! Document-store seam. The hosted database the board syncs against is an
//! external collaborator; this trait mirrors its primitive operations —
//! create, merge-update, delete, and live full-snapshot subscription — so the
//! engines stay backend-agnostic. Two backends are provided: a persistent
//! SQLite store and the in-memory seed fallback.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::AppResult;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// The four named collections of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Workers,
    Rooms,
    Assignments,
    AssignmentLogs,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Workers,
        Collection::Rooms,
        Collection::Assignments,
        Collection::AssignmentLogs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Workers => "workers",
            Collection::Rooms => "rooms",
            Collection::Assignments => "assignments",
            Collection::AssignmentLogs => "assignment_logs",
        }
    }
}

/// One stored document: an opaque store-assigned key plus the JSON payload.
/// The key is distinct from any numeric `id` field inside the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub data: Value,
}

/// Full current state of one collection, in key (= insertion) order.
pub type Snapshot = Arc<Vec<Document>>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and return its store-assigned key. Publishes a fresh
    /// snapshot on success.
    async fn add(&self, collection: Collection, data: Value) -> AppResult<String>;

    /// Shallow-merge `patch` into an existing document; `null` values
    /// overwrite fields to null. Updating a missing document is an error.
    async fn update(
        &self,
        collection: Collection,
        key: &str,
        patch: Map<String, Value>,
    ) -> AppResult<()>;

    /// Delete by key. Deleting a missing key is a no-op, matching hosted
    /// delete semantics.
    async fn delete(&self, collection: Collection, key: &str) -> AppResult<()>;

    /// Live subscription to a collection; every call returns a fresh receiver
    /// positioned at the latest snapshot.
    fn watch(&self, collection: Collection) -> watch::Receiver<Snapshot>;
}

pub type StoreHandle = Arc<dyn DocumentStore>;

pub(crate) fn merge_patch(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (field, value) in patch {
        target.insert(field, value);
    }
}
