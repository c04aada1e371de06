use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::id::new_doc_key;
use crate::store::{merge_patch, Collection, Document, DocumentStore, Snapshot};
use crate::{seed, AppError, AppResult};

type Collections = HashMap<Collection, BTreeMap<String, Value>>;

/// In-memory document store. Used as the fallback when no database is
/// configured; nothing survives the process.
pub struct MemoryStore {
    collections: Mutex<Collections>,
    channels: HashMap<Collection, watch::Sender<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_collections(
            Collection::ALL
                .iter()
                .map(|&collection| (collection, BTreeMap::new()))
                .collect(),
        )
    }

    /// Memory store pre-populated with the fixed seed dataset.
    pub fn with_seed() -> Self {
        let mut collections: Collections = Collection::ALL
            .iter()
            .map(|&collection| (collection, BTreeMap::new()))
            .collect();
        for (collection, data) in seed::documents() {
            collections
                .get_mut(&collection)
                .expect("all collections present")
                .insert(new_doc_key(), data);
        }
        Self::from_collections(collections)
    }

    fn from_collections(collections: Collections) -> Self {
        let channels = collections
            .iter()
            .map(|(&collection, docs)| (collection, watch::channel(snapshot_of(docs)).0))
            .collect();
        MemoryStore {
            collections: Mutex::new(collections),
            channels,
        }
    }

    fn publish(&self, collection: Collection, docs: &BTreeMap<String, Value>) {
        if let Some(sender) = self.channels.get(&collection) {
            sender.send_replace(snapshot_of(docs));
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

fn snapshot_of(docs: &BTreeMap<String, Value>) -> Snapshot {
    Arc::new(
        docs.iter()
            .map(|(key, data)| Document {
                key: key.clone(),
                data: data.clone(),
            })
            .collect(),
    )
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: Collection, data: Value) -> AppResult<String> {
        if !data.is_object() {
            return Err(AppError::new(
                "STORE/PAYLOAD",
                "Document payload must be a JSON object",
            )
            .with_context("collection", collection.name()));
        }
        let mut guard = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let docs = guard.get_mut(&collection).expect("collection exists");
        let key = new_doc_key();
        docs.insert(key.clone(), data);
        self.publish(collection, docs);
        Ok(key)
    }

    async fn update(
        &self,
        collection: Collection,
        key: &str,
        patch: Map<String, Value>,
    ) -> AppResult<()> {
        let mut guard = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let docs = guard.get_mut(&collection).expect("collection exists");
        let Some(existing) = docs.get_mut(key) else {
            return Err(AppError::new("STORE/NOT_FOUND", "No document for key")
                .with_context("collection", collection.name())
                .with_context("key", key.to_string()));
        };
        let Some(target) = existing.as_object_mut() else {
            return Err(AppError::new(
                "STORE/PAYLOAD",
                "Stored document is not a JSON object",
            )
            .with_context("collection", collection.name())
            .with_context("key", key.to_string()));
        };
        merge_patch(target, patch);
        self.publish(collection, docs);
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> AppResult<()> {
        let mut guard = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let docs = guard.get_mut(&collection).expect("collection exists");
        if docs.remove(key).is_some() {
            self.publish(collection, docs);
        }
        Ok(())
    }

    fn watch(&self, collection: Collection) -> watch::Receiver<Snapshot> {
        self.channels
            .get(&collection)
            .expect("collection exists")
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn add_assigns_keys_in_insertion_order() {
        let store = MemoryStore::new();
        let first = store
            .add(Collection::Rooms, json!({"id": 1, "number": "101"}))
            .await
            .unwrap();
        let second = store
            .add(Collection::Rooms, json!({"id": 2, "number": "102"}))
            .await
            .unwrap();

        let snapshot = store.watch(Collection::Rooms).borrow().clone();
        let keys: Vec<&str> = snapshot.iter().map(|doc| doc.key.as_str()).collect();
        assert_eq!(keys, vec![first.as_str(), second.as_str()]);
    }

    #[tokio::test]
    async fn update_merges_and_missing_key_errors() {
        let store = MemoryStore::new();
        let key = store
            .add(Collection::Rooms, json!({"id": 1, "number": "101", "tags": []}))
            .await
            .unwrap();

        let patch = json!({"tags": ["생수 추가"]}).as_object().unwrap().clone();
        store.update(Collection::Rooms, &key, patch).await.unwrap();
        let snapshot = store.watch(Collection::Rooms).borrow().clone();
        assert_eq!(snapshot[0].data["tags"], json!(["생수 추가"]));
        assert_eq!(snapshot[0].data["number"], json!("101"));

        let err = store
            .update(Collection::Rooms, "missing", Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "STORE/NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_missing_is_a_noop() {
        let store = MemoryStore::new();
        store.delete(Collection::Workers, "missing").await.unwrap();
    }

    #[tokio::test]
    async fn seeded_store_carries_the_fixture_dataset() {
        let store = MemoryStore::with_seed();
        let workers = store.watch(Collection::Workers).borrow().clone();
        let rooms = store.watch(Collection::Rooms).borrow().clone();
        assert_eq!(workers.len(), 2);
        assert_eq!(rooms.len(), 49);
        assert!(store
            .watch(Collection::Assignments)
            .borrow()
            .is_empty());
    }
}
