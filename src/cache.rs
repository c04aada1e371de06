//! Client-side mirrors of the four collections, kept current by applying
//! full snapshots from the document store. The cache is the sole writer of
//! the mirrored vectors; engines only read them and request store writes, so
//! a failed write never leaves phantom local state.

use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::model::{Assignment, LogEntry, Room, Worker};
use crate::store::{Collection, Document, StoreHandle};

/// Display label used when an id no longer resolves to a cached entity.
pub const UNKNOWN_LABEL: &str = "알 수 없음";

/// A decoded entity paired with the key of its backing document.
#[derive(Debug, Clone, PartialEq)]
pub struct Doc<T> {
    pub key: String,
    pub value: T,
}

pub struct EntityCache {
    retain_seed_on_empty: bool,
    workers: RwLock<Vec<Doc<Worker>>>,
    rooms: RwLock<Vec<Doc<Room>>>,
    assignments: RwLock<Vec<Doc<Assignment>>>,
    logs: RwLock<Vec<Doc<LogEntry>>>,
}

impl EntityCache {
    pub fn new(retain_seed_on_empty: bool) -> Self {
        EntityCache {
            retain_seed_on_empty,
            workers: RwLock::new(Vec::new()),
            rooms: RwLock::new(Vec::new()),
            assignments: RwLock::new(Vec::new()),
            logs: RwLock::new(Vec::new()),
        }
    }

    /// Replace one collection mirror with an incoming snapshot.
    ///
    /// Workers and rooms ignore empty snapshots while `retain_seed_on_empty`
    /// is set, so seed data is not wiped before the external store is
    /// populated. Assignments and logs always replace.
    pub fn apply(&self, collection: Collection, snapshot: &[Document]) {
        match collection {
            Collection::Workers => {
                if snapshot.is_empty() && self.retain_seed_on_empty {
                    return;
                }
                *write(&self.workers) = decode_all(collection, snapshot);
            }
            Collection::Rooms => {
                if snapshot.is_empty() && self.retain_seed_on_empty {
                    return;
                }
                *write(&self.rooms) = decode_all(collection, snapshot);
            }
            Collection::Assignments => {
                *write(&self.assignments) = decode_all(collection, snapshot);
            }
            Collection::AssignmentLogs => {
                *write(&self.logs) = decode_all(collection, snapshot);
            }
        }
    }

    pub fn workers(&self) -> Vec<Doc<Worker>> {
        read(&self.workers).clone()
    }

    pub fn rooms(&self) -> Vec<Doc<Room>> {
        read(&self.rooms).clone()
    }

    pub fn assignments(&self) -> Vec<Doc<Assignment>> {
        read(&self.assignments).clone()
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        read(&self.logs).iter().map(|doc| doc.value.clone()).collect()
    }

    pub fn find_worker(&self, worker_id: i64) -> Option<Doc<Worker>> {
        read(&self.workers)
            .iter()
            .find(|doc| doc.value.id == worker_id)
            .cloned()
    }

    pub fn find_worker_by_code(&self, code: &str) -> Option<Worker> {
        read(&self.workers)
            .iter()
            .map(|doc| &doc.value)
            .find(|worker| worker.code == code)
            .cloned()
    }

    pub fn find_room(&self, room_id: i64) -> Option<Doc<Room>> {
        read(&self.rooms)
            .iter()
            .find(|doc| doc.value.id == room_id)
            .cloned()
    }

    /// Worker display name, or the unknown sentinel.
    pub fn worker_name(&self, worker_id: i64) -> String {
        self.find_worker(worker_id)
            .map(|doc| doc.value.name)
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// Room number label, or the unknown sentinel.
    pub fn room_number(&self, room_id: i64) -> String {
        self.find_room(room_id)
            .map(|doc| doc.value.number)
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// All of one worker's assignments for a date, in stored order.
    pub fn assignments_for(&self, worker_id: i64, date: &str) -> Vec<Doc<Assignment>> {
        read(&self.assignments)
            .iter()
            .filter(|doc| doc.value.worker_id == worker_id && doc.value.date == date)
            .cloned()
            .collect()
    }

    /// The assignment occupying a (room, date) slot, if any. At most one
    /// exists at steady state.
    pub fn assignment_for_room(&self, room_id: i64, date: &str) -> Option<Doc<Assignment>> {
        read(&self.assignments)
            .iter()
            .find(|doc| doc.value.room_id == room_id && doc.value.date == date)
            .cloned()
    }

    /// Rooms with no assignment on the given date: set difference over the
    /// date's assigned room ids.
    pub fn unassigned_rooms(&self, date: &str) -> Vec<Room> {
        let assigned: Vec<i64> = read(&self.assignments)
            .iter()
            .filter(|doc| doc.value.date == date)
            .map(|doc| doc.value.room_id)
            .collect();
        read(&self.rooms)
            .iter()
            .map(|doc| &doc.value)
            .filter(|room| !assigned.contains(&room.id))
            .cloned()
            .collect()
    }
}

fn decode_all<T: DeserializeOwned>(collection: Collection, snapshot: &[Document]) -> Vec<Doc<T>> {
    snapshot
        .iter()
        .filter_map(|document| {
            match serde_json::from_value::<T>(document.data.clone()) {
                Ok(value) => Some(Doc {
                    key: document.key.clone(),
                    value,
                }),
                Err(err) => {
                    tracing::warn!(
                        event = "snapshot_decode_failed",
                        collection = collection.name(),
                        key = %document.key,
                        error = %err
                    );
                    None
                }
            }
        })
        .collect()
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns one forwarding task per collection: each loops on the store's watch
/// channel and applies snapshots to the cache. Teardown aborts every task;
/// the tasks also end on their own once the store (and thus the senders) is
/// dropped.
pub struct SubscriptionManager {
    tasks: Vec<JoinHandle<()>>,
}

impl SubscriptionManager {
    pub fn spawn(store: &StoreHandle, cache: Arc<EntityCache>) -> Self {
        let tasks = Collection::ALL
            .iter()
            .map(|&collection| {
                let mut receiver = store.watch(collection);
                let cache = cache.clone();
                tokio::spawn(async move {
                    loop {
                        let snapshot = receiver.borrow_and_update().clone();
                        cache.apply(collection, &snapshot);
                        if receiver.changed().await.is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        SubscriptionManager { tasks }
    }

    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
