//! Roster administration: workers and rooms, their login codes, and the
//! cascades that keep assignments referentially intact. Deleting a worker or
//! room deletes every assignment referencing it — independent deletes, the
//! same shape as the rest of the store traffic.

use crate::cache::{Doc, EntityCache};
use crate::id::{generate_login_code, next_entity_id};
use crate::model::{Room, Worker};
use crate::store::{Collection, DocumentStore};
use crate::{AppError, AppResult};

/// Register a worker with a freshly drawn unique login code.
pub async fn add_worker(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    name: &str,
) -> AppResult<Worker> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::new("ROSTER/NAME_REQUIRED", "Worker name is required"));
    }
    let workers = cache.workers();
    let worker = Worker {
        id: next_entity_id(workers.iter().map(|doc| doc.value.id)),
        name: name.to_string(),
        code: generate_login_code(|code| workers.iter().any(|doc| doc.value.code == code)),
    };
    let data = serde_json::to_value(&worker).map_err(AppError::from)?;
    store
        .add(Collection::Workers, data)
        .await
        .map_err(|err| err.with_context("operation", "add_worker"))?;
    Ok(worker)
}

/// Delete a worker and cascade to every assignment bound to it. Returns the
/// number of assignments removed.
pub async fn delete_worker(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    worker: &Doc<Worker>,
) -> AppResult<usize> {
    store
        .delete(Collection::Workers, &worker.key)
        .await
        .map_err(|err| err.with_context("operation", "delete_worker"))?;

    let mut removed = 0;
    for assignment in cache.assignments() {
        if assignment.value.worker_id == worker.value.id {
            store
                .delete(Collection::Assignments, &assignment.key)
                .await
                .map_err(|err| {
                    err.with_context("operation", "delete_worker_cascade")
                        .with_context("worker_id", worker.value.id.to_string())
                })?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Manually set a worker's login code. The code is trimmed and uppercased,
/// and rejected before any write when empty or already in use by another
/// worker.
pub async fn set_worker_code(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    worker_id: i64,
    code: &str,
) -> AppResult<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::new("ROSTER/CODE_REQUIRED", "코드를 입력해주세요"));
    }
    if cache
        .workers()
        .iter()
        .any(|doc| doc.value.code == code && doc.value.id != worker_id)
    {
        return Err(AppError::new(
            "ROSTER/CODE_TAKEN",
            "이미 사용 중인 코드입니다",
        ));
    }
    let worker = require_worker(cache, worker_id)?;
    persist_code(store, &worker.key, &code).await?;
    Ok(code)
}

/// Replace a worker's login code with a freshly drawn unique one.
pub async fn regenerate_worker_code(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    worker_id: i64,
) -> AppResult<String> {
    let workers = cache.workers();
    let code = generate_login_code(|code| workers.iter().any(|doc| doc.value.code == code));
    let worker = require_worker(cache, worker_id)?;
    persist_code(store, &worker.key, &code).await?;
    Ok(code)
}

pub async fn add_room(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    number: &str,
) -> AppResult<Room> {
    let number = number.trim();
    if number.is_empty() {
        return Err(AppError::new("ROSTER/NUMBER_REQUIRED", "Room number is required"));
    }
    let room = Room {
        id: next_entity_id(cache.rooms().iter().map(|doc| doc.value.id)),
        number: number.to_string(),
        tags: Vec::new(),
    };
    let data = serde_json::to_value(&room).map_err(AppError::from)?;
    store
        .add(Collection::Rooms, data)
        .await
        .map_err(|err| err.with_context("operation", "add_room"))?;
    Ok(room)
}

/// Delete a room and cascade to every assignment referencing it.
pub async fn delete_room(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    room: &Doc<Room>,
) -> AppResult<usize> {
    store
        .delete(Collection::Rooms, &room.key)
        .await
        .map_err(|err| err.with_context("operation", "delete_room"))?;

    let mut removed = 0;
    for assignment in cache.assignments() {
        if assignment.value.room_id == room.value.id {
            store
                .delete(Collection::Assignments, &assignment.key)
                .await
                .map_err(|err| {
                    err.with_context("operation", "delete_room_cascade")
                        .with_context("room_id", room.value.id.to_string())
                })?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn require_worker(cache: &EntityCache, worker_id: i64) -> AppResult<Doc<Worker>> {
    cache.find_worker(worker_id).ok_or_else(|| {
        AppError::new("ROSTER/WORKER_NOT_FOUND", "No such worker")
            .with_context("worker_id", worker_id.to_string())
    })
}

async fn persist_code(store: &dyn DocumentStore, worker_key: &str, code: &str) -> AppResult<()> {
    let mut patch = serde_json::Map::new();
    patch.insert("code".into(), code.into());
    store
        .update(Collection::Workers, worker_key, patch)
        .await
        .map_err(|err| err.with_context("operation", "persist_code"))
}
