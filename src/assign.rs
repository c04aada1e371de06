//! Assignment engine: the rules for the (room, date) slot state machine.
//! unassigned → assigned → completed, with completion reversible and any
//! assigned slot removable. At most one assignment may occupy a slot; taking
//! an occupied slot for another worker deletes the prior binding first
//! (two independent operations, deliberately non-atomic — the gap leaves the
//! room unassigned, which is self-healing).

use crate::activity;
use crate::cache::{Doc, EntityCache};
use crate::id::next_assignment_id;
use crate::model::{
    Assignment, AssignmentAction, AssignmentLogEntry, LogEntry, UnassignMethod,
};
use crate::session::Identity;
use crate::store::{Collection, DocumentStore};
use crate::time::{now_rfc3339, parse_date};
use crate::{AppError, AppResult};

pub const REASSIGNMENT_REASON: &str = "reassignment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned,
    /// The slot already belonged to the same worker; nothing was written.
    AlreadyAssigned,
}

fn log_entry(
    cache: &EntityCache,
    actor: &Identity,
    action: AssignmentAction,
    assignment: &Assignment,
) -> AssignmentLogEntry {
    AssignmentLogEntry {
        action,
        worker_id: assignment.worker_id,
        worker_name: cache.worker_name(assignment.worker_id),
        room_id: assignment.room_id,
        room_number: cache.room_number(assignment.room_id),
        date: assignment.date.clone(),
        timestamp: now_rfc3339(),
        performed_by: actor.role(),
        performed_by_name: actor.display_name().to_string(),
        method: None,
        reason: None,
        bulk_assignment: None,
    }
}

/// Assign one room to one worker for one date.
pub async fn assign(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    actor: &Identity,
    worker_id: i64,
    room_id: i64,
    date: &str,
) -> AppResult<AssignOutcome> {
    assign_one(store, cache, actor, worker_id, room_id, date, false).await
}

/// Bulk assignment: one `assign` per selected room, sequentially. Each
/// iteration logs on its own, flagged as part of a bulk operation when more
/// than one room was selected. Returns the number of newly created bindings.
pub async fn assign_rooms(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    actor: &Identity,
    worker_id: i64,
    room_ids: &[i64],
    date: &str,
) -> AppResult<usize> {
    if room_ids.is_empty() {
        return Err(AppError::new(
            "ASSIGN/NOTHING_SELECTED",
            "직원과 객실을 하나 이상 선택해주세요",
        ));
    }
    let bulk = room_ids.len() > 1;
    let mut created = 0;
    for &room_id in room_ids {
        if assign_one(store, cache, actor, worker_id, room_id, date, bulk).await?
            == AssignOutcome::Assigned
        {
            created += 1;
        }
    }
    Ok(created)
}

async fn assign_one(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    actor: &Identity,
    worker_id: i64,
    room_id: i64,
    date: &str,
    bulk: bool,
) -> AppResult<AssignOutcome> {
    parse_date(date)?;

    if let Some(existing) = cache.assignment_for_room(room_id, date) {
        if existing.value.worker_id == worker_id {
            return Ok(AssignOutcome::AlreadyAssigned);
        }
        // Exactly one delete of the prior binding, audited as a reassignment.
        store.delete(Collection::Assignments, &existing.key).await?;
        let mut entry = log_entry(cache, actor, AssignmentAction::Unassign, &existing.value);
        entry.method = Some(UnassignMethod::Reassignment);
        entry.reason = Some(REASSIGNMENT_REASON.to_string());
        activity::record(store, LogEntry::Assignment(entry)).await;
    }

    let assignment = Assignment {
        id: next_assignment_id(),
        worker_id,
        room_id,
        date: date.to_string(),
        completed: false,
        assigned_at: now_rfc3339(),
        assigned_by: actor.display_name().to_string(),
        assigned_by_role: actor.role(),
        completed_at: None,
        completed_by: None,
        completed_by_role: None,
    };
    let data = serde_json::to_value(&assignment).map_err(AppError::from)?;
    store.add(Collection::Assignments, data).await.map_err(|err| {
        err.with_context("operation", "assign")
            .with_context("room_id", room_id.to_string())
            .with_context("date", date.to_string())
    })?;

    let mut entry = log_entry(cache, actor, AssignmentAction::Assign, &assignment);
    entry.bulk_assignment = bulk.then_some(true);
    activity::record(store, LogEntry::Assignment(entry)).await;

    Ok(AssignOutcome::Assigned)
}

/// Remove the assignment occupying a (room, date) slot, if any. Returns
/// whether a binding was actually removed.
pub async fn unassign(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    actor: &Identity,
    room_id: i64,
    date: &str,
    method: UnassignMethod,
) -> AppResult<bool> {
    parse_date(date)?;
    let Some(existing) = cache.assignment_for_room(room_id, date) else {
        return Ok(false);
    };
    store
        .delete(Collection::Assignments, &existing.key)
        .await
        .map_err(|err| {
            err.with_context("operation", "unassign")
                .with_context("room_id", room_id.to_string())
                .with_context("date", date.to_string())
        })?;

    let mut entry = log_entry(cache, actor, AssignmentAction::Unassign, &existing.value);
    entry.method = Some(method);
    if method == UnassignMethod::Reassignment {
        entry.reason = Some(REASSIGNMENT_REASON.to_string());
    }
    activity::record(store, LogEntry::Assignment(entry)).await;
    Ok(true)
}

/// Flip an assignment's completion state. Turning completion on stamps the
/// acting identity; turning it off clears all three attribution fields back
/// to null. Returns the assignment as it will read after the echo.
pub async fn toggle_completion(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    actor: &Identity,
    assignment: &Doc<Assignment>,
) -> AppResult<Assignment> {
    let mut updated = assignment.value.clone();
    updated.completed = !assignment.value.completed;
    if updated.completed {
        updated.completed_at = Some(now_rfc3339());
        updated.completed_by = Some(actor.display_name().to_string());
        updated.completed_by_role = Some(actor.role());
    } else {
        updated.completed_at = None;
        updated.completed_by = None;
        updated.completed_by_role = None;
    }

    let mut patch = serde_json::Map::new();
    patch.insert("completed".into(), updated.completed.into());
    patch.insert(
        "completedAt".into(),
        serde_json::to_value(&updated.completed_at).map_err(AppError::from)?,
    );
    patch.insert(
        "completedBy".into(),
        serde_json::to_value(&updated.completed_by).map_err(AppError::from)?,
    );
    patch.insert(
        "completedByRole".into(),
        serde_json::to_value(&updated.completed_by_role).map_err(AppError::from)?,
    );
    store
        .update(Collection::Assignments, &assignment.key, patch)
        .await
        .map_err(|err| {
            err.with_context("operation", "toggle_completion")
                .with_context("room_id", assignment.value.room_id.to_string())
                .with_context("date", assignment.value.date.clone())
        })?;

    let action = if updated.completed {
        AssignmentAction::Complete
    } else {
        AssignmentAction::Uncomplete
    };
    let entry = log_entry(cache, actor, action, &updated);
    activity::record(store, LogEntry::Assignment(entry)).await;

    Ok(updated)
}
