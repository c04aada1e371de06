mod common;

use anyhow::Result;
use roomboard::{AssignOutcome, AssignmentAction, Role, UnassignMethod};

use common::admin_board;

const DATE: &str = "2024-01-01";

#[tokio::test]
async fn assign_creates_pending_assignment_with_attribution() -> Result<()> {
    let board = admin_board(&[(1, "김철수", "HK8X2M")], &[(1, "506")]).await;

    let outcome = board.assign(1, 1, DATE).await?;
    assert_eq!(outcome, AssignOutcome::Assigned);
    board.sync();

    let assignments = board.cache().assignments();
    assert_eq!(assignments.len(), 1);
    let assignment = &assignments[0].value;
    assert!(!assignment.completed);
    assert_eq!(assignment.worker_id, 1);
    assert_eq!(assignment.room_id, 1);
    assert_eq!(assignment.date, DATE);
    assert_eq!(assignment.assigned_by, "관리자");
    assert_eq!(assignment.assigned_by_role, Role::Admin);
    assert!(assignment.completed_at.is_none());

    let log = board.assignment_log(None, Some(AssignmentAction::Assign));
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].worker_name, "김철수");
    assert_eq!(log[0].room_number, "506");
    assert_eq!(log[0].bulk_assignment, None);
    Ok(())
}

#[tokio::test]
async fn reassignment_deletes_prior_binding_and_logs_once() -> Result<()> {
    let board = admin_board(
        &[(1, "김철수", "HK8X2M"), (2, "이영희", "PQ7K9R")],
        &[(1, "506")],
    )
    .await;

    board.assign(1, 1, DATE).await?;
    board.sync();
    board.assign(2, 1, DATE).await?;
    board.sync();

    // At most one assignment per (room, date); the slot now belongs to B only.
    let assignments = board.cache().assignments();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].value.worker_id, 2);

    let unassigns = board.assignment_log(None, Some(AssignmentAction::Unassign));
    assert_eq!(unassigns.len(), 1);
    assert_eq!(unassigns[0].worker_id, 1);
    assert_eq!(unassigns[0].reason.as_deref(), Some("reassignment"));
    assert_eq!(unassigns[0].method, Some(UnassignMethod::Reassignment));

    let assigns = board.assignment_log(None, Some(AssignmentAction::Assign));
    assert_eq!(assigns.len(), 2);
    // Newest first: the reassignment's assign entry is no older than the
    // unassign entry it follows.
    assert!(assigns[0].timestamp >= unassigns[0].timestamp);
    Ok(())
}

#[tokio::test]
async fn assigning_same_worker_again_is_a_noop() -> Result<()> {
    let board = admin_board(&[(1, "김철수", "HK8X2M")], &[(1, "506")]).await;

    board.assign(1, 1, DATE).await?;
    board.sync();
    let outcome = board.assign(1, 1, DATE).await?;
    assert_eq!(outcome, AssignOutcome::AlreadyAssigned);
    board.sync();

    assert_eq!(board.cache().assignments().len(), 1);
    assert_eq!(
        board.assignment_log(None, Some(AssignmentAction::Assign)).len(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn completion_round_trip_clears_attribution() -> Result<()> {
    let board = admin_board(&[(1, "김철수", "HK8X2M")], &[(1, "506")]).await;
    board.assign(1, 1, DATE).await?;
    board.sync();

    let completed = board.toggle_completion(1, DATE).await?;
    assert!(completed.completed);
    assert_eq!(completed.completed_by.as_deref(), Some("관리자"));
    assert_eq!(completed.completed_by_role, Some(Role::Admin));
    assert!(completed.completed_at.is_some());
    board.sync();

    let reverted = board.toggle_completion(1, DATE).await?;
    assert!(!reverted.completed);
    assert!(reverted.completed_at.is_none());
    assert!(reverted.completed_by.is_none());
    assert!(reverted.completed_by_role.is_none());
    board.sync();

    // The echoed document also reads as pending again.
    let assignment = board.cache().assignment_for_room(1, DATE).unwrap();
    assert!(!assignment.value.completed);
    assert!(assignment.value.completed_at.is_none());

    assert_eq!(
        board.assignment_log(None, Some(AssignmentAction::Complete)).len(),
        1
    );
    assert_eq!(
        board
            .assignment_log(None, Some(AssignmentAction::Uncomplete))
            .len(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn worker_completes_own_room_with_worker_attribution() -> Result<()> {
    let board = admin_board(&[(1, "김철수", "HK8X2M")], &[(1, "506")]).await;
    board.assign(1, 1, DATE).await?;
    board.sync();

    board.logout().await;
    board.login_worker("HK8X2M")?;
    let completed = board.toggle_completion(1, DATE).await?;
    assert_eq!(completed.completed_by.as_deref(), Some("김철수"));
    assert_eq!(completed.completed_by_role, Some(Role::Worker));
    board.sync();

    let log = board.assignment_log(None, Some(AssignmentAction::Complete));
    assert_eq!(log[0].performed_by, Role::Worker);
    assert_eq!(log[0].performed_by_name, "김철수");
    Ok(())
}

#[tokio::test]
async fn unassigned_rooms_track_the_slot_lifecycle() -> Result<()> {
    let board = admin_board(&[(1, "Alice", "AAAAAA")], &[(1, "101"), (2, "102")]).await;

    board.assign(1, 1, DATE).await?;
    board.sync();
    let numbers: Vec<String> = board
        .cache()
        .unassigned_rooms(DATE)
        .into_iter()
        .map(|room| room.number)
        .collect();
    assert_eq!(numbers, vec!["102"]);

    board.assign(1, 2, DATE).await?;
    board.sync();
    assert!(board.cache().unassigned_rooms(DATE).is_empty());

    let removed = board.unassign(1, DATE, UnassignMethod::ManualRemove).await?;
    assert!(removed);
    board.sync();
    let numbers: Vec<String> = board
        .cache()
        .unassigned_rooms(DATE)
        .into_iter()
        .map(|room| room.number)
        .collect();
    assert_eq!(numbers, vec!["101"]);

    let unassigns = board.assignment_log(None, Some(AssignmentAction::Unassign));
    assert_eq!(unassigns[0].method, Some(UnassignMethod::ManualRemove));
    assert_eq!(unassigns[0].reason, None);
    Ok(())
}

#[tokio::test]
async fn unassigning_an_empty_slot_is_a_noop() -> Result<()> {
    let board = admin_board(&[(1, "Alice", "AAAAAA")], &[(1, "101")]).await;
    let removed = board
        .unassign(1, DATE, UnassignMethod::DragToUnassigned)
        .await?;
    assert!(!removed);
    assert!(board.assignment_log(None, None).is_empty());
    Ok(())
}

#[tokio::test]
async fn bulk_assignment_flags_each_entry() -> Result<()> {
    let board = admin_board(&[(1, "Alice", "AAAAAA")], &[(1, "101"), (2, "102")]).await;

    let created = board.assign_rooms(1, &[1, 2], DATE).await?;
    assert_eq!(created, 2);
    board.sync();

    let assigns = board.assignment_log(None, Some(AssignmentAction::Assign));
    assert_eq!(assigns.len(), 2);
    assert!(assigns
        .iter()
        .all(|entry| entry.bulk_assignment == Some(true)));

    // A single-room selection carries no bulk flag.
    let board = admin_board(&[(1, "Alice", "AAAAAA")], &[(1, "101")]).await;
    board.assign_rooms(1, &[1], DATE).await?;
    board.sync();
    let assigns = board.assignment_log(None, Some(AssignmentAction::Assign));
    assert_eq!(assigns[0].bulk_assignment, None);
    Ok(())
}

#[tokio::test]
async fn empty_bulk_selection_is_rejected() -> Result<()> {
    let board = admin_board(&[(1, "Alice", "AAAAAA")], &[(1, "101")]).await;
    let err = board.assign_rooms(1, &[], DATE).await.unwrap_err();
    assert_eq!(err.code(), "ASSIGN/NOTHING_SELECTED");
    Ok(())
}

#[tokio::test]
async fn malformed_dates_are_rejected_before_any_write() -> Result<()> {
    let board = admin_board(&[(1, "Alice", "AAAAAA")], &[(1, "101")]).await;
    let err = board.assign(1, 1, "2024-13-40").await.unwrap_err();
    assert_eq!(err.code(), "TIME/INVALID_DATE");
    board.sync();
    assert!(board.cache().assignments().is_empty());
    Ok(())
}

#[tokio::test]
async fn mutations_require_a_session() -> Result<()> {
    let board = common::board(&[(1, "Alice", "AAAAAA")], &[(1, "101")]).await;
    let err = board.assign(1, 1, DATE).await.unwrap_err();
    assert_eq!(err.code(), "SESSION/REQUIRED");
    Ok(())
}
