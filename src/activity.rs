//! Append-only audit trail of assignment and tag mutations, plus the read
//! views over it. Log writes are best-effort by design: an audit failure is
//! traced and swallowed so it can never block the primary workflow.

use crate::cache::EntityCache;
use crate::model::{
    Assignment, AssignmentAction, AssignmentLogEntry, LogEntry, TagLogEntry,
};
use crate::store::{Collection, DocumentStore};

/// Append one entry to the log collection. Failures are logged to the
/// diagnostic channel only.
pub(crate) async fn record(store: &dyn DocumentStore, entry: LogEntry) {
    let data = match serde_json::to_value(&entry) {
        Ok(data) => data,
        Err(err) => {
            tracing::warn!(event = "activity_log_encode_failed", error = %err);
            return;
        }
    };
    if let Err(err) = store.add(Collection::AssignmentLogs, data).await {
        tracing::warn!(event = "activity_log_write_failed", error = %err);
    }
}

/// One row of the combined chronological feed: either an assignment record
/// itself or a tag-operation log entry.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryItem {
    Assignment(Assignment),
    TagOp(TagLogEntry),
}

impl HistoryItem {
    pub fn timestamp(&self) -> &str {
        match self {
            HistoryItem::Assignment(assignment) => &assignment.assigned_at,
            HistoryItem::TagOp(entry) => &entry.timestamp,
        }
    }

    fn matches_date(&self, date: &str) -> bool {
        match self {
            HistoryItem::Assignment(assignment) => assignment.date == date,
            // Tag entries carry no calendar date; the timestamp's date part
            // stands in for one.
            HistoryItem::TagOp(entry) => entry.timestamp.starts_with(date),
        }
    }
}

/// Combined feed of assignment records and tag operations, newest first,
/// optionally restricted to one calendar date.
pub fn combined_history(cache: &EntityCache, date: Option<&str>) -> Vec<HistoryItem> {
    let mut items: Vec<HistoryItem> = cache
        .assignments()
        .into_iter()
        .map(|doc| HistoryItem::Assignment(doc.value))
        .chain(cache.log_entries().into_iter().filter_map(|entry| match entry {
            LogEntry::Tag(tag) => Some(HistoryItem::TagOp(tag)),
            LogEntry::Assignment(_) => None,
        }))
        .collect();
    if let Some(date) = date {
        items.retain(|item| item.matches_date(date));
    }
    // Timestamps are RFC3339 UTC, so the lexicographic order is chronological.
    items.sort_by(|a, b| b.timestamp().cmp(a.timestamp()));
    items
}

/// Dedicated log view: assignment-action entries only, filterable by date
/// and action kind, newest first.
pub fn assignment_log(
    cache: &EntityCache,
    date: Option<&str>,
    action: Option<AssignmentAction>,
) -> Vec<AssignmentLogEntry> {
    let mut entries: Vec<AssignmentLogEntry> = cache
        .log_entries()
        .into_iter()
        .filter_map(|entry| match entry {
            LogEntry::Assignment(entry) => Some(entry),
            LogEntry::Tag(_) => None,
        })
        .filter(|entry| date.map_or(true, |date| entry.date == date))
        .filter(|entry| action.map_or(true, |action| entry.action == action))
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}
