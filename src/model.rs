use serde::{Deserialize, Serialize};

/// Acting role attached to sessions, assignment stamps and log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Worker,
}

/// Housekeeping staff member. `id` is a locally allocated small integer; the
/// store key of the backing document is carried separately (see `cache::Doc`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: i64,
    pub name: String,
    pub code: String,
}

/// Physical room, identified by a free-text number/label, optionally carrying
/// requirement tags. The tag set is ordered and duplicate-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub number: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Binding of one room to one worker for one calendar date.
///
/// Completion attribution fields are present only while `completed` is true;
/// toggling completion off clears all three back to null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub worker_id: i64,
    pub room_id: i64,
    /// Calendar date in `YYYY-MM-DD` form.
    pub date: String,
    pub completed: bool,
    /// RFC3339 timestamp of the assignment write.
    pub assigned_at: String,
    pub assigned_by: String,
    pub assigned_by_role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by_role: Option<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentAction {
    Assign,
    Unassign,
    Complete,
    Uncomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagAction {
    TagAdded,
    TagRemoved,
}

/// How an unassignment was triggered; recorded on `unassign` log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignMethod {
    DragToUnassigned,
    ManualRemove,
    Reassignment,
}

/// Audit record of one assignment mutation. Append-only, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentLogEntry {
    pub action: AssignmentAction,
    pub worker_id: i64,
    pub worker_name: String,
    pub room_id: i64,
    pub room_number: String,
    pub date: String,
    pub timestamp: String,
    pub performed_by: Role,
    pub performed_by_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<UnassignMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_assignment: Option<bool>,
}

/// Wire marker distinguishing tag-operation entries from assignment entries
/// inside the shared log collection.
pub const TAG_ACTION_TYPE: &str = "tag_action";

/// Audit record of one tag mutation on a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagLogEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub action: TagAction,
    pub room_id: i64,
    pub room_number: String,
    pub tag_name: String,
    pub timestamp: String,
    pub performed_by: Role,
    pub performed_by_name: String,
}

/// One document of the `assignment_logs` collection. The two shapes are
/// structurally disjoint (tag entries carry a `type` marker and `tagName`,
/// assignment entries carry `workerId` and `date`), so untagged decoding is
/// unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogEntry {
    Assignment(AssignmentLogEntry),
    Tag(TagLogEntry),
}

impl LogEntry {
    pub fn timestamp(&self) -> &str {
        match self {
            LogEntry::Assignment(entry) => &entry.timestamp,
            LogEntry::Tag(entry) => &entry.timestamp,
        }
    }
}
