//! Tag engine: free-form requirement labels on rooms, plus the session-local
//! palette they are picked from. Per-room tag sets are ordered and
//! duplicate-free; both attach and detach are idempotent and audit exactly
//! one log entry per actual change.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity;
use crate::cache::EntityCache;
use crate::model::{LogEntry, TagAction, TagLogEntry, TAG_ACTION_TYPE};
use crate::session::Identity;
use crate::store::{Collection, DocumentStore};
use crate::time::now_rfc3339;
use crate::{AppError, AppResult};

/// Attach a tag to a room. No-op (no write, no log entry) when the room
/// already carries the tag. Returns whether the tag set changed.
pub async fn add_tag(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    actor: &Identity,
    room_id: i64,
    tag_name: &str,
) -> AppResult<bool> {
    let tag_name = required_name(tag_name)?;
    let room = cache.find_room(room_id).ok_or_else(|| {
        AppError::new("TAGS/ROOM_NOT_FOUND", "No such room")
            .with_context("room_id", room_id.to_string())
    })?;
    if room.value.tags.iter().any(|tag| tag == tag_name) {
        return Ok(false);
    }

    let mut tags = room.value.tags.clone();
    tags.push(tag_name.to_string());
    persist_tags(store, &room.key, &tags).await?;
    record_tag_op(store, cache, actor, TagAction::TagAdded, room_id, tag_name).await;
    Ok(true)
}

/// Detach a tag from a room. No-op when the room does not carry the tag.
pub async fn remove_tag(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    actor: &Identity,
    room_id: i64,
    tag_name: &str,
) -> AppResult<bool> {
    let tag_name = required_name(tag_name)?;
    let room = cache.find_room(room_id).ok_or_else(|| {
        AppError::new("TAGS/ROOM_NOT_FOUND", "No such room")
            .with_context("room_id", room_id.to_string())
    })?;
    if !room.value.tags.iter().any(|tag| tag == tag_name) {
        return Ok(false);
    }

    let tags: Vec<String> = room
        .value
        .tags
        .iter()
        .filter(|tag| tag.as_str() != tag_name)
        .cloned()
        .collect();
    persist_tags(store, &room.key, &tags).await?;
    record_tag_op(store, cache, actor, TagAction::TagRemoved, room_id, tag_name).await;
    Ok(true)
}

fn required_name(tag_name: &str) -> AppResult<&str> {
    let trimmed = tag_name.trim();
    if trimmed.is_empty() {
        return Err(AppError::new("TAGS/NAME_REQUIRED", "Tag name is required"));
    }
    Ok(trimmed)
}

async fn persist_tags(store: &dyn DocumentStore, room_key: &str, tags: &[String]) -> AppResult<()> {
    let mut patch = serde_json::Map::new();
    patch.insert(
        "tags".into(),
        serde_json::to_value(tags).map_err(AppError::from)?,
    );
    store
        .update(Collection::Rooms, room_key, patch)
        .await
        .map_err(|err| err.with_context("operation", "persist_tags"))
}

async fn record_tag_op(
    store: &dyn DocumentStore,
    cache: &EntityCache,
    actor: &Identity,
    action: TagAction,
    room_id: i64,
    tag_name: &str,
) {
    let entry = TagLogEntry {
        entry_type: TAG_ACTION_TYPE.to_string(),
        action,
        room_id,
        room_number: cache.room_number(room_id),
        tag_name: tag_name.to_string(),
        timestamp: now_rfc3339(),
        performed_by: actor.role(),
        performed_by_name: actor.display_name().to_string(),
    };
    activity::record(store, LogEntry::Tag(entry)).await;
}

// ---------------------------------------------------------------------------
// Palette

/// Origin of a palette entry; decides removability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Builtin,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagIcon {
    Bed,
    Droplet,
    Sparkles,
    Package,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDef {
    pub id: String,
    pub kind: TagKind,
    pub name: String,
    pub color_class: String,
    pub icon: TagIcon,
}

fn builtin(id: &str, name: &str, color_class: &str, icon: TagIcon) -> TagDef {
    TagDef {
        id: id.to_string(),
        kind: TagKind::Builtin,
        name: name.to_string(),
        color_class: color_class.to_string(),
        icon,
    }
}

static BUILTIN_TAGS: Lazy<Vec<TagDef>> = Lazy::new(|| {
    vec![
        builtin("bedding", "침구 추가", "bg-blue-100 text-blue-700", TagIcon::Bed),
        builtin("water", "생수 추가", "bg-cyan-100 text-cyan-700", TagIcon::Droplet),
        builtin(
            "amenity",
            "어메니티 추가",
            "bg-purple-100 text-purple-700",
            TagIcon::Sparkles,
        ),
        builtin("towel", "수건 추가", "bg-amber-100 text-amber-700", TagIcon::Package),
    ]
});

/// The pick-list of tags. Built-in entries are fixed; custom entries live
/// only for the session and may be removed again. Removing a palette entry
/// never retracts the tag text from rooms that already carry it.
#[derive(Debug, Clone)]
pub struct TagPalette {
    entries: Vec<TagDef>,
}

impl TagPalette {
    pub fn new() -> Self {
        TagPalette {
            entries: BUILTIN_TAGS.clone(),
        }
    }

    pub fn entries(&self) -> &[TagDef] {
        &self.entries
    }

    pub fn add_custom(
        &mut self,
        name: &str,
        color_class: &str,
        icon: TagIcon,
    ) -> AppResult<TagDef> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::new("TAGS/NAME_REQUIRED", "Tag name is required"));
        }
        if self.entries.iter().any(|def| def.name == name) {
            return Err(
                AppError::new("TAGS/PALETTE_DUPLICATE", "Palette already has this tag")
                    .with_context("name", name.to_string()),
            );
        }
        let def = TagDef {
            id: Uuid::new_v4().to_string(),
            kind: TagKind::Custom,
            name: name.to_string(),
            color_class: color_class.to_string(),
            icon,
        };
        self.entries.push(def.clone());
        Ok(def)
    }

    pub fn remove(&mut self, id: &str) -> AppResult<TagDef> {
        let index = self
            .entries
            .iter()
            .position(|def| def.id == id)
            .ok_or_else(|| {
                AppError::new("TAGS/PALETTE_NOT_FOUND", "No palette entry for id")
                    .with_context("id", id.to_string())
            })?;
        if self.entries[index].kind == TagKind::Builtin {
            return Err(
                AppError::new("TAGS/BUILTIN_FIXED", "Built-in palette tags cannot be removed")
                    .with_context("id", id.to_string()),
            );
        }
        Ok(self.entries.remove(index))
    }
}

impl Default for TagPalette {
    fn default() -> Self {
        TagPalette::new()
    }
}
