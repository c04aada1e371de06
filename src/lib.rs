//! Core of a hotel housekeeping assignment board: mirrored entity
//! collections kept live by document-store snapshots, an assignment engine
//! enforcing the one-assignment-per-room-per-date invariant, a tag engine,
//! an append-only activity log, identity resolution for admin and worker
//! sessions, and a spreadsheet export of assignment history.

pub mod activity;
pub mod assign;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod id;
pub mod logging;
pub mod model;
pub mod roster;
pub mod seed;
pub mod session;
pub mod state;
pub mod store;
pub mod tags;
pub mod time;

pub use activity::HistoryItem;
pub use assign::AssignOutcome;
pub use auth::{AuthError, AuthHandle, AuthProvider, AuthUser, DisabledAuth};
pub use cache::{Doc, EntityCache, SubscriptionManager, UNKNOWN_LABEL};
pub use config::BoardConfig;
pub use error::{AppError, AppResult};
pub use export::ReportRow;
pub use model::{
    Assignment, AssignmentAction, AssignmentLogEntry, LogEntry, Role, Room, TagAction,
    TagLogEntry, UnassignMethod, Worker,
};
pub use session::Identity;
pub use state::Board;
pub use store::{Collection, Document, DocumentStore, MemoryStore, SqliteStore, StoreHandle};
pub use tags::{TagDef, TagIcon, TagKind, TagPalette};
