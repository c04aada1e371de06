//! The service context. One explicitly constructed `Board` owns the store
//! handle, the auth provider, the entity cache, the session slot and the
//! session-local tag palette — dependency injection instead of ambient
//! globals, with an explicit open/shutdown lifecycle.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::activity::{self, HistoryItem};
use crate::assign::{self, AssignOutcome};
use crate::auth::AuthHandle;
use crate::cache::{EntityCache, SubscriptionManager};
use crate::config::BoardConfig;
use crate::export::{self, ReportRow};
use crate::model::{Assignment, AssignmentAction, AssignmentLogEntry, Room, UnassignMethod, Worker};
use crate::roster;
use crate::session::{self, Identity};
use crate::store::{Collection, MemoryStore, SqliteStore, StoreHandle};
use crate::tags::{self, TagDef, TagIcon, TagPalette};
use crate::{AppError, AppResult};

pub struct Board {
    store: StoreHandle,
    auth: AuthHandle,
    cache: Arc<EntityCache>,
    session: Mutex<Option<Identity>>,
    palette: Mutex<TagPalette>,
    subscriptions: Mutex<Option<SubscriptionManager>>,
}

impl Board {
    /// Open the board against the configured store, or fall back to the
    /// in-memory seed dataset when persistence is not configured.
    pub async fn open(config: &BoardConfig, auth: AuthHandle) -> AppResult<Board> {
        let store: StoreHandle = match &config.database {
            Some(path) => Arc::new(SqliteStore::open(path).await?),
            None => {
                tracing::warn!(
                    event = "store_disabled",
                    "no database configured; running on in-memory seed data"
                );
                Arc::new(MemoryStore::with_seed())
            }
        };
        Ok(Board::with_store(store, auth, config.retain_seed_on_empty))
    }

    /// Build a board over an already-constructed store. Initial snapshots are
    /// applied immediately.
    pub fn with_store(store: StoreHandle, auth: AuthHandle, retain_seed_on_empty: bool) -> Board {
        let board = Board {
            store,
            auth,
            cache: Arc::new(EntityCache::new(retain_seed_on_empty)),
            session: Mutex::new(None),
            palette: Mutex::new(TagPalette::new()),
            subscriptions: Mutex::new(None),
        };
        board.sync();
        board
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Apply the latest snapshot of every collection to the cache. Writes
    /// complete independently of their snapshot echo, so callers that do not
    /// run the live tasks call this to observe their own mutations.
    pub fn sync(&self) {
        for collection in Collection::ALL {
            let receiver = self.store.watch(collection);
            let snapshot = receiver.borrow().clone();
            self.cache.apply(collection, &snapshot);
        }
    }

    /// Spawn the per-collection subscription tasks. Idempotent; a prior
    /// manager is torn down first.
    pub fn start_live_sync(&self) {
        let manager = SubscriptionManager::spawn(&self.store, self.cache.clone());
        let mut guard = lock(&self.subscriptions);
        *guard = Some(manager);
    }

    /// Stop the live subscription tasks, cancelling each collection's query.
    pub fn shutdown(&self) {
        if let Some(mut manager) = lock(&self.subscriptions).take() {
            manager.shutdown();
        }
    }

    // -- session ----------------------------------------------------------

    pub fn identity(&self) -> Option<Identity> {
        lock(&self.session).clone()
    }

    pub fn login_worker(&self, code: &str) -> AppResult<Identity> {
        let identity = session::login_worker(&self.cache, code)?;
        *lock(&self.session) = Some(identity.clone());
        Ok(identity)
    }

    pub async fn login_admin(&self, email: &str, password: &str) -> AppResult<Identity> {
        let identity = session::login_admin(self.auth.as_ref(), email, password).await?;
        *lock(&self.session) = Some(identity.clone());
        Ok(identity)
    }

    /// Re-establish an admin session from the provider's persisted auth
    /// state (the page-reload path).
    pub fn resume_admin(&self, email: &str) -> Identity {
        let identity = Identity::admin(email);
        *lock(&self.session) = Some(identity.clone());
        identity
    }

    pub async fn logout(&self) {
        let identity = lock(&self.session).take();
        if let Some(identity) = identity {
            session::logout(self.auth.as_ref(), &identity).await;
        }
    }

    fn actor(&self) -> AppResult<Identity> {
        self.identity()
            .ok_or_else(|| AppError::new("SESSION/REQUIRED", "로그인이 필요합니다"))
    }

    // -- assignments ------------------------------------------------------

    pub async fn assign(
        &self,
        worker_id: i64,
        room_id: i64,
        date: &str,
    ) -> AppResult<AssignOutcome> {
        let actor = self.actor()?;
        assign::assign(
            self.store.as_ref(),
            &self.cache,
            &actor,
            worker_id,
            room_id,
            date,
        )
        .await
    }

    pub async fn assign_rooms(
        &self,
        worker_id: i64,
        room_ids: &[i64],
        date: &str,
    ) -> AppResult<usize> {
        let actor = self.actor()?;
        assign::assign_rooms(
            self.store.as_ref(),
            &self.cache,
            &actor,
            worker_id,
            room_ids,
            date,
        )
        .await
    }

    pub async fn unassign(
        &self,
        room_id: i64,
        date: &str,
        method: UnassignMethod,
    ) -> AppResult<bool> {
        let actor = self.actor()?;
        assign::unassign(
            self.store.as_ref(),
            &self.cache,
            &actor,
            room_id,
            date,
            method,
        )
        .await
    }

    /// Toggle completion of the assignment occupying a (room, date) slot.
    pub async fn toggle_completion(&self, room_id: i64, date: &str) -> AppResult<Assignment> {
        let actor = self.actor()?;
        let assignment = self.cache.assignment_for_room(room_id, date).ok_or_else(|| {
            AppError::new("ASSIGN/NOT_FOUND", "No assignment for room and date")
                .with_context("room_id", room_id.to_string())
                .with_context("date", date.to_string())
        })?;
        assign::toggle_completion(self.store.as_ref(), &self.cache, &actor, &assignment).await
    }

    // -- tags -------------------------------------------------------------

    pub async fn add_tag(&self, room_id: i64, tag_name: &str) -> AppResult<bool> {
        let actor = self.actor()?;
        tags::add_tag(self.store.as_ref(), &self.cache, &actor, room_id, tag_name).await
    }

    pub async fn remove_tag(&self, room_id: i64, tag_name: &str) -> AppResult<bool> {
        let actor = self.actor()?;
        tags::remove_tag(self.store.as_ref(), &self.cache, &actor, room_id, tag_name).await
    }

    pub fn palette(&self) -> Vec<TagDef> {
        lock(&self.palette).entries().to_vec()
    }

    pub fn add_custom_tag(
        &self,
        name: &str,
        color_class: &str,
        icon: TagIcon,
    ) -> AppResult<TagDef> {
        lock(&self.palette).add_custom(name, color_class, icon)
    }

    pub fn remove_palette_tag(&self, id: &str) -> AppResult<TagDef> {
        lock(&self.palette).remove(id)
    }

    // -- roster -----------------------------------------------------------

    pub async fn add_worker(&self, name: &str) -> AppResult<Worker> {
        self.actor()?;
        roster::add_worker(self.store.as_ref(), &self.cache, name).await
    }

    pub async fn delete_worker(&self, worker_id: i64) -> AppResult<usize> {
        self.actor()?;
        let worker = self.cache.find_worker(worker_id).ok_or_else(|| {
            AppError::new("ROSTER/WORKER_NOT_FOUND", "No such worker")
                .with_context("worker_id", worker_id.to_string())
        })?;
        roster::delete_worker(self.store.as_ref(), &self.cache, &worker).await
    }

    pub async fn set_worker_code(&self, worker_id: i64, code: &str) -> AppResult<String> {
        self.actor()?;
        roster::set_worker_code(self.store.as_ref(), &self.cache, worker_id, code).await
    }

    pub async fn regenerate_worker_code(&self, worker_id: i64) -> AppResult<String> {
        self.actor()?;
        roster::regenerate_worker_code(self.store.as_ref(), &self.cache, worker_id).await
    }

    pub async fn add_room(&self, number: &str) -> AppResult<Room> {
        self.actor()?;
        roster::add_room(self.store.as_ref(), &self.cache, number).await
    }

    pub async fn delete_room(&self, room_id: i64) -> AppResult<usize> {
        self.actor()?;
        let room = self.cache.find_room(room_id).ok_or_else(|| {
            AppError::new("ROSTER/ROOM_NOT_FOUND", "No such room")
                .with_context("room_id", room_id.to_string())
        })?;
        roster::delete_room(self.store.as_ref(), &self.cache, &room).await
    }

    // -- read views -------------------------------------------------------

    pub fn combined_history(&self, date: Option<&str>) -> Vec<HistoryItem> {
        activity::combined_history(&self.cache, date)
    }

    pub fn assignment_log(
        &self,
        date: Option<&str>,
        action: Option<AssignmentAction>,
    ) -> Vec<AssignmentLogEntry> {
        activity::assignment_log(&self.cache, date, action)
    }

    pub fn report_rows(&self, start: &str, end: &str) -> AppResult<Vec<ReportRow>> {
        export::report_rows(&self.cache, start, end)
    }

    pub fn export_workbook(&self, start: &str, end: &str, out_dir: PathBuf) -> AppResult<PathBuf> {
        let rows = export::report_rows(&self.cache, start, end)?;
        export::write_workbook(&rows, start, end, &out_dir)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
