use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tokio::sync::watch;

use crate::id::new_doc_key;
use crate::store::{merge_patch, Collection, Document, DocumentStore, Snapshot};
use crate::{AppError, AppResult};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (\n    collection TEXT NOT NULL,\n    key        TEXT NOT NULL,\n    data       TEXT NOT NULL,\n    PRIMARY KEY (collection, key)\n)";

/// SQLite-backed document store. One `documents` table holds every collection;
/// snapshots are re-queried after each mutation and fanned out over watch
/// channels.
pub struct SqliteStore {
    pool: SqlitePool,
    channels: HashMap<Collection, watch::Sender<Snapshot>>,
}

impl SqliteStore {
    pub async fn open(path: &Path) -> AppResult<Self> {
        let pool = open_pool(path).await.map_err(|err| {
            AppError::from(err).with_context("path", path.display().to_string())
        })?;
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(AppError::from)?;

        let channels: HashMap<Collection, watch::Sender<Snapshot>> = Collection::ALL
            .iter()
            .map(|&collection| {
                let empty: Snapshot = Arc::new(Vec::new());
                (collection, watch::channel(empty).0)
            })
            .collect();
        let store = SqliteStore { pool, channels };
        for collection in Collection::ALL {
            store.refresh(collection).await?;
        }
        Ok(store)
    }

    async fn load(&self, collection: Collection) -> AppResult<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT key, data FROM documents WHERE collection = ?1 ORDER BY key",
        )
        .bind(collection.name())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            AppError::from(err).with_context("collection", collection.name())
        })?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("key").map_err(AppError::from)?;
            let raw: String = row.try_get("data").map_err(AppError::from)?;
            match serde_json::from_str::<Value>(&raw) {
                Ok(data) => docs.push(Document { key, data }),
                Err(err) => {
                    // Corrupt rows are skipped, not fatal; the rest of the
                    // collection stays readable.
                    tracing::warn!(
                        event = "document_decode_failed",
                        collection = collection.name(),
                        key = %key,
                        error = %err
                    );
                }
            }
        }
        Ok(docs)
    }

    async fn refresh(&self, collection: Collection) -> AppResult<()> {
        let docs = self.load(collection).await?;
        if let Some(sender) = self.channels.get(&collection) {
            sender.send_replace(Arc::new(docs));
        }
        Ok(())
    }
}

async fn open_pool(path: &Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .after_connect(|conn, _| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys=ON;")
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("PRAGMA busy_timeout = 5000;")
                    .execute(&mut *conn)
                    .await?;
                Ok::<_, sqlx::Error>(())
            })
        })
        .connect_with(opts)
        .await?;

    let journal: (String,) = sqlx::query_as("PRAGMA journal_mode;")
        .fetch_one(&pool)
        .await
        .unwrap_or((String::from("unknown"),));
    tracing::info!(
        event = "store_open",
        path = %path.display(),
        journal_mode = %journal.0
    );
    if !journal.0.eq_ignore_ascii_case("wal") {
        tracing::warn!(
            event = "store_open_warning",
            msg = "journal_mode != WAL; running with reduced crash safety"
        );
    }

    Ok(pool)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn add(&self, collection: Collection, data: Value) -> AppResult<String> {
        if !data.is_object() {
            return Err(AppError::new(
                "STORE/PAYLOAD",
                "Document payload must be a JSON object",
            )
            .with_context("collection", collection.name()));
        }
        let key = new_doc_key();
        let raw = serde_json::to_string(&data).map_err(AppError::from)?;
        sqlx::query("INSERT INTO documents (collection, key, data) VALUES (?1, ?2, ?3)")
            .bind(collection.name())
            .bind(&key)
            .bind(&raw)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "add")
                    .with_context("collection", collection.name())
            })?;
        self.refresh(collection).await?;
        Ok(key)
    }

    async fn update(
        &self,
        collection: Collection,
        key: &str,
        patch: Map<String, Value>,
    ) -> AppResult<()> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT data FROM documents WHERE collection = ?1 AND key = ?2")
                .bind(collection.name())
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::from)?;
        let Some(raw) = raw else {
            return Err(AppError::new("STORE/NOT_FOUND", "No document for key")
                .with_context("collection", collection.name())
                .with_context("key", key.to_string()));
        };

        let mut data: Value = serde_json::from_str(&raw).map_err(AppError::from)?;
        let Some(target) = data.as_object_mut() else {
            return Err(AppError::new(
                "STORE/PAYLOAD",
                "Stored document is not a JSON object",
            )
            .with_context("collection", collection.name())
            .with_context("key", key.to_string()));
        };
        merge_patch(target, patch);
        let merged = serde_json::to_string(&data).map_err(AppError::from)?;

        sqlx::query("UPDATE documents SET data = ?1 WHERE collection = ?2 AND key = ?3")
            .bind(&merged)
            .bind(collection.name())
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "update")
                    .with_context("collection", collection.name())
                    .with_context("key", key.to_string())
            })?;
        self.refresh(collection).await
    }

    async fn delete(&self, collection: Collection, key: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND key = ?2")
            .bind(collection.name())
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "delete")
                    .with_context("collection", collection.name())
                    .with_context("key", key.to_string())
            })?;
        if result.rows_affected() > 0 {
            self.refresh(collection).await?;
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
