//! SQLite storage backend.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::Result;
use crate::models::{Candidate, ResourceRecord};
use crate::storage::ResourceStore;

/// Maximum number of connections in the pool. Kept low for SQLite since it
/// uses file-level locking.
const MAX_CONNECTIONS: u32 = 5;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    image_url TEXT NOT NULL,
    link TEXT NOT NULL,
    sent INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)";

/// SQLite-backed resource store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&db_url)
            .await?;

        // WAL mode for concurrent reads
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Create an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self> {
        // One connection only: every SQLite in-memory connection is its own
        // database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ResourceStore for SqliteStore {
    async fn list_identifiers(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT identifier FROM resources")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn list_unsent(&self) -> Result<Vec<ResourceRecord>> {
        let records = sqlx::query_as::<_, ResourceRecord>(
            "SELECT id, identifier, title, description, image_url, link, sent
             FROM resources WHERE sent = 0 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn insert(&self, candidate: &Candidate) -> Result<()> {
        sqlx::query(
            "INSERT INTO resources (identifier, title, description, image_url, link, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&candidate.identifier)
        .bind(&candidate.title)
        .bind(&candidate.description)
        .bind(&candidate.image_url)
        .bind(&candidate.link)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_sent(&self, store_key: i64, message_id: i64) -> Result<bool> {
        // The sent = 0 guard keeps the marker monotonic.
        let result = sqlx::query("UPDATE resources SET sent = ?1 WHERE id = ?2 AND sent = 0")
            .bind(message_id)
            .bind(store_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            identifier: id.to_string(),
            title: format!("Title {id}"),
            description: format!("Description {id}"),
            image_url: format!("https://cdn.example/{id}.png"),
            link: format!("/contents/media/images/{id}"),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_identifiers() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        store.insert(&candidate("alpha")).await.unwrap();
        store.insert(&candidate("beta")).await.unwrap();

        let ids = store.list_identifiers().await.unwrap();
        assert_eq!(ids, ["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_duplicate_identifier_rejected() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        store.insert(&candidate("alpha")).await.unwrap();
        assert!(store.insert(&candidate("alpha")).await.is_err());
    }

    #[tokio::test]
    async fn test_new_records_are_unsent() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        store.insert(&candidate("alpha")).await.unwrap();

        let unsent = store.list_unsent().await.unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].identifier, "alpha");
        assert_eq!(unsent[0].sent, 0);
    }

    #[tokio::test]
    async fn test_list_unsent_in_insertion_order() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        for id in ["first", "second", "third"] {
            store.insert(&candidate(id)).await.unwrap();
        }

        let ids: Vec<String> = store
            .list_unsent()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.identifier)
            .collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_mark_sent_is_monotonic() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        store.insert(&candidate("alpha")).await.unwrap();
        let key = store.list_unsent().await.unwrap()[0].id;

        assert!(store.mark_sent(key, 1001).await.unwrap());
        assert!(store.list_unsent().await.unwrap().is_empty());

        // A second update must not overwrite the witness.
        assert!(!store.mark_sent(key, 2002).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_sent_unknown_key() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        assert!(!store.mark_sent(99, 1001).await.unwrap());
    }

    #[tokio::test]
    async fn test_open_with_tempfile() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&tmp.path().join("resources.db"))
            .await
            .unwrap();

        store.insert(&candidate("alpha")).await.unwrap();
        assert_eq!(store.list_identifiers().await.unwrap().len(), 1);
        store.close().await;
    }
}
