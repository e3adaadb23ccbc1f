use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::traits::{Document, DocumentStore, StoreError};

/// DbConnection is the SQLite-backed document store
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url`
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database at {}", url))?;

        Self::setup_schema(&pool).await?;
        info!("Document store ready at {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// A private in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                fields TEXT NOT NULL,
                created_at TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create documents table")?;

        Self::migrate_created_at(pool).await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_documents_collection_created_at
            ON documents(collection, created_at);
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create documents index")?;

        Ok(())
    }

    /// Databases created before `created_at` existed get the column added and
    /// backfilled from the last write time.
    async fn migrate_created_at(pool: &SqlitePool) -> Result<()> {
        let columns = sqlx::query("PRAGMA table_info(documents)")
            .fetch_all(pool)
            .await
            .context("Failed to inspect documents table")?;
        let has_created_at = columns
            .iter()
            .any(|row| row.try_get::<String, _>("name").map(|name| name == "created_at").unwrap_or(false));
        if has_created_at {
            return Ok(());
        }

        info!("Adding created_at column to documents table");
        sqlx::query("ALTER TABLE documents ADD COLUMN created_at TEXT")
            .execute(pool)
            .await
            .context("Failed to add created_at column")?;
        sqlx::query("UPDATE documents SET created_at = timestamp WHERE created_at IS NULL")
            .execute(pool)
            .await
            .context("Failed to backfill created_at")?;

        Ok(())
    }

    fn server_timestamp() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn parse_time(id: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Malformed {
                id: id.to_string(),
                reason: format!("bad timestamp {:?}: {}", raw, e),
            })
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<Document, StoreError> {
        let id: String = row.try_get("id")?;
        let raw_fields: String = row.try_get("fields")?;
        let raw_created_at: Option<String> = row.try_get("created_at")?;
        let raw_timestamp: String = row.try_get("timestamp")?;

        let fields = match serde_json::from_str::<Value>(&raw_fields)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Malformed {
                    id,
                    reason: format!("expected an object, found {}", other),
                })
            }
        };

        let timestamp = Self::parse_time(&id, &raw_timestamp)?;
        let created_at = Self::parse_time(&id, raw_created_at.as_deref().unwrap_or(&raw_timestamp))?;

        Ok(Document {
            id,
            fields,
            created_at,
            timestamp,
        })
    }
}

#[async_trait]
impl DocumentStore for DbConnection {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, fields, created_at, timestamp FROM documents WHERE collection = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(collection)
        .fetch_all(self.pool())
        .await?;

        debug!("Fetched {} documents from {}", rows.len(), collection);
        rows.iter().map(Self::row_to_document).collect()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT id, fields, created_at, timestamp FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let encoded = serde_json::to_string(&Value::Object(fields))?;

        let now = Self::server_timestamp();

        sqlx::query("INSERT INTO documents (collection, id, fields, created_at, timestamp) VALUES (?, ?, ?, ?, ?)")
            .bind(collection)
            .bind(&id)
            .bind(encoded)
            .bind(&now)
            .bind(&now)
            .execute(self.pool())
            .await?;

        debug!("Created document {} in {}", id, collection);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&Value::Object(fields))?;

        let result = sqlx::query("UPDATE documents SET fields = ?, timestamp = ? WHERE collection = ? AND id = ?")
            .bind(encoded)
            .bind(Self::server_timestamp())
            .bind(collection)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_test() -> DbConnection {
        DbConnection::in_memory().await.expect("Failed to create test database")
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamp() {
        let db = setup_test().await;

        let id = db.create("birthRecords", fields(json!({"childName": "Ada"}))).await.expect("create");
        assert_eq!(id.len(), 32);

        let doc = db.get("birthRecords", &id).await.expect("get").expect("document exists");
        assert_eq!(doc.id, id);
        assert_eq!(doc.fields["childName"], "Ada");
        assert!(doc.timestamp <= Utc::now());
        assert_eq!(doc.created_at, doc.timestamp);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_collection() {
        let db = setup_test().await;

        db.create("birthRecords", fields(json!({"n": 1}))).await.unwrap();
        db.create("birthRecords", fields(json!({"n": 2}))).await.unwrap();
        db.create("auditLog", fields(json!({"n": 3}))).await.unwrap();

        let docs = db.list("birthRecords").await.expect("list");
        assert_eq!(docs.len(), 2);
        assert!(db.list("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let db = setup_test().await;

        let id = db.create("birthRecords", fields(json!({"a": 1, "b": 2}))).await.unwrap();
        db.update("birthRecords", &id, fields(json!({"a": 5}))).await.expect("update");

        let doc = db.get("birthRecords", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["a"], 5);
        assert!(doc.fields.get("b").is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let db = setup_test().await;

        let id = db.create("birthRecords", fields(json!({"a": 1}))).await.unwrap();
        sqlx::query("UPDATE documents SET created_at = ?, timestamp = ? WHERE id = ?")
            .bind("2020-02-03T04:05:06.789Z")
            .bind("2020-02-03T04:05:06.789Z")
            .bind(&id)
            .execute(db.pool())
            .await
            .unwrap();

        db.update("birthRecords", &id, fields(json!({"a": 2}))).await.expect("update");

        let doc = db.get("birthRecords", &id).await.unwrap().unwrap();
        assert_eq!(doc.created_at.to_rfc3339_opts(SecondsFormat::Millis, true), "2020-02-03T04:05:06.789Z");
        assert!(doc.timestamp > doc.created_at);
    }

    #[tokio::test]
    async fn test_legacy_table_gets_created_at() {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE documents (collection TEXT NOT NULL, id TEXT NOT NULL, fields TEXT NOT NULL, \
             timestamp TEXT NOT NULL, PRIMARY KEY (collection, id))",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO documents (collection, id, fields, timestamp) VALUES ('birthRecords', 'old1', '{}', ?)")
            .bind("2019-07-01T00:00:00.000Z")
            .execute(&pool)
            .await
            .unwrap();

        DbConnection::setup_schema(&pool).await.expect("migrate");
        let db = DbConnection { pool: Arc::new(pool) };

        let doc = db.get("birthRecords", "old1").await.unwrap().unwrap();
        assert_eq!(doc.created_at, doc.timestamp);
        assert_eq!(doc.created_at.to_rfc3339_opts(SecondsFormat::Millis, true), "2019-07-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let db = setup_test().await;

        let result = db.update("birthRecords", "missing", Map::new()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_document() {
        let db = setup_test().await;

        let id = db.create("birthRecords", fields(json!({"a": 1}))).await.unwrap();
        db.delete("birthRecords", &id).await.expect("delete");

        assert!(db.get("birthRecords", &id).await.unwrap().is_none());
        assert!(matches!(
            db.delete("birthRecords", &id).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
