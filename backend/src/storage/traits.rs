//! # Storage Traits
//!
//! The document store is the persistence boundary of the service. It mirrors
//! the shape of a hosted document database: named collections of JSON
//! documents, identifiers and timestamps assigned by the store, never by the
//! caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document: opaque ID, field map, and two server-assigned times.
/// `created_at` is set once on insert; `timestamp` moves on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous CRUD over collections of documents. Every call may fail and
/// is attempted exactly once.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in a collection, oldest first
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// A single document, if present
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert a document and return the identifier the store assigned
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<String, StoreError>;

    /// Replace a document's fields and refresh its timestamp. `created_at` is kept.
    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Remove a document
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
