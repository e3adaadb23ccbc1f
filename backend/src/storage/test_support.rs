use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::traits::{Document, DocumentStore, StoreError};
use super::DbConnection;

/// In-memory store whose individual operations can be switched to fail.
/// Counts the calls that reach it so tests can assert a write never happened.
pub struct FlakyStore {
    inner: DbConnection,
    pub fail_list: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_delete: AtomicBool,
    pub write_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: DbConnection::in_memory().await.expect("Failed to create test database"),
            fail_list: AtomicBool::new(false),
            fail_get: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            write_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    fn outage(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Self::outage(&self.fail_list)?;
        self.inner.list(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Self::outage(&self.fail_get)?;
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<String, StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        Self::outage(&self.fail_writes)?;
        self.inner.create(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        Self::outage(&self.fail_writes)?;
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Self::outage(&self.fail_delete)?;
        self.inner.delete(collection, id).await
    }
}
