//! Record Store Client: typed access to the `birthRecords` collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::traits::{Document, DocumentStore, StoreError};
use crate::domain::models::birth_record::{Author, BirthRecord, BirthRecordFields};

pub const BIRTH_RECORDS_COLLECTION: &str = "birthRecords";

/// Stored shape of a birth record document (everything except the ID and
/// the server-assigned times, which the store owns).
#[derive(Serialize, Deserialize)]
struct StoredBirthRecord {
    #[serde(flatten)]
    fields: BirthRecordFields,
    author: Author,
}

#[derive(Clone)]
pub struct RecordStoreClient {
    store: Arc<dyn DocumentStore>,
}

impl RecordStoreClient {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load every birth record. Documents that cannot be decoded are skipped
    /// with a warning rather than failing the whole listing.
    pub async fn list(&self) -> Result<Vec<BirthRecord>, StoreError> {
        let documents = self.store.list(BIRTH_RECORDS_COLLECTION).await?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            match Self::decode(document) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable birth record: {}", e),
            }
        }

        info!("Loaded {} birth records", records.len());
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<Option<BirthRecord>, StoreError> {
        self.store
            .get(BIRTH_RECORDS_COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    /// Create a record and return it as the store now holds it
    pub async fn create(&self, fields: &BirthRecordFields, author: &Author) -> Result<BirthRecord, StoreError> {
        let id = self
            .store
            .create(BIRTH_RECORDS_COLLECTION, Self::encode(fields, author)?)
            .await?;

        self.get(&id).await?.ok_or_else(|| StoreError::NotFound {
            collection: BIRTH_RECORDS_COLLECTION.to_string(),
            id,
        })
    }

    /// Overwrite a record's fields. The author is written back unchanged.
    pub async fn update(&self, id: &str, fields: &BirthRecordFields, author: &Author) -> Result<BirthRecord, StoreError> {
        self.store
            .update(BIRTH_RECORDS_COLLECTION, id, Self::encode(fields, author)?)
            .await?;

        self.get(id).await?.ok_or_else(|| StoreError::NotFound {
            collection: BIRTH_RECORDS_COLLECTION.to_string(),
            id: id.to_string(),
        })
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(BIRTH_RECORDS_COLLECTION, id).await
    }

    fn encode(fields: &BirthRecordFields, author: &Author) -> Result<Map<String, Value>, StoreError> {
        let stored = StoredBirthRecord {
            fields: fields.clone(),
            author: author.clone(),
        };
        match serde_json::to_value(stored)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Malformed {
                id: String::new(),
                reason: format!("record encoded as {} instead of an object", other),
            }),
        }
    }

    fn decode(document: Document) -> Result<BirthRecord, StoreError> {
        let Document {
            id,
            fields,
            created_at,
            timestamp,
        } = document;
        let stored: StoredBirthRecord =
            serde_json::from_value(Value::Object(fields)).map_err(|e| StoreError::Malformed {
                id: id.clone(),
                reason: e.to_string(),
            })?;

        Ok(BirthRecord {
            id,
            fields: stored.fields,
            author: stored.author,
            created_at,
            timestamp,
        })
    }
}
