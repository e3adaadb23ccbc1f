//! Backend for the public verification page reached from a certificate's QR code.

use thiserror::Error;
use tracing::{info, warn};

use super::hashing::tamper_evidence_hash;
use crate::storage::{RecordStoreClient, StoreError};

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Record not found")]
    NotFound(String),

    #[error("Verification failed")]
    Store(#[from] StoreError),

    #[error("Verification failed")]
    Hash(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// The presented digest matches the record as currently stored
    pub valid: bool,
    pub record_id: String,
    pub serial_number: String,
    pub child_name: String,
    pub date_of_birth: String,
}

#[derive(Clone)]
pub struct VerificationService {
    store: RecordStoreClient,
}

impl VerificationService {
    pub fn new(store: RecordStoreClient) -> Self {
        Self { store }
    }

    /// Recompute the digest of the stored record and compare it with the one
    /// from the verification link. Hex case is ignored.
    pub async fn verify(&self, id: &str, presented_hash: &str) -> Result<VerificationOutcome, VerificationError> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| VerificationError::NotFound(id.to_string()))?;

        let current = tamper_evidence_hash(&record)?;
        let valid = current.eq_ignore_ascii_case(presented_hash.trim());

        if valid {
            info!("Certificate for record {} verified", id);
        } else {
            warn!("Certificate hash mismatch for record {}", id);
        }

        Ok(VerificationOutcome {
            valid,
            record_id: record.id.clone(),
            serial_number: record.serial_number(),
            child_name: record.fields.child_name.clone(),
            date_of_birth: record.formatted_date_of_birth(),
        })
    }
}
