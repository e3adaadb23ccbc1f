//! Record List Controller
//!
//! Holds one actor's view of the birth records: the full collection as last
//! loaded, the subset matching the current search, and summary counts.
//!
//! ## Rules
//!
//! - Searching never touches the store
//! - Deletion is admin-only; the authorization flag comes from the caller's
//!   [`Actor`], never from ambient state
//! - In-memory collections change only after the store confirms a delete

use shared::{CertificateMode, RecordStats};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::certificate::{CertificateError, CertificateRenderer, RenderedCertificate};
use super::hashing::canonical_json;
use super::models::actor::Actor;
use super::models::birth_record::{BirthRecord, Gender};
use crate::storage::{RecordStoreClient, StoreError};

#[derive(Debug, Error)]
pub enum RecordListError {
    #[error("Failed to load records")]
    LoadFailed(#[source] StoreError),

    #[error("Admin only")]
    Unauthorized,

    #[error("Record not found")]
    NotFound(String),

    #[error("Delete failed")]
    DeleteFailed(#[source] StoreError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),
}

/// A loaded record with its derived serial number
#[derive(Debug, Clone, PartialEq)]
pub struct ListedRecord {
    pub record: BirthRecord,
    pub serial_number: String,
    /// Lower-cased serialized record plus serial number
    search_text: String,
}

impl ListedRecord {
    fn new(record: BirthRecord) -> Self {
        let serial_number = record.serial_number();
        let serialized = canonical_json(&record).unwrap_or_else(|e| {
            warn!("Record {} could not be serialized for search: {}", record.id, e);
            String::new()
        });
        let search_text = format!("{} {}", serialized, serial_number).to_lowercase();
        Self {
            record,
            serial_number,
            search_text,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.search_text.contains(needle)
    }
}

pub fn compute_stats<'a>(records: impl IntoIterator<Item = &'a BirthRecord>) -> RecordStats {
    records.into_iter().fold(RecordStats::default(), |mut stats, record| {
        stats.total += 1;
        match record.gender() {
            Gender::Male => stats.male += 1,
            Gender::Female => stats.female += 1,
            Gender::Other => stats.other += 1,
        }
        stats
    })
}

pub struct RecordListController {
    store: RecordStoreClient,
    renderer: Arc<CertificateRenderer>,
    records: Vec<ListedRecord>,
    filtered: Vec<ListedRecord>,
    query: String,
    stats: RecordStats,
}

impl RecordListController {
    pub fn new(store: RecordStoreClient, renderer: Arc<CertificateRenderer>) -> Self {
        Self {
            store,
            renderer,
            records: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            stats: RecordStats::default(),
        }
    }

    /// Replace the in-memory collection with the store's current contents.
    /// On failure the list is left empty.
    pub async fn load(&mut self) -> Result<RecordStats, RecordListError> {
        match self.store.list().await {
            Ok(records) => {
                self.records = records.into_iter().map(ListedRecord::new).collect();
                self.stats = compute_stats(self.records.iter().map(|r| &r.record));
                self.refilter();
                info!(
                    "Record list loaded: {} total, {} male, {} female",
                    self.stats.total, self.stats.male, self.stats.female
                );
                Ok(self.stats)
            }
            Err(e) => {
                error!("Failed to load records: {}", e);
                self.records.clear();
                self.filtered.clear();
                self.stats = RecordStats::default();
                Err(RecordListError::LoadFailed(e))
            }
        }
    }

    /// Filter by case-insensitive substring over each record's serialized
    /// text. A blank query shows everything.
    pub fn search(&mut self, query: &str) -> &[ListedRecord] {
        self.query = query.trim().to_lowercase();
        self.refilter();
        &self.filtered
    }

    fn refilter(&mut self) {
        self.filtered = if self.query.is_empty() {
            self.records.clone()
        } else {
            self.records
                .iter()
                .filter(|r| r.matches(&self.query))
                .cloned()
                .collect()
        };
    }

    pub async fn delete(&mut self, actor: &Actor, id: &str) -> Result<(), RecordListError> {
        if !actor.is_admin {
            warn!("Delete of {} refused for non-admin {}", id, actor.uid);
            return Err(RecordListError::Unauthorized);
        }
        if !self.records.iter().any(|r| r.record.id == id) {
            return Err(RecordListError::NotFound(id.to_string()));
        }

        if let Err(e) = self.store.delete(id).await {
            error!("Delete of record {} failed: {}", id, e);
            return Err(RecordListError::DeleteFailed(e));
        }

        self.records.retain(|r| r.record.id != id);
        self.filtered.retain(|r| r.record.id != id);
        self.stats = compute_stats(self.records.iter().map(|r| &r.record));
        info!("Record {} deleted by {}", id, actor.uid);
        Ok(())
    }

    /// Render a certificate for a loaded record. List state is untouched
    /// whether or not rendering succeeds.
    pub fn render(&self, id: &str, mode: CertificateMode) -> Result<RenderedCertificate, RecordListError> {
        let listed = self
            .find(id)
            .ok_or_else(|| RecordListError::NotFound(id.to_string()))?;
        Ok(self.renderer.render(&listed.record, mode)?)
    }

    pub fn find(&self, id: &str) -> Option<&ListedRecord> {
        self.records.iter().find(|r| r.record.id == id)
    }

    pub fn records(&self) -> &[ListedRecord] {
        &self.records
    }

    pub fn filtered(&self) -> &[ListedRecord] {
        &self.filtered
    }

    pub fn stats(&self) -> RecordStats {
        self.stats
    }
}
