//! # Storage Module
//!
//! Persistence for birth records.
//!
//! - **traits**: the `DocumentStore` abstraction (collections of JSON
//!   documents with store-assigned IDs and timestamps)
//! - **connection**: `DbConnection`, the SQLite implementation of that store
//! - **record_store**: `RecordStoreClient`, typed birth-record access on top
//!
//! Every domain component reaches records only through `RecordStoreClient`.

pub mod connection;
pub mod record_store;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use connection::DbConnection;
pub use record_store::{RecordStoreClient, BIRTH_RECORDS_COLLECTION};
pub use traits::{Document, DocumentStore, StoreError};
