//! # Domain Layer
//!
//! Business logic of the birth registry, independent of HTTP.
//!
//! - **models**: birth records, serial numbers, actors
//! - **hashing**: tamper-evidence digest over a record
//! - **verification**: verification URL and its QR code
//! - **certificate**: page layout and PDF output
//! - **record_list**: load, search, delete and render over the record collection
//! - **registration_service**: validated create and edit
//! - **verification_service**: checking a certificate's link against the store
//! - **auth**: authentication state subscriptions

pub mod auth;
pub mod certificate;
pub mod hashing;
pub mod models;
pub mod record_list;
pub mod registration_service;
pub mod verification;
pub mod verification_service;

pub use auth::{AuthState, AuthStateHub, AuthSubscription};
pub use certificate::{CertificateError, CertificateRenderer, RenderedCertificate};
pub use record_list::{ListedRecord, RecordListController, RecordListError};
pub use registration_service::{RegistrationError, RegistrationResult, RegistrationService};
pub use verification::{QrCodeEncoder, QrEncoder};
pub use verification_service::{VerificationError, VerificationOutcome, VerificationService};
