//! Registration service: creating and editing birth records.
//!
//! Every submission is validated in full before the store is contacted. The
//! record's author is the actor who created it and survives later edits.

use chrono::{Datelike, Local, NaiveDate};
use shared::BirthRecordRequest;
use thiserror::Error;
use tracing::{error, info, warn};

use super::models::actor::Actor;
use super::models::birth_record::{BirthRecord, BirthRecordFields, Gender};
use crate::storage::{RecordStoreClient, StoreError};

/// Oldest birth year accepted, counted back from the current year
const MAX_AGE_YEARS: i32 = 120;

pub const RECORD_SAVED: &str = "Record saved successfully";
pub const RECORD_UPDATED: &str = "Record updated successfully";

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Invalid(String),

    #[error("Record not found")]
    NotFound(String),

    #[error("Failed to save record")]
    Store(#[source] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationResult {
    pub record: BirthRecord,
    pub success_message: String,
}

#[derive(Clone)]
pub struct RegistrationService {
    store: RecordStoreClient,
}

impl RegistrationService {
    pub fn new(store: RecordStoreClient) -> Self {
        Self { store }
    }

    /// Register a new birth attributed to `actor`
    pub async fn create(&self, actor: &Actor, request: &BirthRecordRequest) -> Result<RegistrationResult, RegistrationError> {
        info!("Registering birth for {:?} by {}", request.child_name, actor.uid);
        let fields = validate(request, Local::now().date_naive())?;

        let record = self
            .store
            .create(&fields, &actor.as_author())
            .await
            .map_err(|e| {
                error!("Failed to create birth record: {}", e);
                RegistrationError::Store(e)
            })?;

        info!("Created birth record {} ({})", record.id, record.serial_number());
        Ok(RegistrationResult {
            record,
            success_message: RECORD_SAVED.to_string(),
        })
    }

    /// Overwrite an existing record's fields. The original author is kept.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        request: &BirthRecordRequest,
    ) -> Result<RegistrationResult, RegistrationError> {
        info!("Updating birth record {} by {}", id, actor.uid);
        let fields = validate(request, Local::now().date_naive())?;

        let existing = self
            .store
            .get(id)
            .await
            .map_err(RegistrationError::Store)?
            .ok_or_else(|| RegistrationError::NotFound(id.to_string()))?;

        let record = self
            .store
            .update(id, &fields, &existing.author)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => RegistrationError::NotFound(id.to_string()),
                other => {
                    error!("Failed to update birth record {}: {}", id, other);
                    RegistrationError::Store(other)
                }
            })?;

        Ok(RegistrationResult {
            record,
            success_message: RECORD_UPDATED.to_string(),
        })
    }
}

fn required<'a>(value: &'a str, label: &str) -> Result<&'a str, RegistrationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        warn!("Registration rejected: {} missing", label);
        return Err(RegistrationError::Invalid(format!("{} is required", label)));
    }
    Ok(trimmed)
}

fn number<T: std::str::FromStr>(value: &str, label: &str) -> Result<T, RegistrationError> {
    value
        .parse()
        .map_err(|_| RegistrationError::Invalid(format!("{} must be a number", label)))
}

/// Check a submission and turn it into storable fields. `today` bounds the
/// accepted birth dates.
pub fn validate(request: &BirthRecordRequest, today: NaiveDate) -> Result<BirthRecordFields, RegistrationError> {
    let child_name = required(&request.child_name, "Child's Name")?;
    let year = required(&request.dob_year, "Year of Birth")?;
    let month = required(&request.dob_month, "Month of Birth")?;
    let day = required(&request.dob_day, "Day of Birth")?;
    let place_of_birth = required(&request.place_of_birth, "Place of Birth")?;
    let gender = required(&request.gender, "Gender")?;
    let time_of_birth = required(&request.time_of_birth, "Time of Birth")?;
    let father_name = required(&request.father_name, "Father's Name")?;
    let mother_name = required(&request.mother_name, "Mother's Name")?;
    let tribe = required(&request.tribe, "Tribe")?;
    let address = required(&request.address, "Address")?;

    let dob_year: u16 = number(year, "Year of Birth")?;
    let dob_month: u8 = number(month, "Month of Birth")?;
    let dob_day: u8 = number(day, "Day of Birth")?;

    let earliest = today.year() - MAX_AGE_YEARS;
    if i32::from(dob_year) < earliest || i32::from(dob_year) > today.year() {
        return Err(RegistrationError::Invalid(format!(
            "Year of Birth must be between {} and {}",
            earliest,
            today.year()
        )));
    }

    let date = NaiveDate::from_ymd_opt(i32::from(dob_year), u32::from(dob_month), u32::from(dob_day))
        .ok_or_else(|| RegistrationError::Invalid("Date of birth is not a valid date".to_string()))?;
    if date > today {
        return Err(RegistrationError::Invalid("Date of birth cannot be in the future".to_string()));
    }

    let gender = Gender::parse_strict(gender)
        .ok_or_else(|| RegistrationError::Invalid("Gender must be male, female or other".to_string()))?;

    Ok(BirthRecordFields {
        child_name: child_name.to_string(),
        dob_year,
        dob_month,
        dob_day,
        time_of_birth: time_of_birth.to_string(),
        place_of_birth: place_of_birth.to_string(),
        gender: gender.to_string(),
        father_name: father_name.to_string(),
        mother_name: mother_name.to_string(),
        tribe: tribe.to_string(),
        address: address.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::request;
    use super::*;
    use crate::domain::models::actor::fixtures::{admin, clerk};
    use crate::storage::test_support::FlakyStore;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    async fn setup_test() -> (Arc<FlakyStore>, RegistrationService) {
        let store = Arc::new(FlakyStore::new().await);
        let service = RegistrationService::new(RecordStoreClient::new(store.clone()));
        (store, service)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn invalid_message(result: Result<BirthRecordFields, RegistrationError>) -> String {
        match result {
            Err(RegistrationError::Invalid(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        let fields = validate(&request(" Ada Obi ", "Female", "Lagos"), today()).expect("valid");
        assert_eq!(fields.child_name, "Ada Obi");
        assert_eq!(fields.gender, "female");
        assert_eq!((fields.dob_year, fields.dob_month, fields.dob_day), (2021, 3, 14));
    }

    #[test]
    fn test_validate_names_first_missing_field() {
        let mut r = request("Ada Obi", "female", "Lagos");
        r.father_name = "   ".to_string();
        r.tribe.clear();
        assert_eq!(invalid_message(validate(&r, today())), "Father's Name is required");

        let empty = BirthRecordRequest::default();
        assert_eq!(invalid_message(validate(&empty, today())), "Child's Name is required");
    }

    #[test]
    fn test_validate_rejects_bad_dates() {
        let mut r = request("Ada Obi", "female", "Lagos");
        r.dob_month = "2".to_string();
        r.dob_day = "30".to_string();
        assert_eq!(invalid_message(validate(&r, today())), "Date of birth is not a valid date");

        let mut r = request("Ada Obi", "female", "Lagos");
        r.dob_year = "1890".to_string();
        assert_eq!(
            invalid_message(validate(&r, today())),
            "Year of Birth must be between 1904 and 2024"
        );

        let mut r = request("Ada Obi", "female", "Lagos");
        r.dob_year = "2024".to_string();
        r.dob_month = "7".to_string();
        assert_eq!(invalid_message(validate(&r, today())), "Date of birth cannot be in the future");

        let mut r = request("Ada Obi", "female", "Lagos");
        r.dob_day = "fourteen".to_string();
        assert_eq!(invalid_message(validate(&r, today())), "Day of Birth must be a number");
    }

    #[test]
    fn test_validate_rejects_unknown_gender() {
        let r = request("Ada Obi", "unknown", "Lagos");
        assert_eq!(invalid_message(validate(&r, today())), "Gender must be male, female or other");
    }

    #[tokio::test]
    async fn test_create_attributes_record_to_actor() {
        let (_store, service) = setup_test().await;

        let result = service.create(&clerk(), &request("Ada Obi", "female", "Lagos")).await.expect("create");

        assert_eq!(result.success_message, "Record saved successfully");
        assert_eq!(result.record.author, clerk().as_author());
        assert_eq!(result.record.fields.place_of_birth, "Lagos");
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_store() {
        let (store, service) = setup_test().await;
        let mut r = request("Ada Obi", "female", "Lagos");
        r.address.clear();

        let err = service.create(&clerk(), &r).await.unwrap_err();

        assert_eq!(err.to_string(), "Address is required");
        assert_eq!(store.write_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_preserves_author() {
        let (_store, service) = setup_test().await;
        let created = service.create(&clerk(), &request("Ada Obi", "female", "Lagos")).await.unwrap();

        let updated = service
            .update(&admin(), &created.record.id, &request("Ada Obi", "female", "Abuja"))
            .await
            .expect("update");

        assert_eq!(updated.success_message, "Record updated successfully");
        assert_eq!(updated.record.id, created.record.id);
        assert_eq!(updated.record.fields.place_of_birth, "Abuja");
        assert_eq!(updated.record.author, clerk().as_author());
    }

    #[tokio::test]
    async fn test_update_unknown_record() {
        let (store, service) = setup_test().await;

        let err = service
            .update(&admin(), "missing", &request("Ada Obi", "female", "Lagos"))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::NotFound(_)));
        assert_eq!(store.write_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let (store, service) = setup_test().await;
        store.fail_writes.store(true, Ordering::SeqCst);

        let err = service.create(&clerk(), &request("Ada Obi", "female", "Lagos")).await.unwrap_err();

        assert!(matches!(err, RegistrationError::Store(_)));
        assert_eq!(err.to_string(), "Failed to save record");
    }
}
