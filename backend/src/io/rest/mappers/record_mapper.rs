use shared::{Author as AuthorDto, BirthRecord as BirthRecordDto, VerificationResponse};

use crate::domain::models::birth_record::{format_timestamp, Author, BirthRecord};
use crate::domain::record_list::ListedRecord;
use crate::domain::verification_service::VerificationOutcome;

pub struct RecordMapper;

impl RecordMapper {
    pub fn author_to_dto(author: Author) -> AuthorDto {
        AuthorDto {
            name: author.name,
            id: author.id,
            email: author.email,
        }
    }

    /// Convert a domain record to the API shape, attaching its serial number
    pub fn to_dto(record: BirthRecord) -> BirthRecordDto {
        let serial_number = record.serial_number();
        let created_at = format_timestamp(&record.created_at);
        let timestamp = format_timestamp(&record.timestamp);
        let f = record.fields;
        BirthRecordDto {
            id: record.id,
            serial_number,
            child_name: f.child_name,
            dob_year: f.dob_year,
            dob_month: f.dob_month,
            dob_day: f.dob_day,
            time_of_birth: f.time_of_birth,
            place_of_birth: f.place_of_birth,
            gender: f.gender,
            father_name: f.father_name,
            mother_name: f.mother_name,
            tribe: f.tribe,
            address: f.address,
            author: Self::author_to_dto(record.author),
            created_at,
            timestamp,
        }
    }

    pub fn listed_to_dto_list(listed: &[ListedRecord]) -> Vec<BirthRecordDto> {
        listed.iter().map(|l| Self::to_dto(l.record.clone())).collect()
    }

    pub fn verification_to_dto(outcome: VerificationOutcome) -> VerificationResponse {
        let message = if outcome.valid {
            "Certificate is authentic"
        } else {
            "Certificate does not match the registered record"
        };
        VerificationResponse {
            valid: outcome.valid,
            record_id: outcome.record_id,
            serial_number: outcome.serial_number,
            child_name: outcome.child_name,
            date_of_birth: outcome.date_of_birth,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::birth_record::fixtures::record;

    #[test]
    fn test_to_dto_carries_serial_and_timestamp() {
        let dto = RecordMapper::to_dto(record("abc123xyz", "Ada Obi", "female", "Lagos"));

        assert_eq!(dto.id, "abc123xyz");
        assert_eq!(dto.serial_number, "NG-BR-2024-ABC123");
        assert_eq!(dto.timestamp, "2024-05-17T09:15:00.000Z");
        assert_eq!(dto.created_at, "2024-05-17T09:15:00.000Z");
        assert_eq!(dto.author.email, "registrar@example.org");
        assert_eq!(dto.place_of_birth, "Lagos");
    }

    #[test]
    fn test_verification_message() {
        let outcome = VerificationOutcome {
            valid: false,
            record_id: "abc123".to_string(),
            serial_number: "NG-BR-2024-ABC123".to_string(),
            child_name: "Ada Obi".to_string(),
            date_of_birth: "14/3/2021".to_string(),
        };
        let dto = RecordMapper::verification_to_dto(outcome);
        assert!(!dto.valid);
        assert_eq!(dto.message, "Certificate does not match the registered record");
    }
}
