//! Domain model for a registered birth.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every serial number
pub const SERIAL_PREFIX: &str = "NG-BR";

/// The registrable facts about a birth, keyed the way they are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthRecordFields {
    pub child_name: String,
    pub dob_year: u16,
    pub dob_month: u8,
    pub dob_day: u8,
    pub time_of_birth: String,
    pub place_of_birth: String,
    pub gender: String,
    pub father_name: String,
    pub mother_name: String,
    pub tribe: String,
    pub address: String,
}

/// Account that created the record. Set once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub id: String,
    pub email: String,
}

/// Domain model for one registered birth, as loaded from the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: BirthRecordFields,
    pub author: Author,
    /// Set by the store when the record is first saved; edits never move it
    #[serde(rename = "createdAt", with = "timestamp_millis")]
    pub created_at: DateTime<Utc>,
    /// Time of the latest write
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,
}

impl BirthRecord {
    /// Human-readable label: `NG-BR-<creation year>-<first six id chars, upper-cased>`
    pub fn serial_number(&self) -> String {
        serial_number(self.created_at.year(), &self.id)
    }

    /// Gender classified case-insensitively
    pub fn gender(&self) -> Gender {
        Gender::classify(&self.fields.gender)
    }

    /// Date of birth as printed on certificates: `day/month/year`
    pub fn formatted_date_of_birth(&self) -> String {
        format!(
            "{}/{}/{}",
            self.fields.dob_day, self.fields.dob_month, self.fields.dob_year
        )
    }
}

/// Derive a serial number from a creation year and record identifier.
pub fn serial_number(creation_year: i32, record_id: &str) -> String {
    let short_id: String = record_id.chars().take(6).collect();
    format!("{}-{}-{}", SERIAL_PREFIX, creation_year, short_id.to_uppercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Anything that is not male or female (ignoring case and padding) counts as `Other`.
    pub fn classify(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other,
        }
    }

    /// Strict parse used when accepting new registrations
    pub fn parse_strict(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Other => write!(f, "other"),
        }
    }
}

/// Timestamps are persisted and hashed at millisecond precision so that a
/// record read back from the store serializes byte-for-byte the same way.
pub mod timestamp_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Format a timestamp the way it is stored
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
