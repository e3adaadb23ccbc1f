use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the account that registered a birth record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub id: String,
    pub email: String,
}

/// A birth record as exposed over the API.
///
/// `serial_number` is derived from the creation year and the record ID and is
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthRecord {
    pub id: String,
    pub serial_number: String,
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
    pub author: Author,
    /// Server-assigned creation time (RFC 3339); the serial number's year
    pub created_at: String,
    /// Server-assigned time of the latest write (RFC 3339)
    pub timestamp: String,
}

/// Form payload for registering or editing a birth.
///
/// Every field arrives as text, exactly as the registration form submits it;
/// the date parts are parsed and range-checked server side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BirthRecordRequest {
    pub child_name: String,
    pub dob_year: String,
    pub dob_month: String,
    pub dob_day: String,
    pub place_of_birth: String,
    pub gender: String,
    pub time_of_birth: String,
    pub father_name: String,
    pub mother_name: String,
    pub tribe: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthRecordResponse {
    pub record: BirthRecord,
    pub success_message: String,
}

/// Summary counts shown on the records dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    pub total: usize,
    pub male: usize,
    pub female: usize,
    /// Records whose gender is neither male nor female
    pub other: usize,
}

/// Query parameters for listing records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordListRequest {
    /// Case-insensitive substring filter; blank returns everything
    pub q: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordListResponse {
    pub records: Vec<BirthRecord>,
    pub stats: RecordStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRecordResponse {
    pub deleted_id: String,
    pub success_message: String,
}

/// How a generated certificate is handed to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateMode {
    /// Saved as `<childName>_Birth_Certificate.pdf`
    #[default]
    Download,
    /// Opened in a new viewing context with the print dialog triggered
    Print,
}

impl fmt::Display for CertificateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateMode::Download => write!(f, "download"),
            CertificateMode::Print => write!(f, "print"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateRequest {
    #[serde(default)]
    pub mode: CertificateMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCertificateResponse {
    pub success: bool,
    pub message: String,
    pub file_name: String,
    pub file_path: String,
}

/// Result of checking a certificate's verification link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub valid: bool,
    pub record_id: String,
    pub serial_number: String,
    pub child_name: String,
    pub date_of_birth: String,
    pub message: String,
}

/// Authentication state change pushed by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStateRequest {
    pub signed_in: bool,
    pub uid: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStateResponse {
    pub signed_in: bool,
    pub subscribers_notified: usize,
}

/// Error body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}
