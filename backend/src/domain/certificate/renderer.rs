//! Certificate Renderer
//!
//! Lays out one birth certificate page and hands back the finished document.
//! Drawing happens in a fixed order: border, watermark, title and serial,
//! tamper-evidence hash, verification QR code, field table, signature block,
//! footer, and finally emission. The hash is taken from the record before
//! anything about the rendering is known, so it matches what a verifier
//! recomputes from the store.

use chrono::{Local, NaiveDate};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use shared::CertificateMode;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info};

use super::canvas::{CanvasError, CertificateCanvas, Point, Rect, Rgb, Stroke, Table, TextStyle};
use super::pdf_canvas::PdfCanvas;
use crate::domain::hashing::tamper_evidence_hash;
use crate::domain::models::birth_record::BirthRecord;
use crate::domain::verification::{verification_url, QrEncodeError, QrEncoder};

const GOLD: Rgb = Rgb(201, 162, 39);
const DARK: Rgb = Rgb(31, 41, 55);
const WATERMARK_GREY: Rgb = Rgb::grey(200);
const WATERMARK_OPACITY: f32 = 0.15;

const FILE_NAME_SUFFIX: &str = "_Birth_Certificate.pdf";
const FALLBACK_FILE_STEM: &str = "certificate";
const FALLBACK_RECORD_DIR: &str = "record";

/// Left unescaped in `filename*`: alphanumerics and `-._~`
const FILENAME_ATTR: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Why a render did not complete. Kept for the logs; callers only see
/// [`CertificateError`]'s generic notice.
#[derive(Debug, Error)]
pub enum RenderFailure {
    #[error("record could not be hashed: {0}")]
    Hash(#[from] serde_json::Error),

    #[error(transparent)]
    QrCode(#[from] QrEncodeError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("certificate could not be saved: {0}")]
    Emit(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Certificate generation failed")]
pub struct CertificateError {
    pub record_id: String,
    #[source]
    pub cause: RenderFailure,
}

impl CertificateError {
    fn logged(record_id: &str, cause: RenderFailure) -> Self {
        error!("❌ CERTIFICATE: Generation failed for record {}: {}", record_id, cause);
        Self {
            record_id: record_id.to_string(),
            cause,
        }
    }
}

/// A finished certificate. Never cached; rendered again on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCertificate {
    pub record_id: String,
    pub file_name: String,
    pub mode: CertificateMode,
    pub serial_number: String,
    pub hash: String,
    pub verification_url: String,
    pub bytes: Vec<u8>,
}

impl RenderedCertificate {
    pub fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    /// `inline` for print mode so the viewer opens it, `attachment` for downloads
    pub fn content_disposition(&self) -> String {
        let disposition = match self.mode {
            CertificateMode::Print => "inline",
            CertificateMode::Download => "attachment",
        };
        let ascii: String = self
            .file_name
            .chars()
            .map(|c| if c.is_ascii() && c != '"' && !c.is_ascii_control() { c } else { '_' })
            .collect();
        format!(
            "{}; filename=\"{}\"; filename*=UTF-8''{}",
            disposition,
            ascii,
            utf8_percent_encode(&self.file_name, FILENAME_ATTR)
        )
    }

    /// Write the document to `dir/<record id>/<file name>`. Records that share
    /// a child's name never share a path, and exporting the same record again
    /// replaces its earlier copy. The file appears only once fully written; a
    /// failed write leaves nothing behind.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, CertificateError> {
        self.write_atomically(dir)
            .map_err(|e| CertificateError::logged(&self.record_id, RenderFailure::Emit(e)))
    }

    fn write_atomically(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let record_dir = dir.join(record_dir_name(&self.record_id));
        fs::create_dir_all(&record_dir)?;
        let target = record_dir.join(&self.file_name);

        // Unpersisted temp files are removed when dropped
        let mut temp = NamedTempFile::new_in(&record_dir)?;
        temp.write_all(&self.bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&target)?;

        info!("✅ CERTIFICATE: Saved {} ({} bytes)", target.display(), self.bytes.len());
        Ok(target)
    }
}

fn record_dir_name(record_id: &str) -> String {
    let name: String = record_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        FALLBACK_RECORD_DIR.to_string()
    } else {
        name
    }
}

/// `<childName>_Birth_Certificate.pdf`, with anything that would escape the
/// target directory or break a file system replaced by `_`.
pub fn certificate_file_name(child_name: &str) -> String {
    let replaced: String = child_name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    let stem = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    let stem = if stem.is_empty() { FALLBACK_FILE_STEM } else { stem };
    format!("{}{}", stem, FILE_NAME_SUFFIX)
}

pub struct CertificateRenderer {
    origin: String,
    encoder: Arc<dyn QrEncoder>,
}

impl CertificateRenderer {
    /// `origin` is the public site that serves verification pages
    pub fn new(origin: impl Into<String>, encoder: Arc<dyn QrEncoder>) -> Self {
        Self {
            origin: origin.into(),
            encoder,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Render onto a fresh A4 PDF page, dated today
    pub fn render(&self, record: &BirthRecord, mode: CertificateMode) -> Result<RenderedCertificate, CertificateError> {
        self.render_on(record, mode, PdfCanvas::a4(), Local::now().date_naive())
    }

    pub fn render_on<C: CertificateCanvas>(
        &self,
        record: &BirthRecord,
        mode: CertificateMode,
        canvas: C,
        issued_on: NaiveDate,
    ) -> Result<RenderedCertificate, CertificateError> {
        info!("📄 CERTIFICATE: Rendering {} certificate for record {}", mode, record.id);
        self.draw(record, mode, canvas, issued_on)
            .map_err(|cause| CertificateError::logged(&record.id, cause))
    }

    fn draw<C: CertificateCanvas>(
        &self,
        record: &BirthRecord,
        mode: CertificateMode,
        mut canvas: C,
        issued_on: NaiveDate,
    ) -> Result<RenderedCertificate, RenderFailure> {
        // 1. Border
        canvas.rect(
            Rect { x: 6.0, y: 6.0, width: 198.0, height: 285.0 },
            Stroke { color: GOLD, width: 2.5 },
        )?;
        canvas.rect(
            Rect { x: 12.0, y: 12.0, width: 186.0, height: 273.0 },
            Stroke { color: GOLD, width: 0.8 },
        )?;

        // 2. Watermark
        canvas.text(
            "FEDERAL REPUBLIC OF NIGERIA",
            Point { x: 105.0, y: 160.0 },
            TextStyle::new(55.0, WATERMARK_GREY)
                .centered()
                .rotated(30.0)
                .with_opacity(WATERMARK_OPACITY),
        )?;

        // 3. Title and serial
        let serial_number = record.serial_number();
        canvas.text(
            "CERTIFICATE OF BIRTH",
            Point { x: 105.0, y: 30.0 },
            TextStyle::new(22.0, GOLD).bold().centered(),
        )?;
        canvas.text(
            &format!("Serial No: {}", serial_number),
            Point { x: 20.0, y: 42.0 },
            TextStyle::new(10.0, DARK),
        )?;

        // 4. Hash
        let hash = tamper_evidence_hash(record)?;
        canvas.text(
            &format!("Tamper-evidence Hash: {}", hash),
            Point { x: 20.0, y: 285.0 },
            TextStyle::new(7.0, DARK),
        )?;

        // 5. Verification QR code
        let url = verification_url(&self.origin, &record.id, &hash);
        let image = self.encoder.encode(&url)?;
        canvas.image(&image, Rect { x: 165.0, y: 32.0, width: 28.0, height: 28.0 })?;

        // 6. Field table
        let table_end = canvas.table(&Table {
            left: 20.0,
            top: 75.0,
            column_widths: [60.0, 110.0],
            head: ["FIELD".to_string(), "INFORMATION".to_string()],
            rows: field_rows(record),
            head_fill: GOLD,
            head_text: Rgb::WHITE,
            body_text: DARK,
            head_size: 11.0,
            body_size: 11.0,
        })?;

        // 7. Signature and stamp
        let y = table_end + 20.0;
        canvas.line(
            Point { x: 25.0, y: y + 22.0 },
            Point { x: 90.0, y: y + 22.0 },
            Stroke { color: DARK, width: 0.4 },
        )?;
        canvas.text("Registrar General", Point { x: 30.0, y: y + 25.0 }, TextStyle::new(10.0, DARK).bold())?;
        canvas.text("Digital Signature", Point { x: 30.0, y: y + 30.0 }, TextStyle::new(8.0, DARK))?;
        canvas.text("Official Stamp", Point { x: 130.0, y: y + 25.0 }, TextStyle::new(10.0, DARK).bold())?;
        canvas.rect(
            Rect { x: 125.0, y: y + 30.0, width: 50.0, height: 35.0 },
            Stroke { color: Rgb::grey(150), width: 0.4 },
        )?;

        // 8. Issue date and footer
        canvas.text(
            &format!("Date Issued: {}", issued_on.format("%d/%m/%Y")),
            Point { x: 20.0, y: 270.0 },
            TextStyle::new(9.0, DARK),
        )?;
        canvas.text(
            "Issued by the National Birth Registration Authority",
            Point { x: 105.0, y: 270.0 },
            TextStyle::new(9.0, DARK).centered(),
        )?;
        canvas.text(
            "This certificate is electronically generated and verifiable via QR code.",
            Point { x: 105.0, y: 278.0 },
            TextStyle::new(8.0, DARK).centered(),
        )?;

        // 9. Emit
        let bytes = canvas.finish(mode == CertificateMode::Print)?;

        info!(
            "✅ CERTIFICATE: Rendered {} for record {} ({} bytes)",
            serial_number,
            record.id,
            bytes.len()
        );

        Ok(RenderedCertificate {
            record_id: record.id.clone(),
            file_name: certificate_file_name(&record.fields.child_name),
            mode,
            serial_number,
            hash,
            verification_url: url,
            bytes,
        })
    }
}

fn field_rows(record: &BirthRecord) -> Vec<[String; 2]> {
    let f = &record.fields;
    vec![
        ["Child Name".to_string(), f.child_name.clone()],
        ["Date of Birth".to_string(), record.formatted_date_of_birth()],
        ["Gender".to_string(), f.gender.clone()],
        ["Place of Birth".to_string(), f.place_of_birth.clone()],
        ["Father's Name".to_string(), f.father_name.clone()],
        ["Mother's Name".to_string(), f.mother_name.clone()],
        ["Tribe".to_string(), f.tribe.clone()],
        ["Address".to_string(), f.address.clone()],
    ]
}
