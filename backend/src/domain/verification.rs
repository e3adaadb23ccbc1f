//! # Verification Link Encoder
//!
//! Builds the public verification URL for a certificate and renders it as a
//! QR code bitmap for embedding in the page.

use base64::Engine;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;
use thiserror::Error;

/// Pixels per QR module
const MODULE_PIXELS: u32 = 8;

/// `<origin>/verify/<record_id>?hash=<digest>`
pub fn verification_url(origin: &str, record_id: &str, digest: &str) -> String {
    format!("{}/verify/{}?hash={}", origin.trim_end_matches('/'), record_id, digest)
}

#[derive(Debug, Error)]
pub enum QrEncodeError {
    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// An 8-bit greyscale rendering of a QR symbol, square.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationImage {
    pub size: u32,
    /// Row-major luma samples, `size * size` bytes
    pub luma: Vec<u8>,
    pub png: Vec<u8>,
}

impl VerificationImage {
    /// `data:image/png;base64,...`
    pub fn data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// 2D barcode encoder used by the certificate renderer
pub trait QrEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<VerificationImage, QrEncodeError>;
}

/// QR encoder backed by the `qrcode` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeEncoder;

impl QrEncoder for QrCodeEncoder {
    fn encode(&self, text: &str) -> Result<VerificationImage, QrEncodeError> {
        let code = QrCode::new(text.as_bytes()).map_err(|e| QrEncodeError::Encode(e.to_string()))?;
        let bitmap = code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
            .build();
        let size = bitmap.width();

        let mut png = Vec::new();
        let bitmap = DynamicImage::ImageLuma8(bitmap);
        bitmap.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        Ok(VerificationImage {
            size,
            luma: bitmap.into_luma8().into_raw(),
            png,
        })
    }
}
