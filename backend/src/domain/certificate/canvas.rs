//! Drawing surface used by the certificate renderer.
//!
//! Coordinates are millimetres measured from the top-left corner of the page;
//! font sizes are points. Implementations convert to whatever their output
//! format needs.

use thiserror::Error;

use crate::domain::verification::VerificationImage;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("image could not be embedded: {0}")]
    Image(String),

    #[error("document could not be written: {0}")]
    Write(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub const fn grey(level: u8) -> Rgb {
        Rgb(level, level, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    /// Line width in millimetres
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Rgb,
    pub bold: bool,
    pub align: Align,
    /// Counter-clockwise rotation in degrees
    pub angle: f32,
    /// 1.0 is fully opaque
    pub opacity: f32,
}

impl TextStyle {
    pub fn new(size: f32, color: Rgb) -> Self {
        Self {
            size,
            color,
            bold: false,
            align: Align::Left,
            angle: 0.0,
            opacity: 1.0,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn rotated(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

/// A two-column grid table with a filled header row
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub left: f32,
    pub top: f32,
    pub column_widths: [f32; 2],
    pub head: [String; 2],
    pub rows: Vec<[String; 2]>,
    pub head_fill: Rgb,
    pub head_text: Rgb,
    pub body_text: Rgb,
    pub head_size: f32,
    pub body_size: f32,
}

/// Primitive drawing operations. Later draws paint over earlier ones.
pub trait CertificateCanvas {
    fn rect(&mut self, rect: Rect, stroke: Stroke) -> Result<(), CanvasError>;

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) -> Result<(), CanvasError>;

    fn text(&mut self, text: &str, at: Point, style: TextStyle) -> Result<(), CanvasError>;

    /// Draw a table and return the y coordinate of its bottom edge
    fn table(&mut self, table: &Table) -> Result<f32, CanvasError>;

    fn image(&mut self, image: &VerificationImage, area: Rect) -> Result<(), CanvasError>;

    /// Serialize the page. With `auto_print` the document asks its viewer to
    /// open the print dialog as soon as it is displayed.
    fn finish(self, auto_print: bool) -> Result<Vec<u8>, CanvasError>;
}
