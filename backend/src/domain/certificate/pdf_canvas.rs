//! PDF implementation of `CertificateCanvas` built with lopdf.
//!
//! Single A4 page, standard Helvetica fonts in WinAnsi encoding. Text width is
//! measured with the Helvetica AFM advance widths so centred text lands where
//! it should without embedding a font.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use super::canvas::{Align, CanvasError, CertificateCanvas, Point, Rect, Rgb, Stroke, Table, TextStyle};
use crate::domain::verification::VerificationImage;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const PT_PER_MM: f32 = 72.0 / 25.4;
const CELL_PADDING_MM: f32 = 1.76;
const LINE_HEIGHT_FACTOR: f32 = 1.15;
const GRID_LINE: Stroke = Stroke {
    color: Rgb::grey(200),
    width: 0.1,
};

const AUTO_PRINT_SCRIPT: &str = "this.print({bUI: true, bSilent: false, bShrinkToFit: true});";

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for ASCII 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const FALLBACK_WIDTH: u16 = 556;

fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

fn num(value: f32) -> Object {
    Object::from(value)
}

/// Width of `text` in millimetres at `size` points
pub fn text_width_mm(text: &str, size: f32, bold: bool) -> f32 {
    let table = if bold { &HELVETICA_BOLD_WIDTHS } else { &HELVETICA_WIDTHS };
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 32..=126 => u32::from(table[(code - 32) as usize]),
            _ => u32::from(FALLBACK_WIDTH),
        })
        .sum();
    units as f32 / 1000.0 * size / PT_PER_MM
}

/// Map text onto WinAnsiEncoding bytes. Unrepresentable characters become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap to `max_width` millimetres. Words longer than a line are
/// left whole rather than split mid-word.
fn wrap(text: &str, max_width: f32, size: f32, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width_mm(&candidate, size, bold) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

pub struct PdfCanvas {
    operations: Vec<Operation>,
    images: Vec<Stream>,
    opacities: Vec<f32>,
}

impl PdfCanvas {
    /// A blank portrait A4 page
    pub fn a4() -> Self {
        Self {
            operations: Vec::new(),
            images: Vec::new(),
            opacities: Vec::new(),
        }
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn set_stroke(&mut self, stroke: Stroke) {
        let Rgb(r, g, b) = stroke.color;
        self.op("RG", vec![num(r as f32 / 255.0), num(g as f32 / 255.0), num(b as f32 / 255.0)]);
        self.op("w", vec![num(pt(stroke.width))]);
    }

    fn set_fill(&mut self, color: Rgb) {
        let Rgb(r, g, b) = color;
        self.op("rg", vec![num(r as f32 / 255.0), num(g as f32 / 255.0), num(b as f32 / 255.0)]);
    }

    /// Rectangle operands in PDF user space (origin bottom-left)
    fn rect_operands(rect: Rect) -> Vec<Object> {
        vec![
            num(pt(rect.x)),
            num(pt(PAGE_HEIGHT_MM - rect.y - rect.height)),
            num(pt(rect.width)),
            num(pt(rect.height)),
        ]
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.op("q", vec![]);
        self.set_fill(color);
        self.op("re", Self::rect_operands(rect));
        self.op("f", vec![]);
        self.op("Q", vec![]);
    }

    fn graphics_state_name(&mut self, opacity: f32) -> String {
        let index = match self.opacities.iter().position(|o| (*o - opacity).abs() < f32::EPSILON) {
            Some(index) => index,
            None => {
                self.opacities.push(opacity);
                self.opacities.len() - 1
            }
        };
        format!("GS{}", index)
    }

    fn table_row(&mut self, table: &Table, top: f32, cells: &[String; 2], head: bool) -> Result<f32, CanvasError> {
        let size = if head { table.head_size } else { table.body_size };
        let line_height = size * LINE_HEIGHT_FACTOR / PT_PER_MM;

        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(table.column_widths.iter())
            .map(|(text, width)| wrap(text, width - 2.0 * CELL_PADDING_MM, size, head))
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        let height = line_count as f32 * line_height + 2.0 * CELL_PADDING_MM;

        let mut left = table.left;
        for (lines, width) in wrapped.iter().zip(table.column_widths.iter()) {
            let cell = Rect {
                x: left,
                y: top,
                width: *width,
                height,
            };
            if head {
                self.fill_rect(cell, table.head_fill);
            }
            self.rect(cell, GRID_LINE)?;

            let mut style = TextStyle::new(size, if head { table.head_text } else { table.body_text });
            let x = if head {
                style = style.bold().centered();
                left + width / 2.0
            } else {
                left + CELL_PADDING_MM
            };

            for (i, line) in lines.iter().enumerate() {
                // Baseline sits roughly one ascent below the top of the line box
                let baseline = top + CELL_PADDING_MM + i as f32 * line_height + size * 0.8 / PT_PER_MM;
                self.text(line, Point { x, y: baseline }, style)?;
            }

            left += width;
        }

        Ok(top + height)
    }
}

impl CertificateCanvas for PdfCanvas {
    fn rect(&mut self, rect: Rect, stroke: Stroke) -> Result<(), CanvasError> {
        self.op("q", vec![]);
        self.set_stroke(stroke);
        self.op("re", Self::rect_operands(rect));
        self.op("S", vec![]);
        self.op("Q", vec![]);
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) -> Result<(), CanvasError> {
        self.op("q", vec![]);
        self.set_stroke(stroke);
        self.op("m", vec![num(pt(from.x)), num(pt(PAGE_HEIGHT_MM - from.y))]);
        self.op("l", vec![num(pt(to.x)), num(pt(PAGE_HEIGHT_MM - to.y))]);
        self.op("S", vec![]);
        self.op("Q", vec![]);
        Ok(())
    }

    fn text(&mut self, text: &str, at: Point, style: TextStyle) -> Result<(), CanvasError> {
        let (sin, cos) = style.angle.to_radians().sin_cos();
        let mut x = pt(at.x);
        let mut y = pt(PAGE_HEIGHT_MM - at.y);

        if style.align == Align::Center {
            let half = pt(text_width_mm(text, style.size, style.bold)) / 2.0;
            x -= half * cos;
            y -= half * sin;
        }

        self.op("q", vec![]);
        if style.opacity < 1.0 {
            let name = self.graphics_state_name(style.opacity);
            self.op("gs", vec![Object::Name(name.into_bytes())]);
        }
        self.op("BT", vec![]);
        let font: &[u8] = if style.bold { b"F2" } else { b"F1" };
        self.op("Tf", vec![Object::Name(font.to_vec()), num(style.size)]);
        self.set_fill(style.color);
        self.op("Tm", vec![num(cos), num(sin), num(-sin), num(cos), num(x), num(y)]);
        self.op("Tj", vec![Object::String(encode_win_ansi(text), StringFormat::Literal)]);
        self.op("ET", vec![]);
        self.op("Q", vec![]);
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<f32, CanvasError> {
        let mut y = self.table_row(table, table.top, &table.head, true)?;
        for row in &table.rows {
            y = self.table_row(table, y, row, false)?;
        }
        Ok(y)
    }

    fn image(&mut self, image: &VerificationImage, area: Rect) -> Result<(), CanvasError> {
        let expected = image.size as usize * image.size as usize;
        if image.size == 0 || image.luma.len() != expected {
            return Err(CanvasError::Image(format!(
                "expected {} luma samples for a {}px square, found {}",
                expected,
                image.size,
                image.luma.len()
            )));
        }

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.size),
                "Height" => i64::from(image.size),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            image.luma.clone(),
        );
        let name = format!("Im{}", self.images.len());
        self.images.push(stream);

        let bottom = PAGE_HEIGHT_MM - area.y - area.height;
        self.op("q", vec![]);
        self.op(
            "cm",
            vec![num(pt(area.width)), num(0.0), num(0.0), num(pt(area.height)), num(pt(area.x)), num(pt(bottom))],
        );
        self.op("Do", vec![Object::Name(name.into_bytes())]);
        self.op("Q", vec![]);
        Ok(())
    }

    fn finish(self, auto_print: bool) -> Result<Vec<u8>, CanvasError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        };

        if !self.images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (index, stream) in self.images.into_iter().enumerate() {
                let image_id = doc.add_object(stream);
                xobjects.set(format!("Im{}", index), image_id);
            }
            resources.set("XObject", xobjects);
        }

        if !self.opacities.is_empty() {
            let mut states = Dictionary::new();
            for (index, opacity) in self.opacities.iter().enumerate() {
                states.set(
                    format!("GS{}", index),
                    dictionary! {
                        "Type" => "ExtGState",
                        "ca" => num(*opacity),
                        "CA" => num(*opacity),
                    },
                );
            }
            resources.set("ExtGState", states);
        }

        let resources_id = doc.add_object(resources);

        let content = Content {
            operations: self.operations,
        };
        let encoded = content.encode().map_err(|e| CanvasError::Write(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![num(0.0), num(0.0), num(pt(PAGE_WIDTH_MM)), num(pt(PAGE_HEIGHT_MM))],
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if auto_print {
            catalog.set(
                "OpenAction",
                dictionary! {
                    "S" => "JavaScript",
                    "JS" => Object::string_literal(AUTO_PRINT_SCRIPT),
                },
            );
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|e| CanvasError::Write(e.to_string()))?;
        Ok(bytes)
    }
}
