//! Birth certificate generation: the drawing surface abstraction, its PDF
//! implementation, and the renderer that lays out the page.

pub mod canvas;
pub mod pdf_canvas;
pub mod renderer;

pub use canvas::{CanvasError, CertificateCanvas};
pub use pdf_canvas::PdfCanvas;
pub use renderer::{certificate_file_name, CertificateError, CertificateRenderer, RenderFailure, RenderedCertificate};
