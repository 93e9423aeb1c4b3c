//! PDF Core - Low-level PDF writing
//!
//! This crate provides functionality for:
//! - Building new PDF documents page by page
//! - Setting text with the base-14 Helvetica family (no font embedding)
//! - Drawing filled/stroked rectangles and rules
//! - Writing document metadata and compressed content streams
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PageSize, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_page(PageSize::A4);
//! doc.set_font("helvetica", 12.0)?;
//! doc.insert_text("Hello, World!", page, 72.0, 72.0, Align::Left)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod graphics;
mod text;

pub use document::{Color, DocumentInfo, PdfDocument};
pub use font::{encode_win_ansi, FontStyle, FontWeight, StandardFont};
pub use graphics::{Paint, Point, Rect, Stroke};
pub use text::{generate_text_operators, wrap_to_width, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4 portrait
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// US Letter portrait
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    /// Swap width and height
    pub fn landscape(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}
