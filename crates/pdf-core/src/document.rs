//! PDF Document builder

use crate::font::{encode_win_ansi, FontStyle, FontWeight, StandardFont};
use crate::graphics::{
    generate_line_operators, generate_rect_operators, Paint, Point, Rect, Stroke,
};
use crate::text::{generate_text_operators, hex_string, wrap_to_width, TextRenderContext};
use crate::{Align, PageSize, PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::from_rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// Red color
    pub fn red() -> Self {
        Self::rgb(1.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Entries for the document information dictionary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub producer: Option<String>,
}

/// A page being assembled
struct PageBuffer {
    size: PageSize,
    /// Raw content stream operators
    content: Vec<u8>,
    /// Fonts referenced by this page's content
    fonts: BTreeSet<StandardFont>,
}

/// PDF Document builder providing high-level operations
///
/// Pages are buffered in memory and the lopdf object graph is only built by
/// [`PdfDocument::to_bytes`], so the document can be serialized repeatedly.
pub struct PdfDocument {
    /// Buffered pages (index 0 is page 1)
    pages: Vec<PageBuffer>,
    /// Current font family name
    current_family: Option<String>,
    /// Current font weight
    current_weight: FontWeight,
    /// Current font style
    current_style: FontStyle,
    /// Current font size
    current_font_size: f32,
    /// Current text color
    current_text_color: Color,
    /// Font resource names (font -> "F1", "F2", ...)
    font_resources: BTreeMap<StandardFont, String>,
    /// Next font resource number
    next_font_resource: u32,
    /// Information dictionary
    info: DocumentInfo,
    /// Flate-compress content streams on save
    compress: bool,
}

impl PdfDocument {
    /// Create an empty document with no pages
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current_family: None,
            current_weight: FontWeight::default(),
            current_style: FontStyle::default(),
            current_font_size: 12.0,
            current_text_color: Color::default(),
            font_resources: BTreeMap::new(),
            next_font_resource: 1,
            info: DocumentInfo::default(),
            compress: true,
        }
    }

    /// Enable or disable Flate compression of content streams
    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    /// Set the document information dictionary
    pub fn set_info(&mut self, info: DocumentInfo) {
        self.info = info;
    }

    /// Append a blank page
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page(&mut self, size: PageSize) -> usize {
        self.pages.push(PageBuffer {
            size,
            content: Vec::new(),
            fonts: BTreeSet::new(),
        });
        self.pages.len()
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get the size of a page (1-indexed)
    pub fn page_size(&self, page: usize) -> Result<PageSize> {
        Ok(self.page(page)?.size)
    }

    fn page(&self, page: usize) -> Result<&PageBuffer> {
        let count = self.pages.len();
        if page == 0 || page > count {
            return Err(PdfError::InvalidPage(page, count));
        }
        Ok(&self.pages[page - 1])
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PageBuffer> {
        let count = self.pages.len();
        if page == 0 || page > count {
            return Err(PdfError::InvalidPage(page, count));
        }
        Ok(&mut self.pages[page - 1])
    }

    /// Set the current font family and size
    ///
    /// # Example
    /// ```ignore
    /// doc.set_font("helvetica", 12.0)?;  // Regular 12pt
    /// doc.set_font_weight(FontWeight::Bold)?;  // Now bold 12pt
    /// ```
    pub fn set_font(&mut self, family: &str, size: f32) -> Result<()> {
        if StandardFont::resolve(family, FontWeight::Regular, FontStyle::Normal).is_none() {
            return Err(PdfError::FontNotFound(family.to_string()));
        }

        self.current_family = Some(family.to_string());
        self.current_font_size = size;

        Ok(())
    }

    /// Set the font weight for subsequent text
    pub fn set_font_weight(&mut self, weight: FontWeight) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("No font family set".to_string()));
        }
        self.current_weight = weight;
        Ok(())
    }

    /// Set the font style for subsequent text
    pub fn set_font_style(&mut self, style: FontStyle) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("No font family set".to_string()));
        }
        self.current_style = style;
        Ok(())
    }

    /// Set the text color for subsequent text
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// The face selected by the current family/weight/style
    fn current_font(&self) -> Result<StandardFont> {
        let family = self
            .current_family
            .as_deref()
            .ok_or_else(|| PdfError::FontNotFound("No font family set".to_string()))?;
        StandardFont::resolve(family, self.current_weight, self.current_style)
            .ok_or_else(|| PdfError::FontNotFound(family.to_string()))
    }

    /// Width of `text` in points with the current font
    pub fn text_width(&self, text: &str) -> Result<f64> {
        let font = self.current_font()?;
        Ok(font.text_width_points(text, self.current_font_size) as f64)
    }

    /// Wrap `text` into lines no wider than `max_width` with the current font
    pub fn wrap_text(&self, text: &str, max_width: f64) -> Result<Vec<String>> {
        let font = self.current_font()?;
        let size = self.current_font_size;
        Ok(wrap_to_width(text, max_width, |line| {
            font.text_width_points(line, size) as f64
        }))
    }

    /// Get or create the resource name for a font (e.g., "F1")
    fn font_resource(&mut self, font: StandardFont) -> String {
        if let Some(name) = self.font_resources.get(&font) {
            return name.clone();
        }
        let name = format!("F{}", self.next_font_resource);
        self.next_font_resource += 1;
        self.font_resources.insert(font, name.clone());
        name
    }

    /// Insert text at a position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points from the left edge
    /// * `y` - Baseline Y coordinate in points from the top edge
    /// * `align` - Alignment relative to `x`
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_height = self.page(page)?.size.height;

        if text.is_empty() {
            return Ok(());
        }

        let font = self.current_font()?;
        let font_name = self.font_resource(font);
        let encoded = encode_win_ansi(text);

        let ctx = TextRenderContext {
            font_name,
            font_size: self.current_font_size,
            text_width: font.text_width_points(text, self.current_font_size) as f64,
            color: self.current_text_color,
        };

        // Convert Y coordinate from top-origin to PDF bottom-origin
        let operators =
            generate_text_operators(&hex_string(&encoded), x, page_height - y, align, &ctx);

        let buffer = self.page_mut(page)?;
        buffer.fonts.insert(font);
        buffer.content.extend_from_slice(&operators);

        Ok(())
    }

    /// Draw a rectangle given in top-left-origin coordinates
    pub fn draw_rect(&mut self, page: usize, rect: Rect, paint: Paint) -> Result<()> {
        let buffer = self.page_mut(page)?;
        if paint.is_empty() {
            return Ok(());
        }
        let pdf_y = buffer.size.height - rect.y - rect.height;
        let operators = generate_rect_operators(rect.x, pdf_y, rect.width, rect.height, &paint);
        buffer.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Draw a straight line between two top-left-origin points
    pub fn draw_line(
        &mut self,
        page: usize,
        from: Point,
        to: Point,
        stroke: Stroke,
    ) -> Result<()> {
        let buffer = self.page_mut(page)?;
        let height = buffer.size.height;
        let operators = generate_line_operators(
            Point::new(from.x, height - from.y),
            Point::new(to.x, height - to.y),
            &stroke,
        );
        buffer.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize the document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        // 1. Font dictionaries, one object per face in use
        let mut font_ids = BTreeMap::new();
        for (font, resource_name) in &self.font_resources {
            let id = doc.add_object(font.to_pdf_dictionary());
            font_ids.insert(*font, (resource_name.clone(), id));
        }

        // 2. Page objects with their content streams
        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let contents_id = doc.add_object(self.content_stream(&page.content)?);

            let mut font_dict = Dictionary::new();
            for font in &page.fonts {
                let (resource_name, id) = font_ids
                    .get(font)
                    .ok_or_else(|| PdfError::FontNotFound(font.base_font().to_string()))?;
                font_dict.set(resource_name.as_bytes(), Object::Reference(*id));
            }

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page.size.width as f32),
                    Object::Real(page.size.height as f32),
                ],
                "Resources" => dictionary! { "Font" => font_dict },
                "Contents" => contents_id,
            });
            kids.push(Object::Reference(page_id));
        }

        // 3. Page tree, catalog and info
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(info) = self.info_dictionary() {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    fn content_stream(&self, content: &[u8]) -> Result<Stream> {
        if !self.compress {
            return Ok(Stream::new(Dictionary::new(), content.to_vec()));
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content)?;
        let compressed = encoder.finish()?;

        Ok(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            compressed,
        ))
    }

    fn info_dictionary(&self) -> Option<Dictionary> {
        let mut dict = Dictionary::new();
        let mut any = false;
        let entries = [
            ("Title", &self.info.title),
            ("Author", &self.info.author),
            ("Subject", &self.info.subject),
            ("Producer", &self.info.producer),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                dict.set(key, Object::string_literal(encode_win_ansi(value)));
                any = true;
            }
        }
        any.then_some(dict)
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}
