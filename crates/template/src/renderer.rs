//! Document layout and rendering
//!
//! Rendering is two passes. Layout walks the node tree and produces
//! [`LaidBlock`]s for the content width, then pagination stacks the blocks
//! onto pages, breaking before any block that would cross the bottom margin.
//! Painting replays the positioned operations into a [`PdfDocument`].

use crate::blocks::{DrawOp, LaidBlock, TextContent};
use crate::parser::{is_truthy, resolve_binding};
use crate::schema::*;
use crate::{Result, TemplateError};
use pdf_core::{
    DocumentInfo, FontStyle as PdfFontStyle, FontWeight, Paint, PdfDocument, Point, Rect,
    StandardFont, Stroke,
};

/// Share of the font size above the baseline
const ASCENT: f64 = 0.8;

/// Positioned operations for one output page
pub type PageLayout = Vec<DrawOp>;

/// Lays out and renders a [`DocumentSpec`]
pub struct LayoutRenderer<'a> {
    spec: &'a DocumentSpec,
}

impl<'a> LayoutRenderer<'a> {
    /// Create a new renderer for a document description
    pub fn new(spec: &'a DocumentSpec) -> Self {
        Self { spec }
    }

    /// Lay out every page, including footers
    pub fn layout(&self, data: &serde_json::Value) -> Result<Vec<PageLayout>> {
        let size = self.spec.page_size.size();
        let margins = self.spec.margins;
        let content_width = size.width - margins.left - margins.right;

        if content_width <= 0.0 {
            return Err(TemplateError::RenderError(format!(
                "Margins leave no room on a {}x{} page",
                size.width, size.height
            )));
        }

        let footer_reserve = self
            .spec
            .footer
            .as_ref()
            .map(|f| f.font.size * 2.0)
            .unwrap_or(0.0);
        let top = margins.top;
        let bottom = size.height - margins.bottom - footer_reserve;

        let mut pages: Vec<PageLayout> = Vec::new();

        for page in &self.spec.pages {
            let blocks = layout_nodes(&page.nodes, content_width, data)?;

            let mut current: PageLayout = Vec::new();
            let mut cursor = top;

            for block in blocks {
                if cursor + block.height > bottom && cursor > top {
                    // Trailing whitespace never starts a page
                    if block.ops.is_empty() {
                        continue;
                    }
                    pages.push(std::mem::take(&mut current));
                    cursor = top;

                    if let Some(header) = &block.repeat_header {
                        current.extend(header.ops_at(margins.left, cursor));
                        cursor += header.height;
                    }
                }

                current.extend(block.ops_at(margins.left, cursor));
                cursor += block.height;
            }

            pages.push(current);
        }

        if let Some(footer) = &self.spec.footer {
            let total = pages.len();
            let x = match footer.align {
                Align::Left => margins.left,
                Align::Center => size.width / 2.0,
                Align::Right => size.width - margins.right,
            };
            let baseline = size.height - margins.bottom / 2.0;

            for (i, page) in pages.iter_mut().enumerate() {
                let text = footer
                    .text
                    .replace("{page}", &(i + 1).to_string())
                    .replace("{pages}", &total.to_string());
                page.push(DrawOp::Text {
                    x,
                    baseline,
                    text,
                    font: footer.font.clone(),
                    align: footer.align,
                });
            }
        }

        Ok(pages)
    }

    /// Render into a new PDF document
    pub fn render(&self, data: &serde_json::Value) -> Result<PdfDocument> {
        let pages = self.layout(data)?;
        let size = self.spec.page_size.size();

        let mut doc = PdfDocument::new();
        doc.set_info(DocumentInfo {
            title: self.spec.info.title.clone(),
            author: self.spec.info.author.clone(),
            subject: self.spec.info.subject.clone(),
            producer: Some(format!("dashdoc {}", env!("CARGO_PKG_VERSION"))),
        });

        for ops in pages {
            let page = doc.add_page(size);
            for op in ops {
                paint(&mut doc, page, op)?;
            }
        }

        Ok(doc)
    }

    /// Render and serialize to PDF bytes
    pub fn render_to_bytes(&self, data: &serde_json::Value) -> Result<Vec<u8>> {
        Ok(self.render(data)?.to_bytes()?)
    }
}

fn paint(doc: &mut PdfDocument, page: usize, op: DrawOp) -> Result<()> {
    match op {
        DrawOp::Text {
            x,
            baseline,
            text,
            font,
            align,
        } => {
            set_font(doc, &font)?;
            doc.insert_text(&text, page, x, baseline, pdf_align(align))?;
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            border,
        } => {
            let paint = Paint {
                fill: fill.map(Color::to_pdf),
                stroke: border.map(|b| Stroke::new(b.color.to_pdf(), b.width)),
            };
            doc.draw_rect(page, Rect::new(x, y, width, height), paint)?;
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        } => {
            doc.draw_line(
                page,
                Point::new(x1, y1),
                Point::new(x2, y2),
                Stroke::new(color.to_pdf(), width),
            )?;
        }
    }
    Ok(())
}

/// Set font on document based on Font specification
fn set_font(doc: &mut PdfDocument, font: &Font) -> Result<()> {
    doc.set_font(&font.family, font.size as f32)?;

    let (weight, style) = weight_and_style(font.style);
    doc.set_font_weight(weight)?;
    doc.set_font_style(style)?;
    doc.set_text_color(font.color.unwrap_or_default().to_pdf());

    Ok(())
}

fn weight_and_style(style: FontStyle) -> (FontWeight, PdfFontStyle) {
    match style {
        FontStyle::Regular => (FontWeight::Regular, PdfFontStyle::Normal),
        FontStyle::Bold => (FontWeight::Bold, PdfFontStyle::Normal),
        FontStyle::Italic => (FontWeight::Regular, PdfFontStyle::Italic),
        FontStyle::BoldItalic => (FontWeight::Bold, PdfFontStyle::Italic),
    }
}

fn pdf_align(align: Align) -> pdf_core::Align {
    match align {
        Align::Left => pdf_core::Align::Left,
        Align::Center => pdf_core::Align::Center,
        Align::Right => pdf_core::Align::Right,
    }
}

fn face(font: &Font) -> Result<StandardFont> {
    let (weight, style) = weight_and_style(font.style);
    StandardFont::resolve(&font.family, weight, style)
        .ok_or_else(|| TemplateError::FontError(format!("Unknown font family: {}", font.family)))
}

fn wrap(text: &str, font: &Font, width: f64) -> Result<Vec<String>> {
    let face = face(font)?;
    let size = font.size as f32;
    Ok(pdf_core::wrap_to_width(text, width, |line| {
        face.text_width_points(line, size) as f64
    }))
}

fn anchor_x(align: Align, width: f64) -> f64 {
    match align {
        Align::Left => 0.0,
        Align::Center => width / 2.0,
        Align::Right => width,
    }
}

/// Lay out a sequence of nodes, skipping those whose enable binding is falsy
fn layout_nodes(nodes: &[Node], width: f64, data: &serde_json::Value) -> Result<Vec<LaidBlock>> {
    let mut blocks = Vec::new();

    for node in nodes {
        if let Some(path) = node.enable() {
            let enabled = resolve_binding(path, data).map(is_truthy).unwrap_or(false);
            if !enabled {
                continue;
            }
        }

        match node {
            Node::Text(text) => blocks.extend(layout_text(text, width, data)?),
            Node::Table(table) => blocks.extend(layout_table(table, width, data)?),
            Node::Box(boxed) => blocks.extend(layout_box(boxed, width, data)?),
            Node::Columns(columns) => blocks.extend(layout_columns(columns, width, data)?),
            Node::Spacer(spacer) => blocks.push(LaidBlock::empty(spacer.height)),
            Node::Rule(rule) => blocks.push(layout_rule(rule, width)),
        }
    }

    Ok(blocks)
}

/// One block per wrapped line so paragraphs can break across pages
fn layout_text(node: &TextNode, width: f64, data: &serde_json::Value) -> Result<Vec<LaidBlock>> {
    let Some(text) = node.get_text(data) else {
        return Ok(Vec::new());
    };

    let line_height = node.font.size * node.line_height;
    let baseline = (line_height - node.font.size) / 2.0 + node.font.size * ASCENT;
    let x = anchor_x(node.align, width);

    let mut blocks: Vec<LaidBlock> = wrap(&text, &node.font, width)?
        .into_iter()
        .map(|line| LaidBlock {
            height: line_height,
            ops: vec![DrawOp::Text {
                x,
                baseline,
                text: line,
                font: node.font.clone(),
                align: node.align,
            }],
            repeat_header: None,
        })
        .collect();

    if node.space_after > 0.0 {
        blocks.push(LaidBlock::empty(node.space_after));
    }

    Ok(blocks)
}

/// Header block plus one block per row; every row carries the header for repetition
fn layout_table(
    node: &TableNode,
    width: f64,
    data: &serde_json::Value,
) -> Result<Vec<LaidBlock>> {
    if node.columns.is_empty() {
        return Ok(Vec::new());
    }

    let total_weight: f64 = node.columns.iter().map(|c| c.width.max(0.0)).sum();
    if total_weight <= 0.0 {
        return Err(TemplateError::RenderError(
            "Table column widths must be positive".to_string(),
        ));
    }
    let widths: Vec<f64> = node
        .columns
        .iter()
        .map(|c| width * c.width.max(0.0) / total_weight)
        .collect();

    let header_font = node
        .header_font
        .clone()
        .unwrap_or_else(|| node.font.clone().bold());
    let headers: Vec<String> = node.columns.iter().map(|c| c.header.clone()).collect();
    let header = layout_row(node, &widths, &headers, &header_font, node.header_fill)?;

    let mut blocks = vec![header.clone()];
    let header = Box::new(header);

    for row in node.resolve_rows(data) {
        let mut block = layout_row(node, &widths, &row, &node.font, None)?;
        block.repeat_header = Some(header.clone());
        blocks.push(block);
    }

    if node.space_after > 0.0 {
        blocks.push(LaidBlock::empty(node.space_after));
    }

    Ok(blocks)
}

fn layout_row(
    node: &TableNode,
    widths: &[f64],
    cells: &[String],
    font: &Font,
    fill: Option<Color>,
) -> Result<LaidBlock> {
    let pad = node.cell_padding;
    let line_height = font.size * 1.3;

    let mut wrapped = Vec::with_capacity(widths.len());
    for (i, width) in widths.iter().enumerate() {
        let text = cells.get(i).map(String::as_str).unwrap_or("");
        wrapped.push(wrap(text, font, (width - 2.0 * pad).max(1.0))?);
    }

    let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let height = (lines as f64 * line_height + 2.0 * pad).max(node.min_row_height);

    let mut ops = Vec::new();
    let mut x = 0.0;
    for ((width, lines), column) in widths.iter().zip(wrapped).zip(&node.columns) {
        if fill.is_some() || node.border.is_some() {
            ops.push(DrawOp::Rect {
                x,
                y: 0.0,
                width: *width,
                height,
                fill,
                border: node.border,
            });
        }

        let anchor = x + pad + anchor_x(column.align, width - 2.0 * pad);
        for (n, line) in lines.into_iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            ops.push(DrawOp::Text {
                x: anchor,
                baseline: pad + n as f64 * line_height + font.size * ASCENT,
                text: line,
                font: font.clone(),
                align: column.align,
            });
        }

        x += width;
    }

    Ok(LaidBlock {
        height,
        ops,
        repeat_header: None,
    })
}

/// Boxes are kept whole
fn layout_box(node: &BoxNode, width: f64, data: &serde_json::Value) -> Result<Vec<LaidBlock>> {
    let pad = node.padding;
    let inner = layout_nodes(&node.children, width - 2.0 * pad, data)?;
    let content = LaidBlock::stack(&inner);
    let height = content.height + 2.0 * pad;

    let mut block = LaidBlock::empty(height);
    if node.fill.is_some() || node.border.is_some() {
        block.ops.push(DrawOp::Rect {
            x: 0.0,
            y: 0.0,
            width,
            height,
            fill: node.fill,
            border: node.border,
        });
    }
    block.append_at(&content, pad, pad);

    let mut blocks = vec![block];
    if node.space_after > 0.0 {
        blocks.push(LaidBlock::empty(node.space_after));
    }
    Ok(blocks)
}

fn layout_columns(
    node: &ColumnsNode,
    width: f64,
    data: &serde_json::Value,
) -> Result<Vec<LaidBlock>> {
    let count = node.columns.len();
    if count == 0 {
        return Ok(Vec::new());
    }

    let column_width = (width - node.gap * (count - 1) as f64) / count as f64;
    let mut block = LaidBlock::default();

    for (i, column) in node.columns.iter().enumerate() {
        let content = LaidBlock::stack(&layout_nodes(column, column_width, data)?);
        block.append_at(&content, i as f64 * (column_width + node.gap), 0.0);
        block.height = block.height.max(content.height);
    }

    let mut blocks = vec![block];
    if node.space_after > 0.0 {
        blocks.push(LaidBlock::empty(node.space_after));
    }
    Ok(blocks)
}

fn layout_rule(node: &RuleNode, width: f64) -> LaidBlock {
    let y = node.margin + node.thickness / 2.0;
    LaidBlock {
        height: node.margin * 2.0 + node.thickness,
        ops: vec![DrawOp::Line {
            x1: 0.0,
            y1: y,
            x2: width,
            y2: y,
            color: node.color,
            width: node.thickness,
        }],
        repeat_header: None,
    }
}
