//! Document description types
//!
//! A [`DocumentSpec`] is a declarative tree: pages hold nodes, nodes are
//! paragraphs, tables, styled boxes, columns, spacers and rules. Templates
//! build one of these from a record; JSON descriptions deserialize into the
//! same types.

use serde::{Deserialize, Serialize};

/// RGB Color for text and shapes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    /// Red component (0.0 - 1.0)
    pub r: f64,
    /// Green component (0.0 - 1.0)
    pub g: f64,
    /// Blue component (0.0 - 1.0)
    pub b: f64,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// Gray color
    pub fn gray() -> Self {
        Self::rgb(0.5, 0.5, 0.5)
    }

    pub(crate) fn to_pdf(self) -> pdf_core::Color {
        pdf_core::Color::rgb(self.r as f32, self.g as f32, self.b as f32)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Root document description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSpec {
    /// Metadata written to the PDF info dictionary
    #[serde(default)]
    pub info: DocumentMeta,

    /// Paper size for every page
    #[serde(rename = "pageSize")]
    #[serde(default)]
    pub page_size: PageFormat,

    /// Page margins in points
    #[serde(default)]
    pub margins: Margins,

    /// Footer drawn on every page
    #[serde(default)]
    pub footer: Option<Footer>,

    /// Pages; each starts on a fresh sheet, overflow continues on new sheets
    pub pages: Vec<PageSpec>,
}

/// Document metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

/// Paper size
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
}

impl PageFormat {
    pub(crate) fn size(self) -> pdf_core::PageSize {
        match self {
            PageFormat::A4 => pdf_core::PageSize::A4,
            PageFormat::Letter => pdf_core::PageSize::LETTER,
        }
    }
}

/// Page margins in points
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(50.0)
    }
}

/// Footer line; `{page}` and `{pages}` are substituted per page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Footer {
    pub text: String,

    #[serde(default = "Font::footer")]
    pub font: Font,

    #[serde(default = "default_footer_align")]
    pub align: Align,
}

fn default_footer_align() -> Align {
    Align::Center
}

/// A single page of content
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageSpec {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl PageSpec {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }
}

/// Content node (tagged union)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Paragraph of wrapped text
    Text(TextNode),

    /// Table with a header row
    Table(TableNode),

    /// Styled box around child nodes
    Box(BoxNode),

    /// Side-by-side columns of nodes
    Columns(ColumnsNode),

    /// Vertical whitespace
    Spacer(SpacerNode),

    /// Horizontal rule
    Rule(RuleNode),
}

impl Node {
    /// Get the enable binding if present
    pub fn enable(&self) -> Option<&str> {
        match self {
            Node::Text(n) => n.enable.as_deref(),
            Node::Table(n) => n.enable.as_deref(),
            Node::Box(n) => n.enable.as_deref(),
            Node::Columns(n) => n.enable.as_deref(),
            Node::Spacer(_) | Node::Rule(_) => None,
        }
    }

    /// Paragraph with the given font
    pub fn text(text: impl Into<String>, font: Font) -> Self {
        Node::Text(TextNode {
            text: Some(text.into()),
            font,
            ..TextNode::default()
        })
    }

    pub fn spacer(height: f64) -> Self {
        Node::Spacer(SpacerNode { height })
    }

    pub fn rule() -> Self {
        Node::Rule(RuleNode::default())
    }
}

/// Font specification for a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Font {
    /// Font family name
    #[serde(default = "default_font_family")]
    pub family: String,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub size: f64,

    /// Font style
    #[serde(default)]
    pub style: FontStyle,

    /// Text color
    #[serde(default)]
    pub color: Option<Color>,
}

fn default_font_family() -> String {
    "helvetica".to_string()
}

fn default_font_size() -> f64 {
    10.0
}

impl Font {
    pub fn new(size: f64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.style = match self.style {
            FontStyle::Italic | FontStyle::BoldItalic => FontStyle::BoldItalic,
            _ => FontStyle::Bold,
        };
        self
    }

    pub fn italic(mut self) -> Self {
        self.style = match self.style {
            FontStyle::Bold | FontStyle::BoldItalic => FontStyle::BoldItalic,
            _ => FontStyle::Italic,
        };
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn footer() -> Self {
        Self::new(8.0).color(Color::gray())
    }
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: default_font_family(),
            size: default_font_size(),
            style: FontStyle::Regular,
            color: None,
        }
    }
}

/// Font style
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    #[serde(rename = "bold-italic")]
    BoldItalic,
}

/// Text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Border around a box or table cells
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Border {
    #[serde(default)]
    pub color: Color,

    #[serde(default = "default_border_width")]
    pub width: f64,
}

fn default_border_width() -> f64 {
    0.75
}

impl Border {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

fn default_line_height() -> f64 {
    1.3
}

fn default_text_space_after() -> f64 {
    4.0
}

fn default_block_space_after() -> f64 {
    8.0
}

/// Paragraph node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextNode {
    /// Data binding path (JSONPath-like)
    #[serde(default)]
    pub bind: Option<String>,

    /// Static text (used if bind is not specified)
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub font: Font,

    #[serde(default)]
    pub align: Align,

    /// Line height as a multiple of the font size
    #[serde(rename = "lineHeight")]
    #[serde(default = "default_line_height")]
    pub line_height: f64,

    /// Whitespace below the paragraph in points
    #[serde(rename = "spaceAfter")]
    #[serde(default = "default_text_space_after")]
    pub space_after: f64,

    /// Optional enable flag - if set, evaluates binding to determine if node is rendered
    #[serde(default)]
    pub enable: Option<String>,
}

impl Default for TextNode {
    fn default() -> Self {
        Self {
            bind: None,
            text: None,
            font: Font::default(),
            align: Align::Left,
            line_height: default_line_height(),
            space_after: default_text_space_after(),
            enable: None,
        }
    }
}

impl TextNode {
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn space_after(mut self, space: f64) -> Self {
        self.space_after = space;
        self
    }
}

/// Table column definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableColumn {
    /// Header text
    #[serde(default)]
    pub header: String,

    /// Field name in bound row objects
    #[serde(default)]
    pub field: Option<String>,

    /// Relative width weight
    #[serde(default = "default_column_width")]
    pub width: f64,

    #[serde(default)]
    pub align: Align,
}

fn default_column_width() -> f64 {
    1.0
}

impl TableColumn {
    pub fn new(header: impl Into<String>, width: f64) -> Self {
        Self {
            header: header.into(),
            field: None,
            width,
            align: Align::Left,
        }
    }
}

/// Table node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableNode {
    /// Data binding for rows (array of objects or arrays)
    #[serde(default)]
    pub bind: Option<String>,

    pub columns: Vec<TableColumn>,

    /// Static rows (used if bind is not specified)
    #[serde(default)]
    pub rows: Vec<Vec<String>>,

    /// Cell font
    #[serde(default)]
    pub font: Font,

    /// Header font (defaults to the bold cell font)
    #[serde(rename = "headerFont")]
    #[serde(default)]
    pub header_font: Option<Font>,

    #[serde(rename = "headerFill")]
    #[serde(default)]
    pub header_fill: Option<Color>,

    #[serde(default)]
    pub border: Option<Border>,

    #[serde(rename = "cellPadding")]
    #[serde(default = "default_cell_padding")]
    pub cell_padding: f64,

    /// Minimum row height in points
    #[serde(rename = "minRowHeight")]
    #[serde(default)]
    pub min_row_height: f64,

    #[serde(rename = "spaceAfter")]
    #[serde(default = "default_block_space_after")]
    pub space_after: f64,

    #[serde(default)]
    pub enable: Option<String>,
}

fn default_cell_padding() -> f64 {
    4.0
}

impl TableNode {
    pub fn new(columns: Vec<TableColumn>, rows: Vec<Vec<String>>) -> Self {
        Self {
            bind: None,
            columns,
            rows,
            font: Font::default(),
            header_font: None,
            header_fill: None,
            border: None,
            cell_padding: default_cell_padding(),
            min_row_height: 0.0,
            space_after: default_block_space_after(),
            enable: None,
        }
    }
}

/// Box node: optional fill and border around padded children
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoxNode {
    #[serde(default)]
    pub fill: Option<Color>,

    #[serde(default)]
    pub border: Option<Border>,

    #[serde(default = "default_box_padding")]
    pub padding: f64,

    #[serde(default)]
    pub children: Vec<Node>,

    #[serde(rename = "spaceAfter")]
    #[serde(default = "default_block_space_after")]
    pub space_after: f64,

    #[serde(default)]
    pub enable: Option<String>,
}

fn default_box_padding() -> f64 {
    8.0
}

impl BoxNode {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            fill: None,
            border: None,
            padding: default_box_padding(),
            children,
            space_after: default_block_space_after(),
            enable: None,
        }
    }
}

/// Columns node: equal-width columns laid out side by side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnsNode {
    #[serde(default = "default_column_gap")]
    pub gap: f64,

    pub columns: Vec<Vec<Node>>,

    #[serde(rename = "spaceAfter")]
    #[serde(default = "default_block_space_after")]
    pub space_after: f64,

    #[serde(default)]
    pub enable: Option<String>,
}

fn default_column_gap() -> f64 {
    16.0
}

impl ColumnsNode {
    pub fn new(columns: Vec<Vec<Node>>) -> Self {
        Self {
            gap: default_column_gap(),
            columns,
            space_after: default_block_space_after(),
            enable: None,
        }
    }
}

/// Spacer node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpacerNode {
    pub height: f64,
}

/// Horizontal rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RuleNode {
    #[serde(default = "default_rule_color")]
    pub color: Color,

    #[serde(default = "default_rule_thickness")]
    pub thickness: f64,

    /// Whitespace above and below the rule
    #[serde(default = "default_rule_margin")]
    pub margin: f64,
}

fn default_rule_color() -> Color {
    Color::from_rgb(204, 204, 204)
}

fn default_rule_thickness() -> f64 {
    0.5
}

fn default_rule_margin() -> f64 {
    6.0
}

impl Default for RuleNode {
    fn default() -> Self {
        Self {
            color: default_rule_color(),
            thickness: default_rule_thickness(),
            margin: default_rule_margin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_node_defaults() {
        let node: Node = serde_json::from_str(r#"{ "type": "text", "text": "Hi" }"#).unwrap();
        let Node::Text(text) = node else {
            panic!("expected text node");
        };
        assert_eq!(text.font, Font::default());
        assert_eq!(text.line_height, 1.3);
        assert_eq!(text.space_after, 4.0);
        assert_eq!(text.align, Align::Left);
    }

    #[test]
    fn test_font_builders() {
        let font = Font::new(12.0).bold().italic();
        assert_eq!(font.style, FontStyle::BoldItalic);
        assert_eq!(font.size, 12.0);
    }

    #[test]
    fn test_node_enable() {
        let node: Node = serde_json::from_str(
            r#"{ "type": "box", "enable": "$.show", "children": [] }"#,
        )
        .unwrap();
        assert_eq!(node.enable(), Some("$.show"));
        assert_eq!(Node::spacer(4.0).enable(), None);
    }

    #[test]
    fn test_document_defaults() {
        let doc: DocumentSpec = serde_json::from_str(r#"{ "pages": [] }"#).unwrap();
        assert_eq!(doc.page_size, PageFormat::A4);
        assert_eq!(doc.margins, Margins::uniform(50.0));
        assert!(doc.footer.is_none());
    }

    #[test]
    fn test_footer_defaults() {
        let footer: Footer = serde_json::from_str(r#"{ "text": "Page {page}" }"#).unwrap();
        assert_eq!(footer.align, Align::Center);
        assert_eq!(footer.font.size, 8.0);
    }
}
