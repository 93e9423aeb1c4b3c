//! Laid-out blocks
//!
//! Layout turns nodes into [`LaidBlock`]s: fixed-height strips whose drawing
//! operations are positioned relative to the strip's top-left corner.
//! Pagination only ever moves whole blocks, so anything that may split across
//! pages (paragraph lines, table rows) is emitted as several blocks.

use crate::schema::{Align, Border, Color, Font, TableNode, TextNode};

/// Trait for nodes that can provide their text content
pub trait TextContent {
    /// Get the text content (either static or bound)
    fn get_text(&self, data: &serde_json::Value) -> Option<String>;
}

impl TextContent for TextNode {
    fn get_text(&self, data: &serde_json::Value) -> Option<String> {
        if let Some(bind) = &self.bind {
            crate::parser::resolve_binding(bind, data).map(crate::parser::value_to_string)
        } else {
            self.text.clone()
        }
    }
}

impl TableNode {
    /// Cell strings for every row, from the binding if present
    pub fn resolve_rows(&self, data: &serde_json::Value) -> Vec<Vec<String>> {
        let Some(bind) = &self.bind else {
            return self.rows.clone();
        };

        let Some(rows) = crate::parser::resolve_binding(bind, data).and_then(|v| v.as_array())
        else {
            return Vec::new();
        };

        rows.iter()
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        let cell = match (&col.field, row) {
                            (Some(field), _) => row.get(field),
                            (None, serde_json::Value::Array(cells)) => cells.get(i),
                            (None, _) => None,
                        };
                        cell.map(crate::parser::value_to_string)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

/// A positioned drawing operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A single line of text; `x` is the anchor for `align`
    Text {
        x: f64,
        baseline: f64,
        text: String,
        font: Font,
        align: Align,
    },
    /// Rectangle with optional fill and border
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        border: Option<Border>,
    },
    /// Straight line
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        width: f64,
    },
}

impl DrawOp {
    fn shifted(&self, dx: f64, dy: f64) -> DrawOp {
        let mut op = self.clone();
        match &mut op {
            DrawOp::Text { x, baseline, .. } => {
                *x += dx;
                *baseline += dy;
            }
            DrawOp::Rect { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            DrawOp::Line { x1, y1, x2, y2, .. } => {
                *x1 += dx;
                *x2 += dx;
                *y1 += dy;
                *y2 += dy;
            }
        }
        op
    }
}

/// A fixed-height strip of drawing operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidBlock {
    pub height: f64,
    pub ops: Vec<DrawOp>,
    /// Drawn above this block when it is the first block on a continuation page
    pub repeat_header: Option<Box<LaidBlock>>,
}

impl LaidBlock {
    pub fn empty(height: f64) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    /// Copy `other`'s operations into this block at an offset
    pub fn append_at(&mut self, other: &LaidBlock, dx: f64, dy: f64) {
        self.ops
            .extend(other.ops.iter().map(|op| op.shifted(dx, dy)));
    }

    /// Stack blocks vertically into one block
    pub fn stack(blocks: &[LaidBlock]) -> LaidBlock {
        let mut out = LaidBlock::default();
        for block in blocks {
            out.append_at(block, 0.0, out.height);
            out.height += block.height;
        }
        out
    }

    /// Operations translated by an offset
    pub fn ops_at(&self, dx: f64, dy: f64) -> impl Iterator<Item = DrawOp> + '_ {
        self.ops.iter().map(move |op| op.shifted(dx, dy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableColumn;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rect_at(y: f64) -> DrawOp {
        DrawOp::Rect {
            x: 0.0,
            y,
            width: 10.0,
            height: 10.0,
            fill: Some(Color::black()),
            border: None,
        }
    }

    #[test]
    fn test_text_content_with_bind() {
        let node = TextNode {
            bind: Some("$.contract.title".to_string()),
            ..TextNode::default()
        };

        let data = json!({ "contract": { "title": "Service Agreement" } });
        assert_eq!(node.get_text(&data), Some("Service Agreement".to_string()));
    }

    #[test]
    fn test_text_content_static() {
        let node = TextNode {
            text: Some("Static text".to_string()),
            ..TextNode::default()
        };
        assert_eq!(node.get_text(&json!({})), Some("Static text".to_string()));
    }

    #[test]
    fn test_table_rows_from_objects_and_arrays() {
        let mut table = TableNode::new(
            vec![TableColumn::new("Invoice", 1.0), TableColumn::new("Amount", 1.0)],
            Vec::new(),
        );
        table.columns[0].field = Some("number".to_string());
        table.columns[1].field = Some("amount".to_string());
        table.bind = Some("$.invoices".to_string());

        let data = json!({ "invoices": [ { "number": "INV-1", "amount": 120 }, { "number": "INV-2" } ] });
        assert_eq!(
            table.resolve_rows(&data),
            vec![vec!["INV-1", "120"], vec!["INV-2", ""]]
        );

        table.columns[0].field = None;
        table.columns[1].field = None;
        let data = json!({ "invoices": [ ["a", "b"] ] });
        assert_eq!(table.resolve_rows(&data), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_table_rows_missing_binding() {
        let mut table = TableNode::new(vec![TableColumn::new("A", 1.0)], Vec::new());
        table.bind = Some("$.nothing".to_string());
        assert!(table.resolve_rows(&json!({})).is_empty());
    }

    #[test]
    fn test_stack_offsets_ops() {
        let a = LaidBlock {
            height: 10.0,
            ops: vec![rect_at(0.0)],
            repeat_header: None,
        };
        let b = LaidBlock {
            height: 20.0,
            ops: vec![rect_at(0.0)],
            repeat_header: None,
        };

        let stacked = LaidBlock::stack(&[a, b]);
        assert_eq!(stacked.height, 30.0);
        assert_eq!(stacked.ops, vec![rect_at(0.0), rect_at(10.0)]);
    }
}
