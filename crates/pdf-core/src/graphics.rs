//! Vector drawing: filled/stroked rectangles and straight rules

use crate::document::Color;
use crate::text::fmt_num;

/// A point in top-left-origin page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in top-left-origin page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Line color and width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// How a shape is painted
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Paint {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fill.is_none() && self.stroke.is_none()
    }
}

fn color_operands(color: Color) -> String {
    format!(
        "{} {} {}",
        fmt_num(color.r as f64),
        fmt_num(color.g as f64),
        fmt_num(color.b as f64)
    )
}

/// Generate operators for a rectangle. `y` is already in PDF (bottom-origin)
/// coordinates and names the rectangle's lower edge.
pub(crate) fn generate_rect_operators(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    paint: &Paint,
) -> Vec<u8> {
    let mut ops = String::from("q\n");

    if let Some(fill) = paint.fill {
        ops.push_str(&format!("{} rg\n", color_operands(fill)));
    }
    if let Some(stroke) = paint.stroke {
        ops.push_str(&format!("{} RG\n", color_operands(stroke.color)));
        ops.push_str(&format!("{} w\n", fmt_num(stroke.width)));
    }

    ops.push_str(&format!(
        "{} {} {} {} re\n",
        fmt_num(x),
        fmt_num(y),
        fmt_num(width),
        fmt_num(height)
    ));

    let paint_op = match (paint.fill.is_some(), paint.stroke.is_some()) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => "n",
    };
    ops.push_str(paint_op);
    ops.push_str("\nQ\n");

    ops.into_bytes()
}

/// Generate operators for a straight line between two PDF-space points
pub(crate) fn generate_line_operators(from: Point, to: Point, stroke: &Stroke) -> Vec<u8> {
    format!(
        "q\n{} RG\n{} w\n{} {} m\n{} {} l\nS\nQ\n",
        color_operands(stroke.color),
        fmt_num(stroke.width),
        fmt_num(from.x),
        fmt_num(from.y),
        fmt_num(to.x),
        fmt_num(to.y)
    )
    .into_bytes()
}
