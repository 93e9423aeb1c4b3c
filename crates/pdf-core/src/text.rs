//! Text rendering utilities

use crate::document::Color;
use crate::Align;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
    /// Text color (RGB)
    pub color: Color,
}

/// Format a coordinate for a content stream, dropping insignificant zeros
pub(crate) fn fmt_num(value: f64) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Hex-encode already-encoded string bytes for a `Tj` operand
pub(crate) fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    out.push('<');
    for b in bytes {
        out.push_str(&format!("{b:02X}"));
    }
    out.push('>');
    out
}

/// Generate PDF operators for text insertion
///
/// Creates the proper PDF text operators (BT, Tf, Td, Tj, ET) to render text
/// at a specific position with alignment support.
///
/// # Arguments
/// * `text_hex` - Hex-encoded text (e.g., "<48656C6C6F>")
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `align` - Text alignment
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    text_hex: &str,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let mut ops = String::new();

    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };

    let final_x = x + x_offset;

    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        fmt_num(ctx.color.r as f64),
        fmt_num(ctx.color.g as f64),
        fmt_num(ctx.color.b as f64)
    ));
    ops.push_str(&format!(
        "/{} {} Tf\n",
        ctx.font_name,
        fmt_num(ctx.font_size as f64)
    ));
    ops.push_str(&format!("{} {} Td\n", fmt_num(final_x), fmt_num(y)));
    ops.push_str(&format!("{text_hex} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Split text into lines that fit within `max_width` points.
///
/// `measure` returns the rendered width of a candidate line. Explicit newlines
/// are kept as hard breaks; a single word wider than the line is broken
/// between characters.
pub fn wrap_to_width<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if measure(word) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if measure(&current) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    }
                }
            }
        }

        lines.push(current);
    }

    lines
}
