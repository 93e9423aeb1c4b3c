//! Standard (base-14) fonts for PDF documents
//!
//! Only the Helvetica family is provided. The fonts are referenced by name and
//! never embedded, so glyph widths come from the built-in tables below
//! (Adobe core font metrics, units of 1/1000 em).

use lopdf::{dictionary, Dictionary};

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// One of the standard Helvetica faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

/// Family names accepted by [`StandardFont::resolve`]
const HELVETICA_ALIASES: &[&str] = &["helvetica", "sans", "sans-serif", "arial"];

/// Advance widths for ASCII 32..=126, Helvetica regular and oblique
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

/// Advance widths for ASCII 32..=126, Helvetica bold and bold oblique
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

impl StandardFont {
    /// Pick the face for a family name and variant.
    ///
    /// Returns `None` when the family is not one of the Helvetica aliases.
    pub fn resolve(family: &str, weight: FontWeight, style: FontStyle) -> Option<Self> {
        let family = family.to_ascii_lowercase();
        if !HELVETICA_ALIASES.contains(&family.as_str()) {
            return None;
        }

        Some(match (weight, style) {
            (FontWeight::Regular, FontStyle::Normal) => StandardFont::Helvetica,
            (FontWeight::Bold, FontStyle::Normal) => StandardFont::HelveticaBold,
            (FontWeight::Regular, FontStyle::Italic) => StandardFont::HelveticaOblique,
            (FontWeight::Bold, FontStyle::Italic) => StandardFont::HelveticaBoldOblique,
        })
    }

    /// PostScript name used as `/BaseFont`
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    fn is_bold(&self) -> bool {
        matches!(
            self,
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique
        )
    }

    /// Advance width of a WinAnsi-encoded byte in 1/1000 em
    pub fn byte_width(&self, byte: u8) -> u16 {
        let table = if self.is_bold() {
            &HELVETICA_BOLD_WIDTHS
        } else {
            &HELVETICA_WIDTHS
        };

        match byte {
            32..=126 => table[(byte - 32) as usize],
            0x85 | 0x97 => 1000,
            0x95 => 350,
            0x96 => 556,
            0x91 | 0x92 => {
                if self.is_bold() {
                    278
                } else {
                    222
                }
            }
            0x93 | 0x94 => {
                if self.is_bold() {
                    500
                } else {
                    333
                }
            }
            0xA0 => 278,
            _ => 556,
        }
    }

    /// Width of `text` in 1/1000 em units
    pub fn text_width(&self, text: &str) -> u32 {
        encode_win_ansi(text)
            .into_iter()
            .map(|b| self.byte_width(b) as u32)
            .sum()
    }

    /// Width of `text` in points at the given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f32 {
        self.text_width(text) as f32 * font_size / 1000.0
    }

    /// Font dictionary referencing the base font by name
    pub fn to_pdf_dictionary(&self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }
}

/// Encode text as WinAnsi (CP1252) bytes.
///
/// Characters without a WinAnsi code point become `?`; tabs become spaces and
/// other control characters are dropped.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().filter_map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\t' => b' ',
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        c if c.is_control() => return None,
        _ => b'?',
    };
    Some(byte)
}
