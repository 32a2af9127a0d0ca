//! Font metrics and text measurement.
//!
//! Letters are set in the PDF base-14 Helvetica family, so measurement uses
//! the Helvetica / Helvetica-Bold advance widths (1/1000 em). The table is
//! built explicitly and handed to the layout engine inside
//! [`LayoutConfig`](crate::layout_config::LayoutConfig); there is no global
//! font registry. Oblique faces share the upright advances.

/// Advance widths for U+0020..=U+007E, Helvetica.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Advance widths for U+0020..=U+007E, Helvetica-Bold.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

/// Immutable width table for one regular/bold font pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    regular: [u16; 95],
    bold: [u16; 95],
    /// Width used for characters outside the table.
    fallback: u16,
    /// Ascender in 1/1000 em, used to place baselines.
    pub ascender: f32,
    /// Descender in 1/1000 em (negative).
    pub descender: f32,
}

impl FontMetrics {
    pub fn helvetica() -> Self {
        Self {
            regular: HELVETICA,
            bold: HELVETICA_BOLD,
            fallback: 556,
            ascender: 718.0,
            descender: -207.0,
        }
    }

    /// Advance of a single character in 1/1000 em.
    fn advance(&self, c: char, bold: bool) -> u16 {
        let table = if bold { &self.bold } else { &self.regular };
        let c = base_letter(c);
        let code = c as u32;
        if (0x20..=0x7E).contains(&code) {
            return table[(code - 0x20) as usize];
        }
        match c {
            '\u{00A0}' => table[0],
            '\u{2018}' | '\u{2019}' | '\u{201A}' => {
                if bold {
                    278
                } else {
                    222
                }
            }
            '\u{201C}' | '\u{201D}' | '\u{201E}' => {
                if bold {
                    500
                } else {
                    333
                }
            }
            '«' | '»' | '€' | '–' => 556,
            '—' | '…' => 1000,
            '°' => 400,
            '•' => 350,
            'œ' => 944,
            'æ' => 889,
            'Œ' | 'Æ' => 1000,
            _ => self.fallback,
        }
    }

    /// Width of `text` in points at `font_size`.
    pub fn measure(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let units: u32 = text
            .chars()
            .filter(|&c| c != '\n')
            .map(|c| self.advance(c, bold) as u32)
            .sum();
        units as f32 * font_size / 1000.0
    }

    /// Line height in points for a size and a line-height factor.
    pub fn line_height(&self, font_size: f32, factor: f32) -> f32 {
        font_size * factor
    }

    /// Distance from the top of a line box to its baseline.
    pub fn baseline_offset(&self, font_size: f32, line_height: f32) -> f32 {
        let content = (self.ascender - self.descender) * font_size / 1000.0;
        (line_height - content) / 2.0 + self.ascender * font_size / 1000.0
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::helvetica()
    }
}

/// Accented Latin letters share the advance of their base letter.
fn base_letter(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' | 'Ÿ' => 'Y',
        other => other,
    }
}
