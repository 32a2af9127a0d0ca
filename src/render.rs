//! Encoders – turn a laid-out [`GeneratedDocument`] into bytes.
//!
//! The layout engine never touches an output format; an encoder only walks
//! pages, lines and runs. [`PdfEncoder`] writes PDF with `printpdf` (v0.8
//! ops-based API) using the builtin Helvetica family, [`JsonEncoder`] dumps
//! the page model itself.

use printpdf::*;

use crate::error::Error;
use crate::layout_config::LayoutConfig;
use crate::model::{self, GeneratedDocument, Line as TextLine, Run};

/// Output adapter over the page model.
pub trait DocumentEncoder {
    fn encode(&self, doc: &GeneratedDocument) -> Result<Vec<u8>, Error>;
}

/// PDF output through `printpdf`.
#[derive(Debug, Clone)]
pub struct PdfEncoder {
    /// Fill drawn behind highlighted runs.
    pub highlight_color: [f32; 3],
}

impl PdfEncoder {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            highlight_color: config.styles.highlight_color,
        }
    }
}

impl Default for PdfEncoder {
    fn default() -> Self {
        Self::new(&LayoutConfig::a4())
    }
}

impl DocumentEncoder for PdfEncoder {
    fn encode(&self, doc: &GeneratedDocument) -> Result<Vec<u8>, Error> {
        let page_w = Mm(doc.page_width_pt * 0.352778); // pt → mm
        let page_h = Mm(doc.page_height_pt * 0.352778);

        let mut pdf = PdfDocument::new(&doc.metadata.title);

        let mut pages: Vec<PdfPage> = doc
            .pages
            .iter()
            .map(|page| PdfPage::new(page_w, page_h, self.page_ops(page, doc.page_height_pt)))
            .collect();

        // Ensure at least one page.
        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        pdf.with_pages(pages);
        let mut warnings = Vec::new();
        let bytes = pdf.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            log::debug!("printpdf reported {} warning(s) while saving", warnings.len());
        }

        if !bytes.starts_with(b"%PDF-") {
            return Err(Error::Encoding("printpdf produced no PDF header".to_string()));
        }
        Ok(bytes)
    }
}

impl PdfEncoder {
    fn page_ops(&self, page: &model::Page, page_height: f32) -> Vec<Op> {
        let mut ops = Vec::new();

        for rule in &page.rules {
            // Layout origin is top-left, PDF origin bottom-left.
            let y = page_height - rule.y;
            stroke_line(&mut ops, (rule.x1, y), (rule.x2, y), rule.thickness, rule.color);
        }

        let lines = page
            .header
            .iter()
            .chain(page.lines.iter())
            .chain(page.footer.iter());
        for line in lines {
            self.line_ops(&mut ops, line, page_height);
        }
        ops
    }

    fn line_ops(&self, ops: &mut Vec<Op>, line: &TextLine, page_height: f32) {
        let top = page_height - line.y;
        let bottom = top - line.height;
        let baseline = page_height - (line.y + line.baseline);

        for run in line.runs.iter().filter(|r| r.highlight) {
            fill_rect(ops, run.x, bottom, run.x + run.width, top, self.highlight_color);
        }

        if let Some(marker) = &line.marker {
            write_run(ops, marker, baseline);
        }
        for run in &line.runs {
            if run.text.is_empty() {
                continue;
            }
            write_run(ops, run, baseline);
            if run.underline {
                let y = baseline - run.font_size * 0.1;
                stroke_line(ops, (run.x, y), (run.x + run.width, y), 0.5, run.color);
            }
        }
    }
}

/// Page-model dump, the same structure `GeneratedDocument::to_json` gives.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl DocumentEncoder for JsonEncoder {
    fn encode(&self, doc: &GeneratedDocument) -> Result<Vec<u8>, Error> {
        serde_json::to_vec_pretty(doc).map_err(|e| Error::Encoding(e.to_string()))
    }
}

/// Encode a document to PDF with the highlight colour from `config`.
pub fn render_pdf(doc: &GeneratedDocument, config: &LayoutConfig) -> Result<Vec<u8>, Error> {
    PdfEncoder::new(config).encode(doc)
}

fn builtin_font(run: &Run) -> BuiltinFont {
    match (run.bold, run.italic) {
        (true, true) => BuiltinFont::HelveticaBoldOblique,
        (true, false) => BuiltinFont::HelveticaBold,
        (false, true) => BuiltinFont::HelveticaOblique,
        (false, false) => BuiltinFont::Helvetica,
    }
}

fn rgb(c: [f32; 3]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn write_run(ops: &mut Vec<Op>, run: &Run, baseline: f32) {
    let font = builtin_font(run);
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(run.x),
            y: Pt(baseline),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(run.font_size),
        font,
    });
    ops.push(Op::SetFillColor { col: rgb(run.color) });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(to_winlatin(&run.text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

fn fill_rect(ops: &mut Vec<Op>, x1: f32, y1: f32, x2: f32, y2: f32, color: [f32; 3]) {
    ops.push(Op::SetFillColor { col: rgb(color) });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing {
                points: vec![point(x1, y1), point(x2, y1), point(x2, y2), point(x1, y2)],
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

fn stroke_line(ops: &mut Vec<Op>, from: (f32, f32), to: (f32, f32), thickness: f32, color: [f32; 3]) {
    ops.push(Op::SetOutlineThickness { pt: Pt(thickness) });
    ops.push(Op::SetOutlineColor { col: rgb(color) });
    ops.push(Op::DrawLine {
        line: printpdf::Line {
            points: vec![point(from.0, from.1), point(to.0, to.1)],
            is_closed: false,
        },
    });
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{0152}' => 0x8C, // OE ligature
            '\u{0153}' => 0x9C, // oe ligature
            '\u{0178}' => 0x9F, // Y diaeresis
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0xFF; printpdf passes these
    // bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}
