//! Page model – the frozen output of layout. It encodes exactly what goes
//! on each page and is handed to an encoder (PDF, JSON) or to storage.

use serde::{Deserialize, Serialize};

/// A styled, positioned piece of text within a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    /// Page-absolute x of the run start, in points.
    pub x: f32,
    /// Measured advance width, in points.
    pub width: f32,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub highlight: bool,
    pub color: [f32; 3],
}

/// One laid-out line. `y` is the top of the line box, page-absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x: f32,
    pub y: f32,
    pub height: f32,
    /// Baseline offset from `y`.
    pub baseline: f32,
    /// Sum of the run widths, excluding any list marker.
    pub width: f32,
    pub runs: Vec<Run>,
    /// Bullet or number drawn in the hanging indent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Run>,
    /// Set when a single unbreakable token exceeded the available width.
    #[serde(default)]
    pub overflow: bool,
}

impl Line {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A horizontal separator rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
    pub thickness: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub index: usize,
    pub header: Option<Line>,
    pub footer: Option<Line>,
    pub lines: Vec<Line>,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
}

/// A warning raised during layout that did not prevent completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutWarning {
    pub page: usize,
    pub message: String,
}

/// The finished letter: its structured parts plus the laid-out pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub metadata: DocumentMetadata,
    pub letterhead: Vec<String>,
    pub place_date: String,
    pub recipient: Vec<String>,
    pub subject: String,
    pub greeting: String,
    pub closing: String,
    pub signature: Vec<String>,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub warnings: Vec<LayoutWarning>,
}

impl GeneratedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Visible body text of every page, line by line.
    pub fn text_lines(&self) -> Vec<String> {
        self.pages
            .iter()
            .flat_map(|p| p.lines.iter().map(Line::text))
            .collect()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, crate::error::Error> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32) -> Run {
        Run {
            text: text.into(),
            x,
            width: 10.0,
            font_size: 11.0,
            bold: false,
            italic: false,
            underline: false,
            highlight: false,
            color: [0.0, 0.0, 0.0],
        }
    }

    fn line(runs: Vec<Run>) -> Line {
        Line {
            x: 0.0,
            y: 0.0,
            height: 14.0,
            baseline: 11.0,
            width: 20.0,
            runs,
            marker: None,
            overflow: false,
        }
    }

    #[test]
    fn line_text_concatenates_runs() {
        let l = line(vec![run("Bonjour ", 0.0), run("Jean", 10.0)]);
        assert_eq!(l.text(), "Bonjour Jean");
    }

    #[test]
    fn marker_and_warnings_are_optional_in_json() {
        let json = r#"{"x":0,"y":0,"height":14,"baseline":11,"width":0,"runs":[]}"#;
        let l: Line = serde_json::from_str(json).unwrap();
        assert!(l.marker.is_none());
        assert!(!l.overflow);
        assert!(!serde_json::to_string(&l).unwrap().contains("marker"));
    }

    #[test]
    fn text_lines_skip_header_and_footer() {
        let doc = GeneratedDocument {
            metadata: DocumentMetadata::default(),
            letterhead: vec![],
            place_date: String::new(),
            recipient: vec![],
            subject: String::new(),
            greeting: String::new(),
            closing: String::new(),
            signature: vec![],
            page_width_pt: 595.0,
            page_height_pt: 842.0,
            pages: vec![Page {
                index: 1,
                header: Some(line(vec![run("En-tête", 0.0)])),
                footer: Some(line(vec![run("Page 1/1", 0.0)])),
                lines: vec![line(vec![run("Corps", 0.0)])],
                rules: vec![],
            }],
            warnings: vec![],
        };
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.text_lines(), vec!["Corps".to_string()]);
        assert_eq!(GeneratedDocument::from_json(&doc.to_json()).unwrap(), doc);
    }
}
