//! Layout config – page geometry, per-role text styles and spacing rules.
//!
//! Immutable input to the layout engine, shared by reference for a whole
//! generation. Serialisable so callers can keep house styles as JSON; every
//! field has a default (A4 portrait, 2 cm margins).

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fonts::FontMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub styles: StyleTable,
    pub spacing: Spacing,
    /// Space kept free above the bottom margin before a page break is forced.
    pub bottom_safety_margin: f32,
    /// Body lines that must fit below a heading for it to stay on the page.
    pub heading_keep_with_next_lines: u32,
    /// Footer pattern; `{page}` and `{pages}` are replaced after layout.
    pub footer_format: String,
    #[serde(skip)]
    pub metrics: FontMetrics,
}

/// Size, line-height factor and colour of one text role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: f32,
    pub line_height: f32,
    pub color: [f32; 3],
}

impl TextStyle {
    const fn new(font_size: f32, line_height: f32, color: [f32; 3]) -> Self {
        Self {
            font_size,
            line_height,
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Body,
    Heading(u8),
    Header,
    Footer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleTable {
    pub body: TextStyle,
    pub h1: TextStyle,
    pub h2: TextStyle,
    pub h3: TextStyle,
    pub header: TextStyle,
    pub footer: TextStyle,
    /// Fill drawn behind highlighted (custom value) runs.
    pub highlight_color: [f32; 3],
}

const BLACK: [f32; 3] = [0.0, 0.0, 0.0];
const DARK_BLUE: [f32; 3] = [0.10, 0.21, 0.36];
const GRAY: [f32; 3] = [0.45, 0.45, 0.45];

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            body: TextStyle::new(11.0, 1.4, BLACK),
            h1: TextStyle::new(16.0, 1.3, DARK_BLUE),
            h2: TextStyle::new(14.0, 1.3, DARK_BLUE),
            h3: TextStyle::new(12.0, 1.3, BLACK),
            header: TextStyle::new(8.0, 1.3, GRAY),
            footer: TextStyle::new(8.0, 1.3, GRAY),
            highlight_color: [1.0, 0.93, 0.55],
        }
    }
}

impl StyleTable {
    pub fn get(&self, role: TextRole) -> &TextStyle {
        match role {
            TextRole::Body => &self.body,
            TextRole::Heading(1) => &self.h1,
            TextRole::Heading(2) => &self.h2,
            TextRole::Heading(_) => &self.h3,
            TextRole::Header => &self.header,
            TextRole::Footer => &self.footer,
        }
    }
}

/// Vertical and horizontal spacing rules, in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub paragraph_after: f32,
    pub heading_before: f32,
    pub heading_after: f32,
    pub list_item_gap: f32,
    pub list_after: f32,
    /// Hanging indent of list item text; the marker sits left of it.
    pub list_indent: f32,
    pub separator_height: f32,
    pub break_height: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            paragraph_after: 6.0,
            heading_before: 10.0,
            heading_after: 4.0,
            list_item_gap: 2.0,
            list_after: 6.0,
            list_indent: 18.0,
            separator_height: 12.0,
            break_height: 11.0,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::a4()
    }
}

impl LayoutConfig {
    /// A4 portrait with 2 cm margins.
    pub fn a4() -> Self {
        Self {
            // A4: 210mm × 297mm = 595.28 × 841.89 points
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            margin_top: 56.69,
            margin_right: 56.69,
            margin_bottom: 56.69,
            margin_left: 56.69,
            styles: StyleTable::default(),
            spacing: Spacing::default(),
            bottom_safety_margin: 4.0,
            heading_keep_with_next_lines: 1,
            footer_format: "Page {page}/{pages}".to_string(),
            metrics: FontMetrics::helvetica(),
        }
    }

    pub fn content_left(&self) -> f32 {
        self.margin_left
    }

    pub fn content_width(&self) -> f32 {
        self.page_width_pt - self.margin_left - self.margin_right
    }

    pub fn content_top(&self) -> f32 {
        self.margin_top
    }

    pub fn content_bottom(&self) -> f32 {
        self.page_height_pt - self.margin_bottom
    }

    pub fn style(&self, role: TextRole) -> &TextStyle {
        self.styles.get(role)
    }

    pub fn line_height(&self, role: TextRole) -> f32 {
        let s = self.style(role);
        self.metrics.line_height(s.font_size, s.line_height)
    }

    /// Reject geometries the layout engine cannot fill.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.content_width() > 0.0) {
            return Err(Error::InvalidLayout(format!(
                "content width {:.2}pt is not positive",
                self.content_width()
            )));
        }
        let usable = self.content_bottom() - self.bottom_safety_margin - self.content_top();
        let tallest = [
            TextRole::Body,
            TextRole::Heading(1),
            TextRole::Heading(2),
            TextRole::Heading(3),
        ]
        .into_iter()
        .map(|r| self.line_height(r))
        .fold(0.0f32, f32::max);
        if usable < tallest {
            return Err(Error::InvalidLayout(format!(
                "content height {usable:.2}pt cannot hold a {tallest:.2}pt line"
            )));
        }
        if self.spacing.list_indent >= self.content_width() {
            return Err(Error::InvalidLayout(
                "list indent leaves no room for item text".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_content_box() {
        let c = LayoutConfig::a4();
        assert!((c.content_width() - (595.28 - 2.0 * 56.69)).abs() < 0.01);
        assert!(c.content_bottom() > c.content_top());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = LayoutConfig::from_json(r#"{"margin_left": 30, "spacing": {"list_indent": 24}}"#)
            .unwrap();
        assert_eq!(c.margin_left, 30.0);
        assert_eq!(c.spacing.list_indent, 24.0);
        assert_eq!(c.spacing.paragraph_after, Spacing::default().paragraph_after);
        assert_eq!(c.page_width_pt, 595.28);
    }

    #[test]
    fn json_round_trip() {
        let c = LayoutConfig::a4();
        let back = LayoutConfig::from_json(&c.to_json()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let c = LayoutConfig {
            margin_left: 300.0,
            margin_right: 300.0,
            ..LayoutConfig::a4()
        };
        assert!(matches!(c.validate(), Err(Error::InvalidLayout(_))));

        let c = LayoutConfig {
            page_height_pt: 120.0,
            ..LayoutConfig::a4()
        };
        assert!(c.validate().is_err());
    }
}
