//! Layout & pagination – flows parsed blocks onto fixed-size pages.
//!
//! Handles:
//! - Greedy word-wrap over mixed-style segments
//! - Page breaks with a bottom safety margin
//! - Keeping headings with the lines that follow them
//! - Hanging-indent lists, separators and explicit breaks
//! - Running headers and "page X of N" footers (filled in after layout, once
//!   the page count is known)

use crate::error::Error;
use crate::fonts::FontMetrics;
use crate::layout_config::{LayoutConfig, TextRole};
use crate::markup::{Alignment, Block, TextSegment};
use crate::model::{LayoutWarning, Line, Page, Rule, Run};

/// Tolerance for floating-point width and height comparisons, in points.
const EPSILON: f32 = 0.01;

/// Gap between a list marker and the item text.
const MARKER_GAP: f32 = 4.0;

// ---------------------------------------------------------------------------
// Word wrap
// ---------------------------------------------------------------------------

/// A same-style run inside a wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedRun {
    pub text: String,
    pub width: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub highlight: bool,
}

impl WrappedRun {
    fn same_style(&self, seg: &TextSegment, bold: bool) -> bool {
        self.bold == bold
            && self.italic == seg.italic
            && self.underline == seg.underline
            && self.highlight == seg.highlight
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrappedLine {
    pub runs: Vec<WrappedRun>,
    pub width: f32,
    pub overflow: bool,
}

impl WrappedLine {
    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Accumulates words into the line being filled.
struct LineBuilder<'a> {
    metrics: &'a FontMetrics,
    font_size: f32,
    line: WrappedLine,
}

impl<'a> LineBuilder<'a> {
    fn new(metrics: &'a FontMetrics, font_size: f32) -> Self {
        Self {
            metrics,
            font_size,
            line: WrappedLine::default(),
        }
    }

    fn push(&mut self, seg: &TextSegment, bold: bool, word: &str) {
        let (metrics, font_size) = (self.metrics, self.font_size);
        let measure = |t: &str| metrics.measure(t, font_size, bold);
        match self.line.runs.last_mut() {
            Some(last) if last.same_style(seg, bold) => {
                last.text.push_str(word);
                last.width = measure(&last.text);
            }
            _ => self.line.runs.push(WrappedRun {
                text: word.to_string(),
                width: measure(word),
                bold,
                italic: seg.italic,
                underline: seg.underline,
                highlight: seg.highlight,
            }),
        }
        self.line.width = self.line.runs.iter().map(|r| r.width).sum();
    }

    /// Complete the line: trailing whitespace is not part of its width.
    fn take(&mut self) -> WrappedLine {
        let mut line = std::mem::take(&mut self.line);
        while let Some(last) = line.runs.last_mut() {
            let trimmed = last.text.trim_end_matches(' ').len();
            if trimmed == last.text.len() {
                break;
            }
            last.text.truncate(trimmed);
            if last.text.is_empty() {
                line.runs.pop();
            } else {
                last.width = self.metrics.measure(&last.text, self.font_size, last.bold);
                break;
            }
        }
        line.width = line.runs.iter().map(|r| r.width).sum();
        line
    }
}

enum Piece<'a> {
    /// A word with its trailing spaces.
    Word(&'a str),
    Newline,
}

fn split_words(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_trailing_space = false;
    for (i, c) in text.char_indices() {
        match c {
            '\n' => {
                if start < i {
                    pieces.push(Piece::Word(&text[start..i]));
                }
                pieces.push(Piece::Newline);
                start = i + 1;
                in_trailing_space = false;
            }
            ' ' => in_trailing_space = true,
            _ => {
                if in_trailing_space {
                    pieces.push(Piece::Word(&text[start..i]));
                    start = i;
                    in_trailing_space = false;
                }
            }
        }
    }
    if start < text.len() {
        pieces.push(Piece::Word(&text[start..]));
    }
    pieces
}

/// Greedy word-wrap of styled segments into lines no wider than
/// `max_width`.
///
/// Words keep their trailing spaces and are measured under their own
/// segment's style; consecutive same-style words share one run. A word that
/// cannot fit even on an empty line is placed alone and the line is flagged
/// as overflowing.
pub fn wrap_segments(
    segments: &[TextSegment],
    font_size: f32,
    force_bold: bool,
    max_width: f32,
    metrics: &FontMetrics,
) -> Vec<WrappedLine> {
    let mut lines = Vec::new();
    let mut builder = LineBuilder::new(metrics, font_size);

    for seg in segments {
        let bold = seg.bold || force_bold;
        for piece in split_words(&seg.text) {
            let word = match piece {
                Piece::Newline => {
                    lines.push(builder.take());
                    continue;
                }
                Piece::Word(w) => w,
            };

            let core = word.trim_end_matches(' ');
            let core_width = metrics.measure(core, font_size, bold);
            if !builder.line.is_empty() && builder.line.width + core_width > max_width + EPSILON {
                lines.push(builder.take());
            }

            let word = if builder.line.is_empty() {
                word.trim_start_matches(' ')
            } else {
                word
            };
            if word.is_empty() {
                continue;
            }
            if builder.line.is_empty() && core_width > max_width + EPSILON {
                log::warn!(
                    "Token {:?} ({:.1}pt) exceeds the {:.1}pt line; placing it alone",
                    core,
                    core_width,
                    max_width
                );
                builder.line.overflow = true;
            }
            builder.push(seg, bold, word);
        }
    }

    if !builder.line.is_empty() {
        lines.push(builder.take());
    }
    lines
}

/// Word-wrap one block the way the layout engine does. Paragraphs and
/// headings give one group of lines; lists give one group per item.
fn wrap_block(block: &Block, config: &LayoutConfig) -> Vec<Vec<WrappedLine>> {
    let metrics = &config.metrics;
    match block {
        Block::Paragraph { segments, .. } => {
            let size = config.style(TextRole::Body).font_size;
            vec![wrap_segments(segments, size, false, config.content_width(), metrics)]
        }
        Block::Heading { level, segments } => {
            let size = config.style(TextRole::Heading(*level)).font_size;
            vec![wrap_segments(segments, size, true, config.content_width(), metrics)]
        }
        Block::List { items, .. } => {
            let size = config.style(TextRole::Body).font_size;
            let width = config.content_width() - config.spacing.list_indent;
            items
                .iter()
                .map(|item| {
                    wrap_segments(&[TextSegment::plain(item.as_str())], size, false, width, metrics)
                })
                .collect()
        }
        Block::Separator | Block::Break => Vec::new(),
    }
}

/// Number of lines the word-wrap pass produces for `blocks`; every one of
/// them must land on some page.
pub fn count_wrapped_lines(blocks: &[Block], config: &LayoutConfig) -> usize {
    blocks
        .iter()
        .flat_map(|b| wrap_block(b, config))
        .map(|group| group.len())
        .sum()
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Repeated page furniture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDecoration {
    /// Running header drawn in the top margin of every page.
    pub header: Option<String>,
    /// Fixed footer text (legal mention, address…).
    pub footer_text: Option<String>,
    pub show_page_numbers: bool,
}

/// Result of a layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
    pub warnings: Vec<LayoutWarning>,
}

struct LayoutEngine<'a> {
    config: &'a LayoutConfig,
    decoration: &'a PageDecoration,
    pages: Vec<Page>,
    current: Page,
    cursor_y: f32,
    /// Spacing owed after the previous block; collapsed with the next
    /// block's space-before.
    pending_gap: f32,
    warnings: Vec<LayoutWarning>,
}

impl<'a> LayoutEngine<'a> {
    fn new(config: &'a LayoutConfig, decoration: &'a PageDecoration) -> Self {
        let mut engine = Self {
            config,
            decoration,
            pages: Vec::new(),
            current: blank_page(1),
            cursor_y: config.content_top(),
            pending_gap: 0.0,
            warnings: Vec::new(),
        };
        engine.current.header = engine.header_line();
        engine
    }

    fn limit(&self) -> f32 {
        self.config.content_bottom() - self.config.bottom_safety_margin
    }

    fn fits(&self, height: f32) -> bool {
        self.cursor_y + height <= self.limit() + EPSILON
    }

    fn page_is_empty(&self) -> bool {
        self.current.lines.is_empty() && self.current.rules.is_empty()
    }

    fn new_page(&mut self) {
        let index = self.current.index + 1;
        let finished = std::mem::replace(&mut self.current, blank_page(index));
        log::debug!(
            "Page {} full with {} lines; starting page {}",
            finished.index,
            finished.lines.len(),
            index
        );
        self.pages.push(finished);
        self.current.header = self.header_line();
        self.cursor_y = self.config.content_top();
        self.pending_gap = 0.0;
    }

    /// Break the page unless `height` still fits below the cursor.
    fn ensure(&mut self, height: f32) {
        if !self.fits(height) && !self.page_is_empty() {
            self.new_page();
        }
    }

    /// Vertical space between blocks; never carried to the top of a page.
    fn gap(&mut self, before: f32) {
        let gap = self.pending_gap.max(before);
        self.pending_gap = 0.0;
        if self.page_is_empty() || gap <= 0.0 {
            return;
        }
        if self.fits(gap) {
            self.cursor_y += gap;
        } else {
            self.new_page();
        }
    }

    fn place_block(&mut self, block: &Block) {
        let config = self.config;
        let spacing = &config.spacing;
        match block {
            Block::Paragraph { alignment, .. } => {
                self.gap(0.0);
                for group in wrap_block(block, self.config) {
                    self.place_lines(group, TextRole::Body, *alignment, 0.0, None);
                }
                self.pending_gap = spacing.paragraph_after;
            }
            Block::Heading { level, .. } => {
                let role = TextRole::Heading(*level);
                self.gap(spacing.heading_before);
                let lines = wrap_block(block, self.config).concat();
                // A heading must not end a page: reserve room for itself and
                // the first lines of what follows.
                let reserve = lines.len() as f32 * self.config.line_height(role)
                    + spacing.heading_after
                    + self.config.heading_keep_with_next_lines as f32
                        * self.config.line_height(TextRole::Body);
                self.ensure(reserve);
                self.place_lines(lines, role, Alignment::Left, 0.0, None);
                self.pending_gap = spacing.heading_after;
            }
            Block::List { ordered, .. } => {
                let (indent, item_gap, after) =
                    (spacing.list_indent, spacing.list_item_gap, spacing.list_after);
                self.gap(0.0);
                for (i, group) in wrap_block(block, self.config).into_iter().enumerate() {
                    if i > 0 {
                        self.gap(item_gap);
                    }
                    let marker = if *ordered {
                        format!("{}.", i + 1)
                    } else {
                        "\u{2022}".to_string()
                    };
                    self.place_lines(group, TextRole::Body, Alignment::Left, indent, Some(marker));
                }
                self.pending_gap = after;
            }
            Block::Separator => {
                let height = spacing.separator_height;
                self.gap(0.0);
                self.ensure(height);
                let y = self.cursor_y + height / 2.0;
                let left = self.config.content_left();
                self.current.rules.push(Rule {
                    x1: left,
                    x2: left + self.config.content_width(),
                    y,
                    thickness: 0.75,
                    color: self.config.style(TextRole::Body).color,
                });
                self.cursor_y += height;
            }
            Block::Break => {
                let height = spacing.break_height;
                self.gap(0.0);
                if !self.page_is_empty() {
                    if self.fits(height) {
                        self.cursor_y += height;
                    } else {
                        self.new_page();
                    }
                }
            }
        }
    }

    fn place_lines(
        &mut self,
        lines: Vec<WrappedLine>,
        role: TextRole,
        alignment: Alignment,
        indent: f32,
        marker: Option<String>,
    ) {
        let style = *self.config.style(role);
        let line_height = self.config.line_height(role);
        let baseline = self
            .config
            .metrics
            .baseline_offset(style.font_size, line_height);
        let left = self.config.content_left() + indent;
        let available = self.config.content_width() - indent;
        let mut marker = marker;

        for wrapped in lines {
            self.ensure(line_height);

            let slack = (available - wrapped.width).max(0.0);
            let x = match alignment {
                Alignment::Left | Alignment::Justify => left,
                Alignment::Center => left + slack / 2.0,
                Alignment::Right => left + slack,
            };

            let mut run_x = x;
            let runs: Vec<Run> = wrapped
                .runs
                .into_iter()
                .map(|r| {
                    let run = Run {
                        text: r.text,
                        x: run_x,
                        width: r.width,
                        font_size: style.font_size,
                        bold: r.bold,
                        italic: r.italic,
                        underline: r.underline,
                        highlight: r.highlight,
                        color: style.color,
                    };
                    run_x += r.width;
                    run
                })
                .collect();

            let marker_run = marker.take().map(|text| {
                let width = self.config.metrics.measure(&text, style.font_size, false);
                Run {
                    x: (left - MARKER_GAP - width).max(self.config.content_left()),
                    width,
                    text,
                    font_size: style.font_size,
                    bold: false,
                    italic: false,
                    underline: false,
                    highlight: false,
                    color: style.color,
                }
            });

            if wrapped.overflow {
                let message = format!(
                    "unbreakable text {:?} overflows the {:.1}pt line ({:.1}pt)",
                    runs.iter().map(|r| r.text.as_str()).collect::<String>(),
                    available,
                    wrapped.width
                );
                self.warnings.push(LayoutWarning {
                    page: self.current.index,
                    message,
                });
            }

            self.current.lines.push(Line {
                x,
                y: self.cursor_y,
                height: line_height,
                baseline,
                width: wrapped.width,
                runs,
                marker: marker_run,
                overflow: wrapped.overflow,
            });
            self.cursor_y += line_height;
        }
    }

    fn header_line(&self) -> Option<Line> {
        let text = self.decoration.header.as_deref()?;
        let style = *self.config.style(TextRole::Header);
        let height = self.config.line_height(TextRole::Header);
        let width = self.config.metrics.measure(text, style.font_size, false);
        let x = self.config.content_left();
        Some(Line {
            x,
            y: ((self.config.margin_top - height) / 2.0).max(0.0),
            height,
            baseline: self.config.metrics.baseline_offset(style.font_size, height),
            width,
            runs: vec![plain_run(text, x, width, style.font_size, style.color)],
            marker: None,
            overflow: false,
        })
    }

    /// Footers need the final page count, so they are rendered only once
    /// every page exists.
    fn footer_line(&self, page: usize, pages: usize) -> Option<Line> {
        let style = *self.config.style(TextRole::Footer);
        let height = self.config.line_height(TextRole::Footer);
        let left = self.config.content_left();
        let right = left + self.config.content_width();
        let metrics = &self.config.metrics;
        let mut runs = Vec::new();

        if let Some(text) = self.decoration.footer_text.as_deref() {
            let width = metrics.measure(text, style.font_size, false);
            runs.push(plain_run(text, left, width, style.font_size, style.color));
        }
        if self.decoration.show_page_numbers {
            let text = self
                .config
                .footer_format
                .replace("{page}", &page.to_string())
                .replace("{pages}", &pages.to_string());
            let width = metrics.measure(&text, style.font_size, false);
            runs.push(plain_run(&text, right - width, width, style.font_size, style.color));
        }
        if runs.is_empty() {
            return None;
        }

        Some(Line {
            x: left,
            y: self.config.content_bottom() + ((self.config.margin_bottom - height) / 2.0).max(0.0),
            height,
            baseline: metrics.baseline_offset(style.font_size, height),
            width: runs.iter().map(|r| r.width).sum(),
            runs,
            marker: None,
            overflow: false,
        })
    }

    fn finish(mut self) -> Layout {
        let last = std::mem::replace(&mut self.current, blank_page(0));
        self.pages.push(last);

        let total = self.pages.len();
        let footers: Vec<Option<Line>> = (1..=total).map(|i| self.footer_line(i, total)).collect();
        for (page, footer) in self.pages.iter_mut().zip(footers) {
            page.footer = footer;
        }
        Layout {
            pages: self.pages,
            warnings: self.warnings,
        }
    }
}

fn blank_page(index: usize) -> Page {
    Page {
        index,
        header: None,
        footer: None,
        lines: Vec::new(),
        rules: Vec::new(),
    }
}

fn plain_run(text: &str, x: f32, width: f32, font_size: f32, color: [f32; 3]) -> Run {
    Run {
        text: text.to_string(),
        x,
        width,
        font_size,
        bold: false,
        italic: false,
        underline: false,
        highlight: false,
        color,
    }
}

/// Lay out `blocks` onto pages.
///
/// Fails only when the configuration cannot hold a single line; the result
/// always has at least one page, even for an empty body.
pub fn layout(
    blocks: &[Block],
    config: &LayoutConfig,
    decoration: &PageDecoration,
) -> Result<Layout, Error> {
    config.validate()?;
    let mut engine = LayoutEngine::new(config, decoration);
    for block in blocks {
        engine.place_block(block);
    }
    let result = engine.finish();
    log::debug!(
        "Laid out {} blocks on {} page(s)",
        blocks.len(),
        result.pages.len()
    );
    Ok(result)
}
