//! Markup parser – converts substituted letter markup into an ordered list
//! of [`Block`]s carrying styled [`TextSegment`]s.
//!
//! We support a controlled subset of tags:
//! - Blocks: p, h1-h3, ul, ol, li, hr, br
//! - Inline: b/strong, i/em, u, mark
//! - Paragraph alignment via `style="text-align: …"`, `align="…"` or a
//!   `ql-align-…` class
//!
//! The parser never fails. Blocks do not nest (a block opening closes the
//! current one; blocks inside a list item are flattened to text), only one
//! inline style span is active at a time, and text outside any block becomes
//! its own justified paragraph.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Block model
// ---------------------------------------------------------------------------

/// A run of plain text sharing one style combination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Operator-entered value marker; always rendered bold.
    pub highlight: bool,
}

impl TextSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Self::default()
        }
    }

    pub(crate) fn same_style(&self, other: &TextSegment) -> bool {
        self.bold == other.bold
            && self.italic == other.italic
            && self.underline == other.underline
            && self.highlight == other.highlight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    #[default]
    Justify,
}

impl Alignment {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" | "centre" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        segments: Vec<TextSegment>,
        alignment: Alignment,
    },
    Heading {
        level: u8,
        segments: Vec<TextSegment>,
    },
    List {
        items: Vec<String>,
        ordered: bool,
    },
    Separator,
    Break,
}

/// All visible text of `blocks`, one line per block or list item.
pub fn plain_text(blocks: &[Block]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for block in blocks {
        match block {
            Block::Paragraph { segments, .. } | Block::Heading { segments, .. } => {
                lines.push(segments.iter().map(|s| s.text.as_str()).collect());
            }
            Block::List { items, .. } => lines.extend(items.iter().cloned()),
            Block::Separator | Block::Break => {}
        }
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tokenizer – single linear pass over tag boundaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tag {
    P,
    Heading(u8),
    Ul,
    Ol,
    Li,
    Bold,
    Italic,
    Underline,
    Mark,
    Br,
    Hr,
    /// Unsupported tags are transparent: their text is kept.
    Other,
}

impl Tag {
    fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "p" => Tag::P,
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "b" | "strong" => Tag::Bold,
            "i" | "em" => Tag::Italic,
            "u" => Tag::Underline,
            "mark" => Tag::Mark,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            _ => Tag::Other,
        }
    }

    fn is_inline(&self) -> bool {
        matches!(self, Tag::Bold | Tag::Italic | Tag::Underline | Tag::Mark)
    }
}

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    Open {
        tag: Tag,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(Tag),
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Offset of the last '>' in the input.
    last_gt: Option<usize>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            last_gt: input.rfind('>'),
        }
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            if self.eof() {
                return None;
            }
            if !self.starts_with("<") {
                return Some(self.text_until_tag());
            }
            if self.starts_with("<!--") {
                self.skip_past("-->");
                continue;
            }
            if self.starts_with("<!") || self.starts_with("<?") {
                self.skip_past(">");
                continue;
            }
            let next = self.input[self.pos + 1..].chars().next();
            let looks_like_tag = match next {
                Some('/') => true,
                Some(c) => c.is_ascii_alphabetic(),
                None => false,
            };
            // Without a closing '>' the rest is treated as literal text.
            let closes = self.last_gt.is_some_and(|gt| gt > self.pos);
            if !looks_like_tag || !closes {
                let input = self.input;
                let start = self.pos;
                self.advance(1);
                return Some(Token::Text(&input[start..self.pos]));
            }
            return Some(self.tag());
        }
    }

    fn text_until_tag(&mut self) -> Token<'a> {
        let input = self.input;
        let start = self.pos;
        let end = input[start..]
            .find('<')
            .map(|i| start + i)
            .unwrap_or(input.len());
        self.pos = end;
        Token::Text(&input[start..end])
    }

    fn tag(&mut self) -> Token<'a> {
        self.advance(1); // '<'
        let closing = self.starts_with("/");
        if closing {
            self.advance(1);
        }
        let tag = Tag::from_name(self.name());

        if closing {
            self.skip_past(">");
            return Token::Close(tag);
        }

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let key = self.name().to_ascii_lowercase();
            if key.is_empty() {
                // Stray character inside the tag; step over it.
                self.advance(1);
                continue;
            }
            self.skip_whitespace();
            let value = if self.starts_with("=") {
                self.advance(1);
                self.skip_whitespace();
                self.attribute_value()
            } else {
                String::new()
            };
            attributes.push((key, value));
        }

        let self_closing = self.starts_with("/>");
        self.skip_past(">");
        Token::Open {
            tag,
            attributes,
            self_closing,
        }
    }

    fn name(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(1);
            } else {
                break;
            }
        }
        &input[start..self.pos]
    }

    fn attribute_value(&mut self) -> String {
        let quote = match self.current_char() {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                let start = self.pos;
                while let Some(c) = self.current_char() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    self.advance(1);
                }
                return decode_entities(&self.input[start..self.pos]);
            }
        };
        self.advance(1);
        let start = self.pos;
        let end = self.input[start..]
            .find(quote)
            .map(|i| start + i)
            .unwrap_or(self.input.len());
        self.pos = end;
        if !self.eof() {
            self.advance(1);
        }
        decode_entities(&self.input[start..end])
    }

    fn skip_past(&mut self, marker: &str) {
        match self.input[self.pos..].find(marker) {
            Some(i) => self.pos += i + marker.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current_char(), Some(c) if c.is_whitespace()) {
            self.advance(1);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.current_char() {
                self.pos += c.len_utf8();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("ldquo", '\u{201C}'),
    ("rdquo", '\u{201D}'),
    ("laquo", '«'),
    ("raquo", '»'),
    ("hellip", '…'),
    ("ndash", '–'),
    ("mdash", '—'),
    ("euro", '€'),
    ("deg", '°'),
    ("agrave", 'à'),
    ("aacute", 'á'),
    ("acirc", 'â'),
    ("auml", 'ä'),
    ("ccedil", 'ç'),
    ("egrave", 'è'),
    ("eacute", 'é'),
    ("ecirc", 'ê'),
    ("euml", 'ë'),
    ("icirc", 'î'),
    ("iuml", 'ï'),
    ("ocirc", 'ô'),
    ("ouml", 'ö'),
    ("ugrave", 'ù'),
    ("ucirc", 'û'),
    ("uuml", 'ü'),
    ("yuml", 'ÿ'),
    ("oelig", 'œ'),
    ("aelig", 'æ'),
    ("Agrave", 'À'),
    ("Acirc", 'Â'),
    ("Ccedil", 'Ç'),
    ("Egrave", 'È'),
    ("Eacute", 'É'),
    ("Ecirc", 'Ê'),
    ("Icirc", 'Î'),
    ("Ocirc", 'Ô'),
    ("Ugrave", 'Ù'),
    ("OElig", 'Œ'),
];

/// Decode named and numeric character references in a single pass.
/// Unknown references are kept verbatim.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        // References are at most 10 bytes long.
        let decoded = after
            .as_bytes()
            .iter()
            .take(11)
            .position(|&b| b == b';')
            .filter(|&semi| semi > 0)
            .and_then(|semi| decode_reference(&after[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    NAMED_ENTITIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, c)| c)
}

// ---------------------------------------------------------------------------
// Inline collection
// ---------------------------------------------------------------------------

/// Collects the text of one block, tracking the single active style span.
#[derive(Default)]
struct InlineCollector {
    pieces: Vec<Piece>,
    active: Option<Tag>,
    /// Span interrupted by a `<mark>`, restored on `</mark>`.
    outer: Option<Tag>,
}

struct Piece {
    segment: TextSegment,
    hard_break: bool,
}

impl InlineCollector {
    fn current_style(&self) -> TextSegment {
        let mut seg = TextSegment::default();
        for tag in [&self.outer, &self.active].into_iter().flatten() {
            match tag {
                Tag::Bold => seg.bold = true,
                Tag::Italic => seg.italic = true,
                Tag::Underline => seg.underline = true,
                Tag::Mark => {
                    seg.bold = true;
                    seg.highlight = true;
                }
                _ => {}
            }
        }
        seg
    }

    fn push_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let mut segment = self.current_style();
        segment.text = decode_entities(raw);
        self.pieces.push(Piece {
            segment,
            hard_break: false,
        });
    }

    fn hard_break(&mut self) {
        let mut segment = self.current_style();
        segment.text = "\n".to_string();
        self.pieces.push(Piece {
            segment,
            hard_break: true,
        });
    }

    fn open(&mut self, tag: Tag) {
        // Nested spans are not supported: the outer style wins, except for
        // `<mark>`, which always shows.
        let interrupts = tag == Tag::Mark && self.active.as_ref().is_some_and(|a| *a != Tag::Mark);
        if self.active.is_none() {
            self.active = Some(tag);
        } else if interrupts {
            self.outer = self.active.take();
            self.active = Some(tag);
        }
    }

    fn close(&mut self, tag: &Tag) {
        if self.active.as_ref() == Some(tag) {
            self.active = self.outer.take();
        } else if self.outer.as_ref() == Some(tag) {
            self.outer = None;
        }
    }

    fn has_content(&self) -> bool {
        self.pieces
            .iter()
            .any(|p| p.hard_break || !p.segment.text.trim().is_empty())
    }

    /// Collapse whitespace, trim line edges and merge equal-style neighbours.
    fn finish(self) -> Vec<TextSegment> {
        let mut out: Vec<TextSegment> = Vec::new();
        let mut prev_space = true;

        for Piece { segment, hard_break } in self.pieces {
            if hard_break {
                trim_trailing_space(&mut out);
                push_merged(&mut out, segment);
                prev_space = true;
                continue;
            }
            let mut text = String::with_capacity(segment.text.len());
            for c in segment.text.chars() {
                if is_collapsible(c) {
                    if !prev_space {
                        text.push(' ');
                        prev_space = true;
                    }
                } else {
                    text.push(c);
                    prev_space = false;
                }
            }
            push_merged(&mut out, TextSegment { text, ..segment });
        }
        trim_trailing_space(&mut out);

        // Breaks at the block edges carry no content.
        if let Some(first) = out.first_mut() {
            first.text = first.text.trim_start_matches('\n').to_string();
        }
        if let Some(last) = out.last_mut() {
            last.text = last.text.trim_end_matches('\n').to_string();
        }
        out.retain(|s| !s.text.is_empty());
        out
    }
}

fn is_collapsible(c: char) -> bool {
    c.is_whitespace() && c != '\u{00A0}'
}

/// Drop a single trailing space from the last non-empty segment.
fn trim_trailing_space(out: &mut [TextSegment]) {
    if let Some(last) = out.iter_mut().rev().find(|s| !s.text.is_empty()) {
        if last.text.ends_with(' ') {
            last.text.pop();
        }
    }
}

fn push_merged(out: &mut Vec<TextSegment>, seg: TextSegment) {
    if seg.text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(last) if last.same_style(&seg) => last.text.push_str(&seg.text),
        _ => out.push(seg),
    }
}

// ---------------------------------------------------------------------------
// Block building
// ---------------------------------------------------------------------------

enum TextKind {
    Paragraph(Alignment),
    Heading(u8),
}

enum OpenBlock {
    Text {
        kind: TextKind,
        inline: InlineCollector,
    },
    List {
        ordered: bool,
        items: Vec<String>,
        item: Option<InlineCollector>,
    },
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: Option<OpenBlock>,
    stray: InlineCollector,
}

impl BlockBuilder {
    fn collector(&mut self) -> Option<&mut InlineCollector> {
        match &mut self.current {
            Some(OpenBlock::Text { inline, .. }) => Some(inline),
            Some(OpenBlock::List { item, .. }) => item.as_mut(),
            None => Some(&mut self.stray),
        }
    }

    fn in_list(&self) -> bool {
        matches!(self.current, Some(OpenBlock::List { .. }))
    }

    fn text(&mut self, raw: &str) {
        if let Some(OpenBlock::List { item, .. }) = &mut self.current {
            if item.is_none() {
                if raw.trim().is_empty() {
                    return;
                }
                *item = Some(InlineCollector::default());
            }
        }
        if let Some(c) = self.collector() {
            c.push_text(raw);
        }
    }

    fn open(&mut self, tag: Tag, attributes: &[(String, String)], self_closing: bool) {
        match tag {
            Tag::P | Tag::Heading(_) if self.in_list() => {}
            Tag::P => {
                self.begin_block();
                self.current = Some(OpenBlock::Text {
                    kind: TextKind::Paragraph(alignment_hint(attributes)),
                    inline: InlineCollector::default(),
                });
                if self_closing {
                    self.close_current();
                }
            }
            Tag::Heading(level) => {
                self.begin_block();
                self.current = Some(OpenBlock::Text {
                    kind: TextKind::Heading(level),
                    inline: InlineCollector::default(),
                });
                if self_closing {
                    self.close_current();
                }
            }
            Tag::Ul | Tag::Ol if self.in_list() => {}
            Tag::Ul | Tag::Ol => {
                self.begin_block();
                self.current = Some(OpenBlock::List {
                    ordered: tag == Tag::Ol,
                    items: Vec::new(),
                    item: None,
                });
            }
            Tag::Li => {
                if !self.in_list() {
                    self.begin_block();
                    self.current = Some(OpenBlock::List {
                        ordered: false,
                        items: Vec::new(),
                        item: None,
                    });
                }
                if let Some(OpenBlock::List { items, item, .. }) = &mut self.current {
                    finish_item(items, item.take());
                    *item = Some(InlineCollector::default());
                }
            }
            Tag::Br => {
                let top_level_gap = self.current.is_none() && !self.stray.has_content();
                if top_level_gap {
                    self.blocks.push(Block::Break);
                } else if let Some(c) = self.collector() {
                    c.hard_break();
                }
            }
            Tag::Hr => {
                self.begin_block();
                self.blocks.push(Block::Separator);
            }
            t if t.is_inline() => {
                if let Some(c) = self.collector() {
                    c.open(t);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: Tag) {
        match tag {
            Tag::P | Tag::Heading(_) => {
                if matches!(self.current, Some(OpenBlock::Text { .. })) {
                    self.close_current();
                }
            }
            Tag::Ul | Tag::Ol => {
                if self.in_list() {
                    self.close_current();
                }
            }
            Tag::Li => {
                if let Some(OpenBlock::List { items, item, .. }) = &mut self.current {
                    finish_item(items, item.take());
                }
            }
            t if t.is_inline() => {
                if let Some(c) = self.collector() {
                    c.close(&t);
                }
            }
            _ => {}
        }
    }

    /// Close whatever is open and flush stray text before a new block.
    fn begin_block(&mut self) {
        self.close_current();
        self.flush_stray();
    }

    fn flush_stray(&mut self) {
        let stray = std::mem::take(&mut self.stray);
        let segments = stray.finish();
        if !segments.is_empty() {
            self.blocks.push(Block::Paragraph {
                segments,
                alignment: Alignment::Justify,
            });
        }
    }

    fn close_current(&mut self) {
        match self.current.take() {
            Some(OpenBlock::Text { kind, inline }) => {
                let segments = inline.finish();
                if segments.is_empty() {
                    return;
                }
                self.blocks.push(match kind {
                    TextKind::Paragraph(alignment) => Block::Paragraph {
                        segments,
                        alignment,
                    },
                    TextKind::Heading(level) => Block::Heading { level, segments },
                });
            }
            Some(OpenBlock::List {
                ordered,
                mut items,
                item,
            }) => {
                finish_item(&mut items, item);
                if !items.is_empty() {
                    self.blocks.push(Block::List { items, ordered });
                }
            }
            None => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.close_current();
        self.flush_stray();
        self.blocks
    }
}

fn finish_item(items: &mut Vec<String>, item: Option<InlineCollector>) {
    if let Some(collector) = item {
        let text: String = collector
            .finish()
            .into_iter()
            .map(|s| s.text)
            .collect();
        if !text.is_empty() {
            items.push(text);
        }
    }
}

fn alignment_hint(attributes: &[(String, String)]) -> Alignment {
    for (key, value) in attributes {
        let hint = match key.as_str() {
            "align" => Alignment::parse(value),
            "style" => value.split(';').find_map(|decl| {
                let (prop, val) = decl.split_once(':')?;
                if prop.trim().eq_ignore_ascii_case("text-align") {
                    Alignment::parse(val)
                } else {
                    None
                }
            }),
            "class" => value
                .split_whitespace()
                .find_map(|c| c.strip_prefix("ql-align-").and_then(Alignment::parse)),
            _ => None,
        };
        if let Some(a) = hint {
            return a;
        }
    }
    Alignment::default()
}

/// Parse letter markup into blocks. Never fails; see the module docs for
/// the degradation rules.
pub fn parse(markup: &str) -> Vec<Block> {
    let mut lexer = Lexer::new(markup);
    let mut builder = BlockBuilder::default();
    while let Some(token) = lexer.next_token() {
        match token {
            Token::Text(t) => builder.text(t),
            Token::Open {
                tag,
                attributes,
                self_closing,
            } => builder.open(tag, &attributes, self_closing),
            Token::Close(tag) => builder.close(tag),
        }
    }
    builder.finish()
}
