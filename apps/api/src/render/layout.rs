//! Pagination: `RenderedDocument` → positioned draw operations per A4 page.
//!
//! Coordinates are PDF user space (points, origin bottom-left). Every text op
//! carries its baseline; lines are placed top-down and a new page starts when
//! the next line would cross the bottom margin. Section titles are kept with
//! their first content line.

use crate::render::document::{Block, RenderedDocument, Section};
use crate::render::font_metrics::FontFace;

pub const PAGE_WIDTH_PT: f32 = 595.0;
pub const PAGE_HEIGHT_PT: f32 = 842.0;
pub const MARGIN_PT: f32 = 40.0;
pub const CONTENT_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;

const BODY_SIZE: f32 = 11.0;
const BODY_LEADING: f32 = 15.0;
const TITLE_SIZE: f32 = 22.0;
const TITLE_LEADING: f32 = 30.0;
const SECTION_TITLE_SIZE: f32 = 14.0;
const SECTION_TITLE_LEADING: f32 = 18.0;
const SECTION_GAP: f32 = 14.0;
const RULE_GAP: f32 = 6.0;
const SPACER: f32 = 6.0;
const TABLE_HEADER_GAP: f32 = 2.0;
/// A table heading never ends a page: it is kept with its first row.
const TABLE_HEAD_HEIGHT: f32 = 2.0 * BODY_LEADING + TABLE_HEADER_GAP;
const BULLET_INDENT: f32 = 8.0;
const BULLET_TEXT_INDENT: f32 = 20.0;
/// Label column share of a two-column row.
const LABEL_COLUMN: f32 = 0.35;
const COLUMN_GUTTER: f32 = 8.0;

/// RGB in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
/// #4E81BD, the section accent colour.
pub const ACCENT: Rgb = Rgb(0.306, 0.506, 0.741);
pub const MUTED: Rgb = Rgb(0.6, 0.6, 0.6);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        face: FontFace,
        size: f32,
        color: Rgb,
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        width: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

/// Lays the document out on as many pages as it needs (at least one).
pub fn layout(doc: &RenderedDocument) -> Vec<PageLayout> {
    let mut cursor = Cursor::new();
    for (index, section) in doc.sections.iter().enumerate() {
        if index > 0 {
            cursor.advance(SECTION_GAP);
        }
        lay_out_section(&mut cursor, section);
    }
    cursor.finish()
}

fn lay_out_section(cursor: &mut Cursor, section: &Section) {
    if let Some(title) = section.kind.title() {
        // Title, rule and the first line of content must share a page.
        let first = match section.blocks.first() {
            Some(Block::TableHeader { .. }) => TABLE_HEAD_HEIGHT,
            _ => BODY_LEADING,
        };
        cursor.ensure(SECTION_TITLE_LEADING + RULE_GAP + first);
        cursor.text_line(
            MARGIN_PT,
            FontFace::Bold,
            SECTION_TITLE_SIZE,
            SECTION_TITLE_LEADING,
            ACCENT,
            title,
        );
        cursor.rule(MARGIN_PT, PAGE_WIDTH_PT - MARGIN_PT, 1.5, ACCENT);
        cursor.advance(RULE_GAP);
    }

    for block in &section.blocks {
        lay_out_block(cursor, block);
    }
}

fn lay_out_block(cursor: &mut Cursor, block: &Block) {
    match block {
        Block::Title(text) => centered(cursor, FontFace::Bold, TITLE_SIZE, TITLE_LEADING, text),
        Block::Centered(text) => centered(cursor, FontFace::Regular, BODY_SIZE, BODY_LEADING, text),
        Block::Strong(text) => paragraph(cursor, FontFace::Bold, MARGIN_PT, CONTENT_WIDTH_PT, text),
        Block::Text(text) => paragraph(cursor, FontFace::Regular, MARGIN_PT, CONTENT_WIDTH_PT, text),
        Block::Bullet(text) => bullet(cursor, text),
        Block::Row { label, value } => two_columns(cursor, label, value, FontFace::Regular),
        Block::TableHeader { left, right } => {
            cursor.ensure(TABLE_HEAD_HEIGHT);
            two_columns(cursor, left, right, FontFace::Bold);
            cursor.rule(MARGIN_PT, PAGE_WIDTH_PT - MARGIN_PT, 0.5, MUTED);
            cursor.advance(TABLE_HEADER_GAP);
        }
        Block::Spacer => cursor.advance(SPACER),
    }
}

fn centered(cursor: &mut Cursor, face: FontFace, size: f32, leading: f32, text: &str) {
    let metrics = face.metrics();
    for line in metrics.wrap(text, size, CONTENT_WIDTH_PT) {
        let width = metrics.width_pt(&line, size);
        let x = MARGIN_PT + ((CONTENT_WIDTH_PT - width) / 2.0).max(0.0);
        cursor.ensure(leading);
        cursor.text_line(x, face, size, leading, BLACK, &line);
    }
}

fn paragraph(cursor: &mut Cursor, face: FontFace, x: f32, width: f32, text: &str) {
    for line in wrap_multiline(face, text, width) {
        cursor.ensure(BODY_LEADING);
        cursor.text_line(x, face, BODY_SIZE, BODY_LEADING, BLACK, &line);
    }
}

fn bullet(cursor: &mut Cursor, text: &str) {
    let lines = wrap_multiline(FontFace::Regular, text, CONTENT_WIDTH_PT - BULLET_TEXT_INDENT);
    for (i, line) in lines.iter().enumerate() {
        cursor.ensure(BODY_LEADING);
        if i == 0 {
            cursor.place(MARGIN_PT + BULLET_INDENT, FontFace::Regular, BODY_SIZE, BLACK, "•");
        }
        cursor.text_line(
            MARGIN_PT + BULLET_TEXT_INDENT,
            FontFace::Regular,
            BODY_SIZE,
            BODY_LEADING,
            BLACK,
            line,
        );
    }
}

/// Label/value row. The label is bold in body rows; `value_face` is bold only
/// for table headings.
fn two_columns(cursor: &mut Cursor, label: &str, value: &str, value_face: FontFace) {
    let label_width = CONTENT_WIDTH_PT * LABEL_COLUMN - COLUMN_GUTTER;
    let value_x = MARGIN_PT + CONTENT_WIDTH_PT * LABEL_COLUMN;
    let value_width = CONTENT_WIDTH_PT * (1.0 - LABEL_COLUMN);

    let label_lines = wrap_multiline(FontFace::Bold, label, label_width);
    let value_lines = wrap_multiline(value_face, value, value_width);
    let rows = label_lines.len().max(value_lines.len()).max(1);

    for i in 0..rows {
        cursor.ensure(BODY_LEADING);
        if let Some(line) = label_lines.get(i) {
            cursor.place(MARGIN_PT, FontFace::Bold, BODY_SIZE, BLACK, line);
        }
        if let Some(line) = value_lines.get(i) {
            cursor.place(value_x, value_face, BODY_SIZE, BLACK, line);
        }
        cursor.advance(BODY_LEADING);
    }
}

/// Wraps text that may contain explicit line breaks.
fn wrap_multiline(face: FontFace, text: &str, width: f32) -> Vec<String> {
    let metrics = face.metrics();
    text.lines()
        .flat_map(|line| metrics.wrap(line, BODY_SIZE, width))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Tracks the current page and the top of the next line.
struct Cursor {
    pages: Vec<PageLayout>,
    current: PageLayout,
    top: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: PageLayout::default(),
            top: PAGE_HEIGHT_PT - MARGIN_PT,
        }
    }

    fn remaining(&self) -> f32 {
        self.top - MARGIN_PT
    }

    /// Starts a new page unless `height` still fits on the current one.
    /// A fresh page always accepts, so oversize content cannot loop.
    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.current.ops.is_empty() {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.top = PAGE_HEIGHT_PT - MARGIN_PT;
    }

    fn advance(&mut self, height: f32) {
        self.top -= height;
        if self.top < MARGIN_PT {
            self.new_page();
        }
    }

    /// Draws text on the next line's baseline without advancing.
    fn place(&mut self, x: f32, face: FontFace, size: f32, color: Rgb, text: &str) {
        self.current.ops.push(DrawOp::Text {
            x,
            y: self.top - size,
            face,
            size,
            color,
            text: text.to_string(),
        });
    }

    fn text_line(&mut self, x: f32, face: FontFace, size: f32, leading: f32, color: Rgb, text: &str) {
        self.place(x, face, size, color, text);
        self.advance(leading);
    }

    fn rule(&mut self, x1: f32, x2: f32, width: f32, color: Rgb) {
        self.current.ops.push(DrawOp::Rule {
            x1,
            x2,
            y: self.top,
            width,
            color,
        });
    }

    fn finish(mut self) -> Vec<PageLayout> {
        if !self.current.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}
