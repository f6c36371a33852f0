//! Word-wrap layout: markup + width in, a grid of styled lines out.
//!
//! Text is cut into blocks that are either all-whitespace or all-non-whitespace. Blocks are
//! packed greedily into lines no wider than the target width. Whitespace is dropped at soft
//! wrap points (the end of a line that overflowed and the start of the line that follows it);
//! everywhere else it is kept verbatim. A block wider than the whole line is never split and
//! sits alone on its own line.
use unicode_width::UnicodeWidthChar;

use crate::error::LayoutError;
use crate::error::UnknownLink;
use crate::links::Link;
use crate::links::LinkId;
use crate::links::LinkTable;
use crate::markup::Event;
use crate::markup::TagKind;
use crate::markup::Tokenizer;
use crate::style::StyleFrame;
use crate::style::StyleStack;

pub const TAB_WIDTH: usize = 4;

/// Display width of a single character in terminal cells.
pub fn char_width(ch: char) -> usize {
    if ch == '\t' {
        TAB_WIDTH
    } else {
        UnicodeWidthChar::width(ch).unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharClass {
    Space,
    Word,
}

fn classify(ch: char) -> CharClass {
    // NBSP must not become a wrap point.
    if ch.is_whitespace() && ch != '\u{a0}' {
        CharClass::Space
    } else {
        CharClass::Word
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledBlock {
    pub text: String,
    pub width: usize,
    pub style: StyleFrame,
}

impl StyledBlock {
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(|ch| classify(ch) == CharClass::Space)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    blocks: Vec<StyledBlock>,
    width: usize,
}

impl Line {
    pub fn blocks(&self) -> &[StyledBlock] {
        &self.blocks
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn plain(&self) -> String {
        self.blocks.iter().map(|b| b.text.as_str()).collect()
    }

    fn push(&mut self, block: StyledBlock) {
        self.width += block.width;
        self.blocks.push(block);
    }

    fn trim_trailing_whitespace(&mut self) {
        while let Some(last) = self.blocks.last() {
            if !last.is_whitespace() {
                break;
            }
            self.width -= last.width;
            self.blocks.pop();
        }
    }
}

/// The immutable layout of one `(markup, width)` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    width: u16,
    lines: Vec<Line>,
    links: LinkTable,
}

impl Document {
    /// Lays out `markup` for `width` columns.
    ///
    /// This is a pure function of its inputs. Any tokenizer or style error fails the whole
    /// build; there is no partial document.
    pub fn build(markup: &str, width: u16) -> Result<Self, LayoutError> {
        if width == 0 {
            return Err(LayoutError::InvalidWidth(width));
        }

        let mut builder = LayoutBuilder::new(width as usize);
        for token in Tokenizer::new(markup) {
            let (offset, event) = token?;
            builder.event(offset, event)?;
        }
        Ok(builder.finish(width))
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> Option<&Line> {
        self.lines.get(idx)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> Result<&Link, UnknownLink> {
        self.links.resolve(id)
    }

    /// First line that contains a block of link `id`.
    pub fn line_of_link(&self, id: LinkId) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.blocks.iter().any(|b| b.style.link == Some(id)))
    }

    pub fn plain_lines(&self) -> Vec<String> {
        self.lines.iter().map(Line::plain).collect()
    }
}

struct LayoutBuilder {
    width: usize,
    lines: Vec<Line>,
    line: Line,
    // The current line was opened by a soft wrap; leading whitespace is dropped.
    wrapped: bool,
    block: String,
    block_width: usize,
    block_class: Option<CharClass>,
    styles: StyleStack,
    links: LinkTable,
}

impl LayoutBuilder {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            line: Line::default(),
            wrapped: false,
            block: String::new(),
            block_width: 0,
            block_class: None,
            styles: StyleStack::new(),
            links: LinkTable::new(),
        }
    }

    fn event(&mut self, offset: usize, event: Event<'_>) -> Result<(), LayoutError> {
        match event {
            Event::Text(text) => self.push_text(&text),
            Event::Open { name, attrs } => {
                self.flush_block();
                match TagKind::from_name(&name) {
                    TagKind::LineBreak => self.break_line(),
                    kind => self.styles.open(kind, &attrs, &mut self.links),
                }
            }
            Event::Close { name } => {
                self.flush_block();
                if self.styles.close(TagKind::from_name(&name)).is_err() {
                    return Err(LayoutError::StyleUnderflow {
                        tag: name.into_owned(),
                        offset,
                    });
                }
            }
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        let link = self.styles.current().link;
        for ch in text.chars() {
            if ch == '\n' {
                self.break_line();
                continue;
            }

            let class = classify(ch);
            if self.block_class.is_some_and(|c| c != class) {
                self.flush_block();
            }
            self.block_class = Some(class);
            self.block.push(ch);
            self.block_width += char_width(ch);

            if let Some(id) = link {
                self.links.push_text(id, ch);
            }
        }
    }

    fn flush_block(&mut self) {
        let Some(class) = self.block_class.take() else {
            return;
        };
        let block = StyledBlock {
            text: std::mem::take(&mut self.block),
            width: std::mem::take(&mut self.block_width),
            style: self.styles.current(),
        };
        let space = class == CharClass::Space;

        if self.line.is_empty() {
            if !(space && self.wrapped) {
                self.line.push(block);
            }
            return;
        }

        if self.line.width + block.width > self.width {
            self.wrap_line();
            if space {
                return;
            }
        }
        self.line.push(block);
    }

    fn wrap_line(&mut self) {
        self.line.trim_trailing_whitespace();
        self.finish_line();
        self.wrapped = true;
    }

    fn break_line(&mut self) {
        self.flush_block();
        self.finish_line();
        self.wrapped = false;
    }

    fn finish_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.line));
    }

    fn finish(mut self, width: u16) -> Document {
        self.flush_block();
        self.finish_line();
        Document {
            width,
            lines: self.lines,
            links: self.links,
        }
    }
}
