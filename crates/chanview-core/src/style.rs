use crate::error::StyleUnderflow;
use crate::links::Link;
use crate::links::LinkId;
use crate::links::LinkTable;
use crate::markup::Attribute;
use crate::markup::TagKind;

/// Visual attributes attached to every block laid out while the frame is on top of the stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleFrame {
    pub bold: bool,
    pub link: Option<LinkId>,
}

impl StyleFrame {
    pub fn with_bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn with_link(self, id: LinkId) -> Self {
        Self {
            link: Some(id),
            ..self
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Stack of nested style frames. The bottom (default) frame can never be popped.
#[derive(Clone, Debug)]
pub struct StyleStack {
    frames: Vec<StyleFrame>,
}

impl Default for StyleStack {
    fn default() -> Self {
        Self {
            frames: vec![StyleFrame::default()],
        }
    }
}

impl StyleStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> StyleFrame {
        self.frames.last().copied().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, frame: StyleFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Result<StyleFrame, StyleUnderflow> {
        if self.frames.len() <= 1 {
            return Err(StyleUnderflow);
        }
        self.frames.pop().ok_or(StyleUnderflow)
    }

    /// Applies an open tag. `a` registers a link in `links` before its frame is pushed.
    pub fn open(&mut self, kind: TagKind, attrs: &[Attribute<'_>], links: &mut LinkTable) {
        let current = self.current();
        match kind {
            TagKind::Link => {
                let mut link = Link::default();
                for a in attrs {
                    if a.name == "href" {
                        link.target = a.value.to_string();
                    } else {
                        link.attrs.push((a.name.to_string(), a.value.to_string()));
                    }
                }
                let id = links.register(link);
                self.push(current.with_link(id));
            }
            TagKind::Bold => self.push(current.with_bold()),
            TagKind::LineBreak | TagKind::Other => {}
        }
    }

    /// Applies a close tag. Only `a` and `strong` pop, and they always pop exactly one frame.
    pub fn close(&mut self, kind: TagKind) -> Result<(), StyleUnderflow> {
        match kind {
            TagKind::Link | TagKind::Bold => self.pop().map(|_| ()),
            TagKind::LineBreak | TagKind::Other => Ok(()),
        }
    }
}
