use thiserror::Error;

use crate::links::LinkId;

/// Malformed tag syntax. Always fatal for a layout build.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(offset: usize, kind: ParseErrorKind) -> Self {
        Self { offset, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unterminated tag")]
    UnterminatedTag,
    #[error("unterminated attribute value")]
    UnterminatedAttribute,
    #[error("close tag </{0}> carries attributes")]
    CloseTagAttributes(String),
}

/// Raised by [`crate::style::StyleStack::pop`] when only the default frame is left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("style stack underflow")]
pub struct StyleUnderflow;

/// A failed [`crate::layout::Document::build`]. There is no partial document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("malformed markup: {0}")]
    Parse(#[from] ParseError),
    #[error("unbalanced </{tag}> at byte {offset}")]
    StyleUnderflow { tag: String, offset: usize },
    #[error("invalid layout width {0}")]
    InvalidWidth(u16),
}

/// Lookup of a link id that was never registered in the document. Callers treat it as "no link".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown link {0}")]
pub struct UnknownLink(pub LinkId);
