//! `chanview-core` turns imageboard post markup into wrapped, styled terminal lines.
//!
//! The pipeline is small and synchronous:
//!
//! - [`markup::Tokenizer`] splits markup into tag and text events (`<br>`, `<a>`, `<strong>`; other
//!   tags are ignored but never break the parse).
//! - [`style::StyleStack`] tracks the bold/link attributes that apply to each run of text, and
//!   registers every `<a>` in a [`links::LinkTable`].
//! - [`layout::Document::build`] packs words into lines no wider than the requested column count.
//! - [`render`] paints a scrolled window of a document into a ratatui `Buffer`.
//!
//! ## Getting started
//!
//! Most apps want [`view::ThreadView`]: hand it markup with `set_markup`, forward input with
//! `handle_event_action`, and call `render_ref` from your draw closure. The view rebuilds its
//! layout when the render width changes and keeps scroll position across resizes.
//!
//! Input is backend-agnostic; enable the `crossterm` feature for [`crossterm_input`] adapters.
pub mod error;
pub mod links;
pub mod markup;
pub mod style;

pub mod layout;

pub mod render;
pub mod scroll;
pub mod theme;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;

pub mod input;
pub mod keymap;
pub mod view;

pub use error::LayoutError;
pub use error::ParseError;
pub use layout::Document;
pub use links::Link;
pub use links::LinkId;
pub use scroll::OverscrollPolicy;
pub use scroll::ScrollState;
pub use theme::Theme;
pub use view::ThreadView;
