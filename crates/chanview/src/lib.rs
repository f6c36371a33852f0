//! Terminal reader for makaba-style imageboards, built on [`chanview_core`].
//!
//! - [`fetch`]: HTTP and offline JSON sources behind the [`fetch::Fetcher`] trait.
//! - [`store`]: the board/thread/post cache and the thread-to-markup rendering.
//! - [`target`]: classification of links found in posts.
//! - [`app`]: the three-pane UI state machine.
pub mod app;
pub mod config;
pub mod fetch;
pub mod store;
pub mod target;
