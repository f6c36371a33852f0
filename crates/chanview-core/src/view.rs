use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use crate::error::LayoutError;
use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::ScrollDirection;
use crate::keymap;
use crate::layout::Document;
use crate::links::Link;
use crate::links::LinkId;
use crate::render;
use crate::render::DocumentRenderOptions;
use crate::scroll::OverscrollPolicy;
use crate::scroll::ScrollBindings;
use crate::scroll::ScrollState;
use crate::theme::Theme;

#[derive(Clone, Debug)]
pub struct LinkBindings {
    pub next: Vec<KeyEvent>,
    pub prev: Vec<KeyEvent>,
    pub activate: Vec<KeyEvent>,
}

impl Default for LinkBindings {
    fn default() -> Self {
        Self {
            next: vec![KeyEvent::new(KeyCode::Tab), KeyEvent::char('n')],
            prev: vec![KeyEvent::new(KeyCode::BackTab), KeyEvent::char('N')],
            activate: vec![KeyEvent::new(KeyCode::Enter)],
        }
    }
}

#[derive(Clone, Debug)]
pub struct ThreadViewOptions {
    pub show_scrollbar: bool,
    pub overscroll: OverscrollPolicy,
    pub mouse_step: i64,
    pub scroll: ScrollBindings,
    pub links: LinkBindings,
}

impl Default for ThreadViewOptions {
    fn default() -> Self {
        Self {
            show_scrollbar: true,
            overscroll: OverscrollPolicy::Clamp,
            mouse_step: 3,
            scroll: ScrollBindings::default(),
            links: LinkBindings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewAction {
    None,
    Redraw,
    LinkActivated(LinkId),
}

/// Scrollable viewer for one markup document.
///
/// The view owns the markup, the last successfully built [`Document`] and the scroll state.
/// The document is rebuilt whenever the markup or the render width changes. A failed rebuild
/// keeps the previous document on screen and is reported through [`ThreadView::last_error`].
#[derive(Clone, Debug, Default)]
pub struct ThreadView {
    markup: String,
    document: Option<Document>,
    cached_width: Option<u16>,
    pub state: ScrollState,
    options: ThreadViewOptions,
    selected_link: Option<LinkId>,
    last_error: Option<LayoutError>,
}

impl ThreadView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ThreadViewOptions) -> Self {
        Self {
            state: ScrollState::new(options.overscroll),
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &ThreadViewOptions {
        &self.options
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn last_error(&self) -> Option<&LayoutError> {
        self.last_error.as_ref()
    }

    pub fn selected_link(&self) -> Option<LinkId> {
        self.selected_link
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.document.as_ref()?.link(id).ok()
    }

    /// Loads new content and scrolls back to the top.
    ///
    /// If the layout width is already known the document is built immediately and a failure is
    /// returned; the previous document stays visible in that case.
    pub fn set_markup(&mut self, markup: impl Into<String>) -> Result<(), LayoutError> {
        self.markup = markup.into();
        self.selected_link = None;
        self.state.to_start();
        match self.cached_width {
            Some(width) => self.rebuild(width),
            None => {
                self.document = None;
                self.last_error = None;
                Ok(())
            }
        }
    }

    pub fn clear(&mut self) {
        self.markup.clear();
        self.document = None;
        self.selected_link = None;
        self.last_error = None;
        self.state.to_start();
    }

    /// Adapts the layout to `area`, rebuilding the document if the text width changed.
    pub fn set_viewport(&mut self, area: Rect) {
        let text_w = self.text_area(area).width;
        self.state.set_viewport(area.height);
        if text_w > 0 && self.cached_width != Some(text_w) {
            // A failure is kept in `last_error`; the old document keeps rendering.
            let _ = self.rebuild(text_w);
        }
    }

    pub fn scroll_by(&mut self, delta: i64) {
        self.state.scroll_by(delta);
    }

    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        !matches!(self.handle_event_action(event), ViewAction::None)
    }

    pub fn handle_event_action(&mut self, event: InputEvent) -> ViewAction {
        match event {
            InputEvent::Resize { .. } => ViewAction::Redraw,
            InputEvent::Scroll { direction, .. } => {
                let step = self.options.mouse_step;
                match direction {
                    ScrollDirection::Up => self.state.scroll_by(-step),
                    ScrollDirection::Down => self.state.scroll_by(step),
                }
                ViewAction::Redraw
            }
            InputEvent::Key(key) => {
                let links = &self.options.links;
                let (next, prev, activate) = (
                    keymap::matches_any(&links.next, &key),
                    keymap::matches_any(&links.prev, &key),
                    keymap::matches_any(&links.activate, &key),
                );
                if next || prev {
                    self.select_link(if next { 1 } else { -1 });
                    return ViewAction::Redraw;
                }
                if activate {
                    return self
                        .selected_link
                        .map(ViewAction::LinkActivated)
                        .unwrap_or(ViewAction::None);
                }
                let Some(action) = self.options.scroll.action_for(&key) else {
                    return ViewAction::None;
                };
                self.options.scroll.apply(&mut self.state, action);
                ViewAction::Redraw
            }
        }
    }

    /// Moves the link cursor by `step`, wrapping around, and scrolls it into view.
    pub fn select_link(&mut self, step: isize) {
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let count = doc.links().len();
        if count == 0 {
            self.selected_link = None;
            return;
        }
        let next = match self.selected_link {
            Some(LinkId(cur)) => (cur as isize + step).rem_euclid(count as isize) as usize,
            None if step >= 0 => 0,
            None => count - 1,
        };
        self.selected_link = Some(LinkId(next));
        if let Some(line) = doc.line_of_link(LinkId(next)) {
            self.state.reveal(line as u32);
        }
    }

    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        self.set_viewport(area);
        let text_area = self.text_area(area);

        match self.document.as_ref() {
            Some(doc) => {
                let options = DocumentRenderOptions {
                    highlight_link: self.selected_link,
                };
                render::render_document_with_options(
                    text_area,
                    buf,
                    doc,
                    &self.state,
                    theme,
                    &options,
                );
            }
            None => buf.set_style(text_area, theme.text_primary),
        }

        if text_area.width < area.width {
            render::render_scrollbar(
                Rect::new(area.x + area.width - 1, area.y, 1, area.height),
                buf,
                &self.state,
                theme.text_muted,
            );
        }
    }

    fn text_area(&self, area: Rect) -> Rect {
        if self.options.show_scrollbar && area.width >= 2 {
            Rect::new(area.x, area.y, area.width - 1, area.height)
        } else {
            area
        }
    }

    fn rebuild(&mut self, width: u16) -> Result<(), LayoutError> {
        self.cached_width = Some(width);
        match Document::build(&self.markup, width) {
            Ok(doc) => {
                tracing::debug!(width, lines = doc.line_count(), links = doc.links().len(), "layout rebuilt");
                self.state.set_content(doc.line_count() as u32);
                if self
                    .selected_link
                    .is_some_and(|id| doc.link(id).is_err())
                {
                    self.selected_link = None;
                }
                self.document = Some(doc);
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(width, error = %err, "layout rebuild failed; keeping previous document");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}
