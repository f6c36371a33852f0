use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::keymap;

/// How far past the last content line the offset may travel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverscrollPolicy {
    /// The offset never exceeds `max(0, line_count - viewport_height)`.
    #[default]
    Clamp,
    /// Only the lower bound is enforced; scrolling may run into blank rows.
    Allow,
}

/// Vertical scroll offset of a viewport, in layout lines.
///
/// The state survives document rebuilds (e.g. on resize); callers reset it with
/// [`ScrollState::to_start`] when they load new content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollState {
    offset: u32,
    viewport_h: u16,
    content_h: u32,
    policy: OverscrollPolicy,
}

impl ScrollState {
    pub fn new(policy: OverscrollPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn policy(&self) -> OverscrollPolicy {
        self.policy
    }

    pub fn viewport_height(&self) -> u16 {
        self.viewport_h
    }

    pub fn content_height(&self) -> u32 {
        self.content_h
    }

    pub fn set_policy(&mut self, policy: OverscrollPolicy) {
        self.policy = policy;
        self.clamp();
    }

    pub fn set_viewport(&mut self, h: u16) {
        self.viewport_h = h;
        self.clamp();
    }

    pub fn set_content(&mut self, lines: u32) {
        self.content_h = lines;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        if self.policy == OverscrollPolicy::Clamp {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let next = (self.offset as i64).saturating_add(delta).max(0);
        let upper = match self.policy {
            OverscrollPolicy::Clamp => self.max_offset() as i64,
            OverscrollPolicy::Allow => u32::MAX as i64,
        };
        self.offset = next.min(upper) as u32;
    }

    pub fn line_down(&mut self) {
        self.scroll_by(1);
    }

    pub fn line_up(&mut self) {
        self.scroll_by(-1);
    }

    pub fn page_down(&mut self) {
        self.scroll_by(self.viewport_h as i64);
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-(self.viewport_h as i64));
    }

    pub fn to_start(&mut self) {
        self.offset = 0;
    }

    pub fn to_end(&mut self) {
        self.offset = self.max_offset();
    }

    /// Moves the offset so that `line` is visible.
    pub fn reveal(&mut self, line: u32) {
        if line < self.offset {
            self.offset = line;
        } else if self.viewport_h > 0 && line >= self.offset + self.viewport_h as u32 {
            self.offset = line + 1 - self.viewport_h as u32;
        }
        self.clamp();
    }

    pub fn percent(&self) -> Option<u8> {
        if self.content_h == 0 || self.viewport_h == 0 || self.content_h <= self.viewport_h as u32 {
            return None;
        }
        let visible_bottom = self.offset.saturating_add(self.viewport_h as u32) as f64;
        let pct = (visible_bottom / self.content_h as f64 * 100.0).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }

    pub fn max_offset(&self) -> u32 {
        self.content_h.saturating_sub(self.viewport_h as u32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    ToStart,
    ToEnd,
}

#[derive(Clone, Debug)]
pub struct ScrollBindings {
    pub line_step: i64,
    pub up: Vec<KeyEvent>,
    pub down: Vec<KeyEvent>,
    pub page_up: Vec<KeyEvent>,
    pub page_down: Vec<KeyEvent>,
    pub start: Vec<KeyEvent>,
    pub end: Vec<KeyEvent>,
}

impl Default for ScrollBindings {
    fn default() -> Self {
        Self {
            line_step: 1,
            up: vec![KeyEvent::new(KeyCode::Up), KeyEvent::char('k')],
            down: vec![KeyEvent::new(KeyCode::Down), KeyEvent::char('j')],
            page_up: vec![KeyEvent::new(KeyCode::PageUp), KeyEvent::ctrl('u')],
            page_down: vec![
                KeyEvent::new(KeyCode::PageDown),
                KeyEvent::ctrl('d'),
                KeyEvent::char(' '),
            ],
            start: vec![KeyEvent::new(KeyCode::Home), KeyEvent::char('g')],
            end: vec![KeyEvent::new(KeyCode::End), KeyEvent::char('G')],
        }
    }
}

impl ScrollBindings {
    pub fn action_for(&self, key: &KeyEvent) -> Option<ScrollAction> {
        let table = [
            (&self.up, ScrollAction::LineUp),
            (&self.down, ScrollAction::LineDown),
            (&self.page_up, ScrollAction::PageUp),
            (&self.page_down, ScrollAction::PageDown),
            (&self.start, ScrollAction::ToStart),
            (&self.end, ScrollAction::ToEnd),
        ];
        table
            .into_iter()
            .find(|(keys, _)| keymap::matches_any(keys, key))
            .map(|(_, action)| action)
    }

    pub fn apply(&self, state: &mut ScrollState, action: ScrollAction) {
        match action {
            ScrollAction::LineUp => state.scroll_by(-self.line_step),
            ScrollAction::LineDown => state.scroll_by(self.line_step),
            ScrollAction::PageUp => state.page_up(),
            ScrollAction::PageDown => state.page_down(),
            ScrollAction::ToStart => state.to_start(),
            ScrollAction::ToEnd => state.to_end(),
        }
    }
}
