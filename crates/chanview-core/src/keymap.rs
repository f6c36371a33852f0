use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;

/// A named group of keys, shown in the status line help.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub keys: Vec<KeyEvent>,
    pub help_key: String,
    pub help_desc: String,
}

impl Binding {
    pub fn new(
        help_key: impl Into<String>,
        help_desc: impl Into<String>,
        keys: impl IntoIterator<Item = KeyEvent>,
    ) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            help_key: help_key.into(),
            help_desc: help_desc.into(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        matches_any(&self.keys, event)
    }
}

/// Renders `key desc · key desc` for a row of bindings.
pub fn help_line<'a>(bindings: impl IntoIterator<Item = &'a Binding>) -> String {
    bindings
        .into_iter()
        .map(|b| format!("{} {}", b.help_key, b.help_desc))
        .collect::<Vec<_>>()
        .join(" · ")
}

pub fn matches_any(patterns: &[KeyEvent], event: &KeyEvent) -> bool {
    patterns.iter().any(|p| key_event_matches(p, event))
}

pub fn key_event_matches(pattern: &KeyEvent, event: &KeyEvent) -> bool {
    if pattern.code != event.code {
        return false;
    }
    // Terminals report SHIFT inconsistently for printable keys; the char already carries case.
    if matches!(pattern.code, KeyCode::Char(_)) {
        pattern.modifiers.without(KeyModifiers::SHIFT) == event.modifiers.without(KeyModifiers::SHIFT)
    } else {
        pattern.modifiers == event.modifiers
    }
}
