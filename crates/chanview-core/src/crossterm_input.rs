use crossterm::event as ct;

use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;
use crate::input::ScrollDirection;

/// Converts a crossterm event. Key releases/repeats, clicks and unmapped keys yield `None`.
pub fn input_event_from_crossterm(ev: ct::Event) -> Option<InputEvent> {
    match ev {
        ct::Event::Key(key) if key.kind == ct::KeyEventKind::Press => {
            key_event_from_crossterm(key).map(InputEvent::Key)
        }
        ct::Event::Mouse(m) => {
            let direction = match m.kind {
                ct::MouseEventKind::ScrollUp => ScrollDirection::Up,
                ct::MouseEventKind::ScrollDown => ScrollDirection::Down,
                _ => return None,
            };
            Some(InputEvent::Scroll {
                direction,
                column: m.column,
                row: m.row,
            })
        }
        ct::Event::Resize(width, height) => Some(InputEvent::Resize { width, height }),
        _ => None,
    }
}

pub fn key_event_from_crossterm(key: ct::KeyEvent) -> Option<KeyEvent> {
    let code = match key.code {
        ct::KeyCode::Char(c) => KeyCode::Char(c),
        ct::KeyCode::Enter => KeyCode::Enter,
        ct::KeyCode::Esc => KeyCode::Esc,
        ct::KeyCode::Tab => KeyCode::Tab,
        ct::KeyCode::BackTab => KeyCode::BackTab,
        ct::KeyCode::Up => KeyCode::Up,
        ct::KeyCode::Down => KeyCode::Down,
        ct::KeyCode::Left => KeyCode::Left,
        ct::KeyCode::Right => KeyCode::Right,
        ct::KeyCode::Home => KeyCode::Home,
        ct::KeyCode::End => KeyCode::End,
        ct::KeyCode::PageUp => KeyCode::PageUp,
        ct::KeyCode::PageDown => KeyCode::PageDown,
        _ => return None,
    };

    let mut modifiers = KeyModifiers::NONE;
    for (from, to) in [
        (ct::KeyModifiers::SHIFT, KeyModifiers::SHIFT),
        (ct::KeyModifiers::CONTROL, KeyModifiers::CTRL),
        (ct::KeyModifiers::ALT, KeyModifiers::ALT),
    ] {
        if key.modifiers.contains(from) {
            modifiers = modifiers | to;
        }
    }
    Some(KeyEvent::new(code).with_modifiers(modifiers))
}
