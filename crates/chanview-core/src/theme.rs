use ratatui::style::Modifier;
use ratatui::style::Style;

use crate::style::StyleFrame;

#[derive(Clone, Debug)]
pub struct Theme {
    pub text_primary: Style,
    pub text_muted: Style,
    pub link: Style,
    pub accent: Style,
    pub danger: Style,
    pub border: Style,
    pub border_focused: Style,
    pub selection: Style,
}

impl Default for Theme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            text_primary: Style::default(),
            text_muted: Style::default().dark_gray(),
            link: Style::default().light_green(),
            accent: Style::default().yellow(),
            danger: Style::default().red(),
            border: Style::default().dark_gray(),
            border_focused: Style::default().cyan(),
            selection: Style::default().reversed(),
        }
    }
}

impl Theme {
    /// Cell style for a block laid out under `frame`.
    pub fn block_style(&self, frame: StyleFrame) -> Style {
        let mut style = self.text_primary;
        if frame.link.is_some() {
            style = style.patch(self.link);
        }
        if frame.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        style
    }
}
