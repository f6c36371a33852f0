use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;

use crate::layout::Document;
use crate::layout::Line;
use crate::layout::TAB_WIDTH;
use crate::layout::char_width;
use crate::links::LinkId;
use crate::scroll::ScrollState;
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentRenderOptions {
    /// Blocks of this link are drawn with `theme.selection` on top of their own style.
    pub highlight_link: Option<LinkId>,
}

/// Paints the window of `doc` selected by `scroll` into `area`.
///
/// Row `r` shows layout line `scroll.offset() + r`. Rows past the end of the document, and
/// columns past the end of a line, are painted as blank cells. The document is never re-wrapped
/// here: callers rebuild it when `area.width` changes.
pub fn render_document(
    area: Rect,
    buf: &mut Buffer,
    doc: &Document,
    scroll: &ScrollState,
    theme: &Theme,
) {
    render_document_with_options(
        area,
        buf,
        doc,
        scroll,
        theme,
        &DocumentRenderOptions::default(),
    )
}

pub fn render_document_with_options(
    area: Rect,
    buf: &mut Buffer,
    doc: &Document,
    scroll: &ScrollState,
    theme: &Theme,
    options: &DocumentRenderOptions,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    for row in 0..area.height {
        let y = area.y + row;
        let idx = (scroll.offset() as usize).saturating_add(row as usize);
        let used = match doc.line(idx) {
            Some(line) => render_line(area.x, y, area.width, buf, line, theme, options),
            None => 0,
        };
        blank(buf, area.x + used, y, area.width - used, theme.text_primary);
    }
}

/// Writes `line` at `(x, y)`, stopping at `max_cols`. Returns the number of columns used.
pub fn render_line(
    x: u16,
    y: u16,
    max_cols: u16,
    buf: &mut Buffer,
    line: &Line,
    theme: &Theme,
    options: &DocumentRenderOptions,
) -> u16 {
    let max_cols = max_cols as usize;
    let mut col = 0usize;
    let mut tmp = [0u8; 4];

    for block in line.blocks() {
        let mut style = theme.block_style(block.style);
        if options.highlight_link.is_some() && block.style.link == options.highlight_link {
            style = style.patch(theme.selection);
        }
        for ch in block.text.chars() {
            if ch == '\t' {
                for _ in 0..TAB_WIDTH {
                    if col + 1 > max_cols {
                        return col as u16;
                    }
                    put(buf, x + col as u16, y, " ", style);
                    col += 1;
                }
                continue;
            }

            let w = char_width(ch);
            if w == 0 {
                continue;
            }
            if col + w > max_cols {
                return col as u16;
            }

            put(buf, x + col as u16, y, ch.encode_utf8(&mut tmp), style);
            for extra in 1..w {
                put(buf, x + (col + extra) as u16, y, "", style);
            }
            col += w;
        }
    }

    col as u16
}

fn put(buf: &mut Buffer, x: u16, y: u16, symbol: &str, style: Style) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.reset();
        cell.set_symbol(symbol);
        cell.set_style(style);
    }
}

fn blank(buf: &mut Buffer, x: u16, y: u16, width: u16, style: Style) {
    for dx in 0..width {
        put(buf, x + dx, y, " ", style);
    }
}

pub fn render_scrollbar(area: Rect, buf: &mut Buffer, state: &ScrollState, style: Style) {
    buf.set_style(area, style);
    if area.height == 0 {
        return;
    }
    let content_h = state.content_height();
    let viewport_h = state.viewport_height() as u32;
    if content_h <= viewport_h || content_h == 0 {
        for dy in 0..area.height {
            buf.set_stringn(area.x, area.y + dy, " ", 1, style);
        }
        return;
    }

    let track_h = area.height as f64;
    let thumb_h = ((viewport_h as f64 / content_h as f64) * track_h)
        .round()
        .clamp(1.0, track_h) as u16;

    let max_offset = state.max_offset().max(1) as f64;
    let offset = state.offset().min(state.max_offset()) as f64;
    let thumb_top = ((offset / max_offset) * (track_h - thumb_h as f64))
        .round()
        .clamp(0.0, (track_h - thumb_h as f64).max(0.0)) as u16;

    for dy in 0..area.height {
        let ch = if dy >= thumb_top && dy < thumb_top + thumb_h {
            "█"
        } else {
            " "
        };
        buf.set_stringn(area.x, area.y + dy, ch, 1, style);
    }
}
