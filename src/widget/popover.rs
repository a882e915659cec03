//! The floating "paraphrase" button shown under an active selection.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::selection_tracker::SelectionSpan;
use crate::theme::Base16Palette;

const LABEL: &str = "[ AI ^P ]";
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Button area centred on the span's anchor, kept inside `frame`.
pub fn area_for(span: &SelectionSpan, frame: Rect) -> Rect {
    let width = (LABEL.chars().count() as u16).min(frame.width);
    let height = 1.min(frame.height);

    let left = span.anchor_x.saturating_sub(width / 2);
    let max_x = frame.right().saturating_sub(width);
    let x = left.clamp(frame.x, max_x.max(frame.x));

    let max_y = frame.bottom().saturating_sub(height);
    let y = span.anchor_y.clamp(frame.y, max_y.max(frame.y));

    Rect::new(x, y, width, height)
}

pub fn label(processing: bool, tick: usize) -> String {
    if processing {
        let frame = SPINNER[tick % SPINNER.len()];
        format!("[ AI {frame}  ]")
    } else {
        LABEL.to_string()
    }
}

pub fn render(f: &mut Frame, area: Rect, processing: bool, tick: usize, palette: &Base16Palette) {
    let style = if processing {
        Style::default().fg(palette.base_00).bg(palette.base_03)
    } else {
        Style::default()
            .fg(palette.base_00)
            .bg(palette.base_0d)
            .add_modifier(Modifier::BOLD)
    };
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(label(processing, tick), style))),
        area,
    );
}
