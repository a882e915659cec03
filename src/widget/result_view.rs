//! Side pane showing the current paraphrase result.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::clipboard::ClipboardSink;
use crate::notification::NotificationManager;
use crate::paraphrase_controller::{DisplayedResult, ResultState};
use crate::theme::Base16Palette;

pub const COPIED_MESSAGE: &str = "Text copied to clipboard!";

pub fn lines<'a>(results: &'a ResultState, palette: &Base16Palette) -> Vec<Line<'a>> {
    let heading = Style::default()
        .fg(palette.base_0d)
        .add_modifier(Modifier::BOLD);
    let body = Style::default().fg(palette.base_05);
    let muted = Style::default().fg(palette.base_03);

    match results.displayed() {
        DisplayedResult::Pair(pair) => {
            let mut out = vec![Line::from(Span::styled("Original", heading))];
            out.extend(pair.original.lines().map(|l| Line::from(Span::styled(l, muted))));
            out.push(Line::from(""));
            out.push(Line::from(Span::styled("Paraphrased", heading)));
            out.extend(pair.paraphrased.lines().map(|l| Line::from(Span::styled(l, body))));
            out
        }
        DisplayedResult::Document(text) => {
            let mut out = vec![Line::from(Span::styled("Paraphrased document", heading))];
            out.extend(text.lines().map(|l| Line::from(Span::styled(l, body))));
            out
        }
        DisplayedResult::Empty => vec![Line::from(Span::styled(
            "Select text and press Ctrl+P, or press Ctrl+D to paraphrase everything.",
            muted,
        ))],
    }
}

pub fn render(
    f: &mut Frame,
    area: Rect,
    results: &ResultState,
    processing: bool,
    palette: &Base16Palette,
) {
    let title = if processing {
        " Result (Paraphrasing…) "
    } else {
        " Result "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.base_03))
        .style(Style::default().bg(palette.base_00));

    let paragraph = Paragraph::new(lines(results, palette))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

/// Copies the displayed paraphrase. Returns true if something was copied.
pub fn copy_paraphrase(
    results: &ResultState,
    clipboard: &mut dyn ClipboardSink,
    notifications: &mut NotificationManager,
) -> bool {
    let Some(text) = results.displayed_paraphrase() else {
        notifications.warn("Nothing to copy yet");
        return false;
    };
    match clipboard.set_text(text) {
        Ok(()) => {
            notifications.info(COPIED_MESSAGE);
            true
        }
        Err(e) => {
            log::error!("Clipboard copy failed: {e:#}");
            notifications.error(format!("Copy failed: {e}"));
            false
        }
    }
}
