//! Past paraphrases fetched from the service.
//!
//! A view is created when the History tab is entered and dropped when it is
//! left. Creation starts exactly one fetch; there is no refresh.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use flume::{Receiver, RecvTimeoutError, TryRecvError};
use log::{debug, error, info};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::clipboard::ClipboardSink;
use crate::notification::NotificationManager;
use crate::service::{HistoryRecord, ParaphraseService, ServiceError};
use crate::theme::Base16Palette;
use crate::worker::{self, Dispatch};

pub const EMPTY_MESSAGE: &str = "No paraphrasing history yet";
pub const LOADING_MESSAGE: &str = "Loading history...";
const COLLAPSED_ROWS: u16 = 12;
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug)]
pub enum HistoryState {
    Loading,
    Loaded(Vec<HistoryRecord>),
    Failed,
}

type FetchResult = Result<Vec<HistoryRecord>, ServiceError>;

pub struct HistoryView {
    state: HistoryState,
    pending: Option<Receiver<FetchResult>>,
    expanded: bool,
    selected: usize,
    scroll: usize,
}

impl HistoryView {
    pub fn mount(service: Arc<dyn ParaphraseService>, dispatch: Dispatch) -> Self {
        info!("Fetching paraphrase history");
        let rx = worker::run(dispatch, "history", move || service.history());
        Self {
            state: HistoryState::Loading,
            pending: Some(rx),
            expanded: false,
            selected: 0,
            scroll: 0,
        }
    }

    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, HistoryState::Loading)
    }

    pub fn records(&self) -> &[HistoryRecord] {
        match &self.state {
            HistoryState::Loaded(records) => records,
            _ => &[],
        }
    }

    /// Applies the fetch result once it arrives. Returns the record count,
    /// or the error, on the call that applied it.
    pub fn poll(&mut self) -> Option<Result<usize, ServiceError>> {
        let result = match self.pending.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ServiceError::WorkerLost),
        };
        Some(self.finish(result))
    }

    pub fn wait(&mut self, timeout: Duration) -> Option<Result<usize, ServiceError>> {
        let result = match self.pending.as_ref()?.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Err(ServiceError::WorkerLost),
        };
        Some(self.finish(result))
    }

    fn finish(&mut self, result: FetchResult) -> Result<usize, ServiceError> {
        self.pending = None;
        match result {
            Ok(records) => {
                debug!("Loaded {} history records", records.len());
                let count = records.len();
                self.state = HistoryState::Loaded(records);
                Ok(count)
            }
            Err(e) => {
                error!("Error fetching history: {e}");
                self.state = HistoryState::Failed;
                Err(e)
            }
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_record(&self) -> Option<&HistoryRecord> {
        self.records().get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.records().len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Copies the selected record's paraphrased text.
    pub fn copy_selected(
        &self,
        clipboard: &mut dyn ClipboardSink,
        notifications: &mut NotificationManager,
    ) -> bool {
        let Some(record) = self.selected_record() else {
            return false;
        };
        match clipboard.set_text(&record.paraphrased_text) {
            Ok(()) => {
                notifications.info(super::result_view::COPIED_MESSAGE);
                true
            }
            Err(e) => {
                error!("Clipboard copy failed: {e:#}");
                notifications.error(format!("Copy failed: {e}"));
                false
            }
        }
    }

    /// Height the list occupies inside `area`.
    pub fn list_height(&self, area: Rect) -> u16 {
        if self.expanded {
            area.height
        } else {
            area.height.min(COLLAPSED_ROWS + 2)
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, tick: usize, palette: &Base16Palette) {
        let toggle = if self.expanded {
            "e: Collapse"
        } else {
            "e: Expand"
        };
        let block = Block::default()
            .title(" Paraphrasing History ")
            .title_bottom(Line::from(format!(" j/k: Move  y: Copy Result  {toggle} ")).right_aligned())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.base_03))
            .style(Style::default().bg(palette.base_00));

        let outer = Rect {
            height: self.list_height(area),
            ..area
        };
        let inner = block.inner(outer);
        f.render_widget(block, outer);

        let muted = Style::default().fg(palette.base_03);
        let lines = match &self.state {
            HistoryState::Loading => {
                let spin = SPINNER[tick % SPINNER.len()];
                vec![Line::from(Span::styled(format!("{spin} {LOADING_MESSAGE}"), muted)).centered()]
            }
            HistoryState::Failed => vec![Line::from(Span::styled(EMPTY_MESSAGE, muted)).centered()],
            HistoryState::Loaded(records) if records.is_empty() => {
                vec![Line::from(Span::styled(EMPTY_MESSAGE, muted)).centered()]
            }
            HistoryState::Loaded(records) => {
                let (lines, starts) = record_lines(records, self.selected, inner.width, palette);
                self.scroll = follow_selection(
                    self.scroll,
                    self.selected,
                    &starts,
                    lines.len(),
                    inner.height as usize,
                );
                lines
                    .into_iter()
                    .skip(self.scroll)
                    .take(inner.height as usize)
                    .collect()
            }
        };
        f.render_widget(Paragraph::new(lines), inner);
    }
}

/// `Mar 04, 2024 • 09:15`
pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%b %d, %Y • %H:%M").to_string()
}

/// Scroll offset that keeps the selected record on screen.
fn follow_selection(
    scroll: usize,
    selected: usize,
    starts: &[usize],
    total: usize,
    height: usize,
) -> usize {
    let Some(&start) = starts.get(selected) else {
        return scroll;
    };
    let end = starts.get(selected + 1).copied().unwrap_or(total);
    let scroll = if start < scroll {
        start
    } else if end > scroll + height {
        end.saturating_sub(height).min(start)
    } else {
        scroll
    };
    scroll.min(total.saturating_sub(1))
}

/// All record lines, plus the line index at which each record starts.
fn record_lines(
    records: &[HistoryRecord],
    selected: usize,
    width: u16,
    palette: &Base16Palette,
) -> (Vec<Line<'static>>, Vec<usize>) {
    let wrap_width = (width as usize).saturating_sub(4).max(1);
    let label = Style::default()
        .fg(palette.base_0d)
        .add_modifier(Modifier::BOLD);
    let body = Style::default().fg(palette.base_05);

    let mut lines = Vec::new();
    let mut starts = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        starts.push(lines.len());
        let is_selected = i == selected;
        let (marker, date_style) = if is_selected {
            (
                "▶ ",
                Style::default()
                    .fg(palette.base_0a)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default().fg(palette.base_04))
        };

        let when = format_timestamp(&record.created_at.with_timezone(&Local));
        lines.push(Line::from(vec![
            Span::styled(marker, date_style),
            Span::styled(when, date_style),
        ]));

        for (heading, text) in [
            ("Original", &record.original_text),
            ("Paraphrased", &record.paraphrased_text),
        ] {
            lines.push(Line::from(Span::styled(format!("  {heading}"), label)));
            for paragraph in text.lines() {
                for wrapped in textwrap::wrap(paragraph, wrap_width) {
                    lines.push(Line::from(Span::styled(format!("    {wrapped}"), body)));
                }
            }
        }
        lines.push(Line::from(""));
    }
    (lines, starts)
}
