//! The editable region.
//!
//! A plain multi-line text buffer with a cursor and an anchor-based
//! selection, soft wrapped to the width of the area it was last drawn in.
//! Columns are counted in characters; screen columns come from
//! `unicode-width`. Whenever the selection or its position on screen changes
//! the editor publishes a [`SelectionSnapshot`] on the selection feed.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;
use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthChar;

use crate::feed::Feed;
use crate::selection_tracker::{SelectionSignal, SelectionSnapshot};
use crate::theme::Base16Palette;

const PLACEHOLDER: &str = "Start typing or paste your text here...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    PageUp,
    PageDown,
    DocStart,
    DocEnd,
}

/// One screen row of wrapped text: a character range of a buffer line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VisualRow {
    line: usize,
    start: usize,
    end: usize,
}

pub struct Editor {
    lines: Vec<String>,
    cursor: TextPosition,
    anchor: Option<TextPosition>,
    scroll: usize,
    follow_cursor: bool,
    area: Rect,
    mouse_selecting: bool,
    feed: Feed<SelectionSignal>,
    last_published: Option<SelectionSnapshot>,
}

impl Editor {
    pub fn new(feed: Feed<SelectionSignal>) -> Self {
        Self {
            lines: vec![String::new()],
            cursor: TextPosition::default(),
            anchor: None,
            scroll: 0,
            follow_cursor: true,
            area: Rect::default(),
            mouse_selecting: false,
            feed,
            last_published: None,
        }
    }

    // Content

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum::<usize>() + self.lines.len() - 1
    }

    pub fn set_text(&mut self, text: &str) {
        let text = normalize(text);
        self.lines = text.split('\n').map(str::to_string).collect();
        let last = self.lines.len() - 1;
        self.cursor = TextPosition::new(last, line_len(&self.lines[last]));
        self.anchor = None;
        self.content_changed();
    }

    pub fn insert_str(&mut self, text: &str) {
        self.delete_selection();
        let text = normalize(text);
        let mut parts = text.split('\n');
        let first = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        let TextPosition { line, column } = self.cursor;
        let at = byte_index(&self.lines[line], column);

        if rest.is_empty() {
            self.lines[line].insert_str(at, first);
            self.cursor.column += first.chars().count();
        } else {
            let tail = self.lines[line].split_off(at);
            self.lines[line].push_str(first);
            let last_index = rest.len() - 1;
            for (i, part) in rest.iter().enumerate() {
                let mut new_line = part.to_string();
                if i == last_index {
                    self.cursor = TextPosition::new(line + i + 1, new_line.chars().count());
                    new_line.push_str(&tail);
                }
                self.lines.insert(line + i + 1, new_line);
            }
        }
        self.content_changed();
    }

    pub fn insert_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.insert_str(c.encode_utf8(&mut buf));
    }

    pub fn backspace(&mut self) {
        if self.delete_selection() {
            return;
        }
        let TextPosition { line, column } = self.cursor;
        if column > 0 {
            let at = byte_index(&self.lines[line], column - 1);
            self.lines[line].remove(at);
            self.cursor.column -= 1;
        } else if line > 0 {
            let current = self.lines.remove(line);
            let prev_len = line_len(&self.lines[line - 1]);
            self.lines[line - 1].push_str(&current);
            self.cursor = TextPosition::new(line - 1, prev_len);
        } else {
            return;
        }
        self.content_changed();
    }

    pub fn delete(&mut self) {
        if self.delete_selection() {
            return;
        }
        let TextPosition { line, column } = self.cursor;
        if column < line_len(&self.lines[line]) {
            let at = byte_index(&self.lines[line], column);
            self.lines[line].remove(at);
        } else if line + 1 < self.lines.len() {
            let next = self.lines.remove(line + 1);
            self.lines[line].push_str(&next);
        } else {
            return;
        }
        self.content_changed();
    }

    /// Replaces the characters `start..end` of [`Editor::text`].
    /// Returns false if the range does not fit the content.
    pub fn replace_range(&mut self, start: usize, end: usize, replacement: &str) -> bool {
        if start > end || end > self.char_len() {
            return false;
        }
        let from = self.position_at(start);
        let to = self.position_at(end);
        self.remove_range(from, to);
        self.cursor = from;
        self.anchor = None;
        self.insert_str(replacement);
        true
    }

    fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection_range() else {
            return false;
        };
        self.remove_range(start, end);
        self.cursor = start;
        self.anchor = None;
        self.content_changed();
        true
    }

    fn remove_range(&mut self, start: TextPosition, end: TextPosition) {
        if start.line == end.line {
            let line = &mut self.lines[start.line];
            let from = byte_index(line, start.column);
            let to = byte_index(line, end.column);
            line.replace_range(from..to, "");
        } else {
            let tail_at = byte_index(&self.lines[end.line], end.column);
            let tail = self.lines[end.line][tail_at..].to_string();
            let head_at = byte_index(&self.lines[start.line], start.column);
            self.lines[start.line].truncate(head_at);
            self.lines[start.line].push_str(&tail);
            self.lines.drain(start.line + 1..=end.line);
        }
    }

    fn content_changed(&mut self) {
        self.last_published = None;
        self.follow_cursor = true;
    }

    /// Character offset of a buffer position within [`Editor::text`].
    pub fn offset_of(&self, pos: TextPosition) -> usize {
        self.lines[..pos.line]
            .iter()
            .map(|l| l.chars().count() + 1)
            .sum::<usize>()
            + pos.column
    }

    /// Buffer position of a character offset, clamped to the end.
    pub fn position_at(&self, offset: usize) -> TextPosition {
        let mut remaining = offset;
        for (i, line) in self.lines.iter().enumerate() {
            let len = line_len(line);
            if remaining <= len {
                return TextPosition::new(i, remaining);
            }
            remaining -= len + 1;
        }
        let last = self.lines.len() - 1;
        TextPosition::new(last, line_len(&self.lines[last]))
    }

    // Cursor and selection

    pub fn cursor(&self) -> TextPosition {
        self.cursor
    }

    /// Ordered bounds of a non-empty selection.
    pub fn selection_range(&self) -> Option<(TextPosition, TextPosition)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some((anchor.min(self.cursor), anchor.max(self.cursor)))
    }

    pub fn has_selection(&self) -> bool {
        self.selection_range().is_some()
    }

    pub fn selected_text(&self) -> String {
        let Some((start, end)) = self.selection_range() else {
            return String::new();
        };
        let from = self.offset_of(start);
        let to = self.offset_of(end);
        self.text().chars().skip(from).take(to - from).collect()
    }

    /// Selects the characters `start..end`, cursor at `end`.
    pub fn select_range(&mut self, start: usize, end: usize) {
        self.anchor = Some(self.position_at(start));
        self.cursor = self.position_at(end);
        self.follow_cursor = true;
    }

    pub fn select_all(&mut self) {
        self.anchor = Some(TextPosition::default());
        let last = self.lines.len() - 1;
        self.cursor = TextPosition::new(last, line_len(&self.lines[last]));
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
        self.mouse_selecting = false;
    }

    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.cursor);
            }
        } else {
            self.anchor = None;
        }

        let TextPosition { line, column } = self.cursor;
        self.cursor = match motion {
            Motion::Left if column > 0 => TextPosition::new(line, column - 1),
            Motion::Left if line > 0 => TextPosition::new(line - 1, line_len(&self.lines[line - 1])),
            Motion::Right if column < line_len(&self.lines[line]) => {
                TextPosition::new(line, column + 1)
            }
            Motion::Right if line + 1 < self.lines.len() => TextPosition::new(line + 1, 0),
            Motion::Left | Motion::Right => self.cursor,
            Motion::Up => self.vertical_target(-1),
            Motion::Down => self.vertical_target(1),
            Motion::PageUp => self.vertical_target(-(self.area.height.max(1) as isize)),
            Motion::PageDown => self.vertical_target(self.area.height.max(1) as isize),
            Motion::LineStart => TextPosition::new(line, 0),
            Motion::LineEnd => TextPosition::new(line, line_len(&self.lines[line])),
            Motion::DocStart => TextPosition::default(),
            Motion::DocEnd => {
                let last = self.lines.len() - 1;
                TextPosition::new(last, line_len(&self.lines[last]))
            }
        };
        self.follow_cursor = true;
    }

    fn vertical_target(&self, delta: isize) -> TextPosition {
        let rows = self.layout();
        let (row, x) = visual_position(&self.lines, &rows, self.cursor);
        let target = (row as isize + delta).clamp(0, rows.len() as isize - 1) as usize;
        if target == row {
            return if delta < 0 {
                TextPosition::new(self.cursor.line, rows[row].start)
            } else {
                self.cursor
            };
        }
        position_in_row(&self.lines, &rows, target, x)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        let handled = match key.code {
            KeyCode::Char('a') if ctrl => {
                self.select_all();
                true
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                self.insert_char(c);
                true
            }
            KeyCode::Enter => {
                self.insert_char('\n');
                true
            }
            KeyCode::Backspace => {
                self.backspace();
                true
            }
            KeyCode::Delete => {
                self.delete();
                true
            }
            KeyCode::Left => {
                self.move_cursor(Motion::Left, shift);
                true
            }
            KeyCode::Right => {
                self.move_cursor(Motion::Right, shift);
                true
            }
            KeyCode::Up => {
                self.move_cursor(Motion::Up, shift);
                true
            }
            KeyCode::Down => {
                self.move_cursor(Motion::Down, shift);
                true
            }
            KeyCode::Home if ctrl => {
                self.move_cursor(Motion::DocStart, shift);
                true
            }
            KeyCode::End if ctrl => {
                self.move_cursor(Motion::DocEnd, shift);
                true
            }
            KeyCode::Home => {
                self.move_cursor(Motion::LineStart, shift);
                true
            }
            KeyCode::End => {
                self.move_cursor(Motion::LineEnd, shift);
                true
            }
            KeyCode::PageUp => {
                self.move_cursor(Motion::PageUp, shift);
                true
            }
            KeyCode::PageDown => {
                self.move_cursor(Motion::PageDown, shift);
                true
            }
            KeyCode::Esc if self.has_selection() => {
                self.clear_selection();
                true
            }
            _ => false,
        };

        if handled {
            self.ensure_cursor_visible();
        }
        handled
    }

    // Mouse

    pub fn contains(&self, column: u16, row: u16) -> bool {
        self.area.contains(Position::new(column, row))
    }

    pub fn mouse_down(&mut self, column: u16, row: u16) -> bool {
        if !self.contains(column, row) {
            return false;
        }
        let pos = self.screen_to_position(column, row);
        self.cursor = pos;
        self.anchor = Some(pos);
        self.mouse_selecting = true;
        true
    }

    pub fn mouse_drag(&mut self, column: u16, row: u16) {
        if !self.mouse_selecting || self.area.is_empty() {
            return;
        }
        const SCROLL_MARGIN: u16 = 1;
        if row < self.area.y + SCROLL_MARGIN {
            self.scroll_by(-1);
        } else if row + SCROLL_MARGIN >= self.area.bottom() {
            self.scroll_by(1);
        }
        let column = column.clamp(self.area.x, self.area.right().saturating_sub(1));
        let row = row.clamp(self.area.y, self.area.bottom().saturating_sub(1));
        self.cursor = self.screen_to_position(column, row);
    }

    pub fn mouse_up(&mut self) {
        if self.mouse_selecting {
            self.mouse_selecting = false;
            if self.anchor == Some(self.cursor) {
                self.anchor = None;
            }
        }
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.layout().len().saturating_sub(1) as isize;
        self.scroll = (self.scroll as isize + delta).clamp(0, max) as usize;
        self.follow_cursor = false;
    }

    fn screen_to_position(&self, column: u16, row: u16) -> TextPosition {
        let rows = self.layout();
        let index = row.saturating_sub(self.area.y) as usize + self.scroll;
        if index >= rows.len() {
            let last = self.lines.len() - 1;
            return TextPosition::new(last, line_len(&self.lines[last]));
        }
        position_in_row(&self.lines, &rows, index, column.saturating_sub(self.area.x))
    }

    // Layout

    fn layout(&self) -> Vec<VisualRow> {
        self.lines
            .iter()
            .enumerate()
            .flat_map(|(line, text)| {
                wrap_ranges(text, self.area.width)
                    .into_iter()
                    .map(move |(start, end)| VisualRow { line, start, end })
            })
            .collect()
    }

    fn ensure_cursor_visible(&mut self) {
        let height = self.area.height as usize;
        if height == 0 {
            return;
        }
        let rows = self.layout();
        let (row, _) = visual_position(&self.lines, &rows, self.cursor);
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + height {
            self.scroll = row + 1 - height;
        }
        self.follow_cursor = true;
    }

    /// Screen cells covered by the selection, clipped to the visible area.
    fn selection_bounds(&self) -> Option<Rect> {
        let (start, end) = self.selection_range()?;
        let height = self.area.height as usize;
        if height == 0 {
            return None;
        }
        let rows = self.layout();
        let (start_row, start_x) = visual_position(&self.lines, &rows, start);
        let (end_row, end_x) = visual_position(&self.lines, &rows, end);
        let last_visible = self.scroll + height - 1;
        if start_row > last_visible || end_row < self.scroll {
            return None;
        }

        let bounds = if start_row == end_row {
            Rect::new(
                self.area.x + start_x,
                self.area.y + (start_row - self.scroll) as u16,
                end_x.saturating_sub(start_x).max(1),
                1,
            )
        } else {
            let top = start_row.max(self.scroll);
            let bottom = end_row.min(last_visible);
            Rect::new(
                self.area.x,
                self.area.y + (top - self.scroll) as u16,
                self.area.width,
                (bottom - top + 1) as u16,
            )
        };
        Some(bounds.intersection(self.area))
    }

    fn snapshot(&self) -> SelectionSnapshot {
        if !self.has_selection() {
            return SelectionSnapshot::empty(self.area);
        }
        let bounds = self.selection_bounds();
        SelectionSnapshot {
            text: self.selected_text(),
            collapsed: false,
            inside_region: bounds.is_some_and(|b| !b.is_empty()),
            bounds: bounds.unwrap_or_default(),
            region: self.area,
        }
    }

    /// Publishes the current selection if it differs from the last one sent.
    pub fn publish_selection(&mut self) {
        let snapshot = self.snapshot();
        if self.last_published.as_ref() == Some(&snapshot) {
            return;
        }
        debug!(
            "Selection changed: {} chars, bounds {:?}",
            snapshot.text.chars().count(),
            snapshot.bounds
        );
        self.feed.publish(SelectionSignal::Changed(snapshot.clone()));
        self.last_published = Some(snapshot);
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Sets the inner text area without drawing. Used before the first frame.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
        if self.follow_cursor {
            self.ensure_cursor_visible();
        }
        let max = self.layout().len().saturating_sub(1);
        self.scroll = self.scroll.min(max);
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, palette: &Base16Palette) {
        let border = if focused {
            palette.base_0c
        } else {
            palette.base_03
        };
        let block = Block::default()
            .title(" Editor ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(palette.base_00));
        let inner = block.inner(area);
        f.render_widget(block, area);
        self.set_area(inner);

        if self.is_empty() {
            let placeholder = Paragraph::new(Line::from(Span::styled(
                PLACEHOLDER,
                Style::default().fg(palette.base_03),
            )));
            f.render_widget(placeholder, inner);
        } else {
            let rows = self.layout();
            let selection = self.selection_range();
            let text_style = Style::default().fg(palette.base_05);
            let selected_style = Style::default()
                .fg(palette.base_07)
                .bg(palette.base_02)
                .add_modifier(Modifier::BOLD);

            let lines: Vec<Line> = rows
                .iter()
                .skip(self.scroll)
                .take(inner.height as usize)
                .map(|row| {
                    styled_row(&self.lines[row.line], *row, selection, text_style, selected_style)
                })
                .collect();
            f.render_widget(Paragraph::new(lines), inner);
        }

        if focused && inner.width > 0 {
            let rows = self.layout();
            let (row, x) = visual_position(&self.lines, &rows, self.cursor);
            if row >= self.scroll && row < self.scroll + inner.height as usize {
                f.set_cursor_position((
                    inner.x + x.min(inner.width - 1),
                    inner.y + (row - self.scroll) as u16,
                ));
            }
        }

        self.publish_selection();
    }
}

fn styled_row(
    text: &str,
    row: VisualRow,
    selection: Option<(TextPosition, TextPosition)>,
    text_style: Style,
    selected_style: Style,
) -> Line<'static> {
    let is_selected = |column: usize| {
        let pos = TextPosition::new(row.line, column);
        selection.is_some_and(|(start, end)| pos >= start && pos < end)
    };

    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_selected = false;
    for (column, c) in text
        .chars()
        .enumerate()
        .skip(row.start)
        .take(row.end - row.start)
    {
        let selected = is_selected(column);
        if selected != run_selected && !run.is_empty() {
            let style = if run_selected { selected_style } else { text_style };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_selected = selected;
        run.push(c);
    }
    if !run.is_empty() {
        let style = if run_selected { selected_style } else { text_style };
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\t', "    ")
}

fn line_len(line: &str) -> usize {
    line.chars().count()
}

fn byte_index(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

fn char_width(c: char) -> u16 {
    c.width().unwrap_or(0) as u16
}

/// Splits a line into character ranges that each fit `width` cells.
/// A width of zero disables wrapping. Always yields at least one range.
fn wrap_ranges(line: &str, width: u16) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut used: u16 = 0;
    let mut len = 0;
    for (i, c) in line.chars().enumerate() {
        let w = char_width(c);
        if width > 0 && used.saturating_add(w) > width && i > start {
            ranges.push((start, i));
            start = i;
            used = 0;
        }
        used = used.saturating_add(w);
        len = i + 1;
    }
    ranges.push((start, len));
    ranges
}

/// Visual row index and cell column of a buffer position.
fn visual_position(lines: &[String], rows: &[VisualRow], pos: TextPosition) -> (usize, u16) {
    let mut found = None;
    for (i, row) in rows.iter().enumerate() {
        if row.line != pos.line {
            if found.is_some() {
                break;
            }
            continue;
        }
        if pos.column >= row.start {
            found = Some(i);
        }
    }
    let Some(index) = found else {
        return (0, 0);
    };
    let row = rows[index];
    let x = lines[row.line]
        .chars()
        .skip(row.start)
        .take(pos.column.saturating_sub(row.start))
        .map(char_width)
        .fold(0u16, u16::saturating_add);
    (index, x)
}

/// Buffer position at cell column `x` of visual row `index`.
fn position_in_row(lines: &[String], rows: &[VisualRow], index: usize, x: u16) -> TextPosition {
    let row = rows[index];
    let is_last_of_line = rows.get(index + 1).is_none_or(|next| next.line != row.line);
    let mut column = row.start;
    let mut used: u16 = 0;
    for c in lines[row.line].chars().skip(row.start).take(row.end - row.start) {
        let w = char_width(c);
        if used.saturating_add(w) > x {
            break;
        }
        used += w;
        column += 1;
    }
    if !is_last_of_line && column == row.end && row.end > row.start {
        column -= 1;
    }
    TextPosition::new(row.line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_source::SimulatedEventSource;
    use crate::event_source::Event;

    fn editor_with(text: &str, area: Rect) -> (Editor, crate::feed::Subscription<SelectionSignal>) {
        let feed = Feed::new();
        let sub = feed.subscribe();
        let mut editor = Editor::new(feed);
        editor.set_text(text);
        editor.set_area(area);
        (editor, sub)
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        match SimulatedEventSource::key_event(code, modifiers) {
            Event::Key(key) => key,
            _ => unreachable!(),
        }
    }

    #[test]
    fn typing_and_editing() {
        let (mut editor, _sub) = editor_with("", Rect::new(0, 0, 40, 10));
        for c in "helo".chars() {
            editor.handle_key(key(KeyCode::Char(c), KeyModifiers::empty()));
        }
        editor.handle_key(key(KeyCode::Left, KeyModifiers::empty()));
        editor.handle_key(key(KeyCode::Char('l'), KeyModifiers::empty()));
        editor.handle_key(key(KeyCode::End, KeyModifiers::empty()));
        editor.handle_key(key(KeyCode::Enter, KeyModifiers::empty()));
        editor.insert_str("world");
        assert_eq!(editor.text(), "hello\nworld");

        editor.handle_key(key(KeyCode::Home, KeyModifiers::empty()));
        editor.handle_key(key(KeyCode::Backspace, KeyModifiers::empty()));
        assert_eq!(editor.text(), "helloworld");
        editor.handle_key(key(KeyCode::Delete, KeyModifiers::empty()));
        assert_eq!(editor.text(), "helloorld");
        assert_eq!(editor.char_len(), 9);
    }

    #[test]
    fn shift_motion_selects_and_typing_replaces() {
        let (mut editor, _sub) = editor_with("the quick fox", Rect::new(0, 0, 40, 10));
        for _ in 0..3 {
            editor.handle_key(key(KeyCode::Left, KeyModifiers::SHIFT));
        }
        assert_eq!(editor.selected_text(), "fox");

        editor.handle_key(key(KeyCode::Char('c'), KeyModifiers::empty()));
        editor.insert_str("at");
        assert_eq!(editor.text(), "the quick cat");
        assert!(!editor.has_selection());
    }

    #[test]
    fn selection_spanning_lines() {
        let (mut editor, _sub) = editor_with("one\ntwo\nthree", Rect::new(0, 0, 40, 10));
        editor.select_range(2, 9);
        assert_eq!(editor.selected_text(), "e\ntwo\nt");
        editor.backspace();
        assert_eq!(editor.text(), "onhree");
    }

    #[test]
    fn offsets_round_trip_through_positions() {
        let (editor, _sub) = editor_with("ab\ncdé\n\nf", Rect::new(0, 0, 40, 10));
        assert_eq!(editor.position_at(0), TextPosition::new(0, 0));
        assert_eq!(editor.position_at(3), TextPosition::new(1, 0));
        assert_eq!(editor.position_at(6), TextPosition::new(1, 3));
        assert_eq!(editor.position_at(7), TextPosition::new(2, 0));
        assert_eq!(editor.position_at(99), TextPosition::new(3, 1));
        assert_eq!(editor.offset_of(TextPosition::new(3, 1)), 9);
        assert_eq!(editor.char_len(), 9);
    }

    #[test]
    fn replace_range_substitutes_text() {
        let (mut editor, _sub) = editor_with("say the quick fox now", Rect::new(0, 0, 40, 10));
        assert!(editor.replace_range(4, 17, "the swift fox"));
        assert_eq!(editor.text(), "say the swift fox now");
        assert!(editor.replace_range(0, 3, "line\nbreak"));
        assert_eq!(editor.text(), "line\nbreak the swift fox now");
        assert!(!editor.replace_range(5, 400, "x"));
    }

    #[test]
    fn wraps_long_lines_to_area_width() {
        assert_eq!(wrap_ranges("abcdefghij", 4), vec![(0, 4), (4, 8), (8, 10)]);
        assert_eq!(wrap_ranges("", 4), vec![(0, 0)]);
        assert_eq!(wrap_ranges("abcd", 0), vec![(0, 4)]);
        // Wide characters take two cells.
        assert_eq!(wrap_ranges("日本語", 4), vec![(0, 2), (2, 3)]);
    }

    #[test]
    fn unwrapped_line_wider_than_a_terminal_stays_one_row() {
        let line = "日".repeat(40_000);
        assert_eq!(wrap_ranges(&line, 0), vec![(0, 40_000)]);

        let (mut editor, _sub) = editor_with("", Rect::new(0, 0, 0, 0));
        editor.insert_str(&line);
        editor.move_cursor(Motion::DocStart, false);
        editor.move_cursor(Motion::DocEnd, true);
        assert_eq!(editor.selected_text().chars().count(), 40_000);
    }

    #[test]
    fn vertical_motion_follows_wrapped_rows() {
        let (mut editor, _sub) = editor_with("abcdefghij", Rect::new(0, 0, 4, 10));
        editor.move_cursor(Motion::DocStart, false);
        editor.move_cursor(Motion::Right, false);
        editor.move_cursor(Motion::Down, false);
        assert_eq!(editor.cursor(), TextPosition::new(0, 5));
        editor.move_cursor(Motion::Down, true);
        assert_eq!(editor.cursor(), TextPosition::new(0, 9));
        assert_eq!(editor.selected_text(), "fghi");
    }

    #[test]
    fn mouse_drag_selects_screen_range() {
        let (mut editor, _sub) = editor_with("hello brave world", Rect::new(2, 3, 40, 5));
        assert!(editor.mouse_down(8, 3));
        editor.mouse_drag(13, 3);
        editor.mouse_up();
        assert_eq!(editor.selected_text(), "brave");

        assert!(!editor.mouse_down(0, 0));
        assert!(editor.mouse_down(3, 3));
        editor.mouse_up();
        assert!(!editor.has_selection());
    }

    #[test]
    fn publishes_bounds_of_selection_once() {
        let (mut editor, sub) = editor_with("hello brave world", Rect::new(2, 3, 40, 5));
        editor.publish_selection();
        sub.drain();

        editor.select_range(6, 11);
        editor.publish_selection();
        editor.publish_selection();
        let signals = sub.drain();
        assert_eq!(signals.len(), 1);
        let SelectionSignal::Changed(snapshot) = &signals[0] else {
            panic!("expected selection change");
        };
        assert_eq!(snapshot.text, "brave");
        assert!(!snapshot.collapsed);
        assert!(snapshot.inside_region);
        assert_eq!(snapshot.bounds, Rect::new(8, 3, 5, 1));
        assert_eq!(snapshot.region, Rect::new(2, 3, 40, 5));
    }

    #[test]
    fn multi_row_selection_spans_full_width() {
        let (mut editor, sub) = editor_with("one\ntwo\nthree", Rect::new(0, 1, 20, 5));
        editor.select_range(1, 9);
        editor.publish_selection();
        let Some(SelectionSignal::Changed(snapshot)) = sub.drain().pop() else {
            panic!("expected selection change");
        };
        assert_eq!(snapshot.bounds, Rect::new(0, 1, 20, 3));
    }

    #[test]
    fn selection_scrolled_out_of_view_is_outside_region() {
        let text: String = (0..20).map(|i| format!("line {i}\n")).collect();
        let (mut editor, sub) = editor_with(&text, Rect::new(0, 0, 20, 3));
        editor.select_range(0, 4);
        editor.move_cursor(Motion::DocEnd, false);
        editor.select_range(0, 4);
        editor.scroll_by(10);
        editor.publish_selection();
        let Some(SelectionSignal::Changed(snapshot)) = sub.drain().pop() else {
            panic!("expected selection change");
        };
        assert_eq!(snapshot.text, "line");
        assert!(!snapshot.inside_region);
    }

    #[test]
    fn paste_normalizes_line_endings() {
        let (mut editor, _sub) = editor_with("", Rect::new(0, 0, 20, 3));
        editor.insert_str("a\r\nb\rc\td");
        assert_eq!(editor.text(), "a\nb\nc    d");
    }
}
