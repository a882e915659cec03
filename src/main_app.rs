use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Tabs},
};

use crate::clipboard::ClipboardSink;
use crate::editor::Editor;
use crate::event_source::EventSource;
use crate::feed::Feed;
use crate::notification::NotificationManager;
use crate::paraphrase_controller::{
    ActionError, ActionOutcome, ApplyOutcome, ParaphraseController,
};
use crate::selection_tracker::{SelectionSignal, SelectionTracker};
use crate::service::ParaphraseService;
use crate::theme::{Base16Palette, OCEANIC_NEXT, palette_by_name};
use crate::widget::history_view::HistoryView;
use crate::widget::{hud_message, popover, result_view};
use crate::worker::Dispatch;

pub const PARAPHRASE_SUCCESS: &str = "Text successfully paraphrased!";
pub const PARAPHRASE_FAILED: &str = "Failed to paraphrase text. Please try again.";
pub const HISTORY_FAILED: &str = "Failed to load paraphrasing history.";

const SIDE_BY_SIDE_MIN_WIDTH: u16 = 100;
const MAX_EVENTS_PER_FRAME: usize = 50;
const WHEEL_STEP: isize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Editor,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

pub struct App {
    pub editor: Editor,
    pub controller: ParaphraseController,
    pub notifications: NotificationManager,
    pub clipboard: Box<dyn ClipboardSink>,
    history: Option<HistoryView>,
    tab: Tab,
    feed: Feed<SelectionSignal>,
    service: Arc<dyn ParaphraseService>,
    dispatch: Dispatch,
    palette: &'static Base16Palette,
    tick: usize,
}

impl App {
    pub fn new(service: Arc<dyn ParaphraseService>, clipboard: Box<dyn ClipboardSink>) -> Self {
        Self::with_dispatch(service, clipboard, Dispatch::Background)
    }

    pub fn with_dispatch(
        service: Arc<dyn ParaphraseService>,
        clipboard: Box<dyn ClipboardSink>,
        dispatch: Dispatch,
    ) -> Self {
        let feed = Feed::new();
        let tracker = SelectionTracker::attach(&feed);
        Self {
            editor: Editor::new(feed.clone()),
            controller: ParaphraseController::new(Arc::clone(&service), tracker, dispatch),
            notifications: NotificationManager::new(),
            clipboard,
            history: None,
            tab: Tab::Editor,
            feed,
            service,
            dispatch,
            palette: &OCEANIC_NEXT,
            tick: 0,
        }
    }

    /// Switches palette by name. Unknown names keep the current one.
    pub fn set_theme(&mut self, name: &str) -> bool {
        match palette_by_name(name) {
            Some(palette) => {
                self.palette = palette;
                true
            }
            None => {
                warn!("Unknown theme {name:?}, keeping current palette");
                false
            }
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn history(&self) -> Option<&HistoryView> {
        self.history.as_ref()
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        if self.tab == tab {
            return;
        }
        info!("Switching to {tab:?} tab");
        self.tab = tab;
        self.history = match tab {
            Tab::History => Some(HistoryView::mount(Arc::clone(&self.service), self.dispatch)),
            Tab::Editor => None,
        };
    }

    /// Feeds queued selection signals to the tracker.
    pub fn sync_selection(&mut self) -> bool {
        if !self.controller.tracker().has_pending() {
            return false;
        }
        let content = self.editor.text();
        self.controller.tracker_mut().pump(&content)
    }

    /// Applies finished background requests. Returns true if anything changed.
    pub fn poll_background(&mut self) -> bool {
        let mut changed = false;

        if let Some(outcome) = self.controller.poll() {
            self.on_paraphrase_outcome(outcome);
            changed = true;
        }

        if let Some(result) = self.history.as_mut().and_then(HistoryView::poll) {
            if result.is_err() {
                self.notifications.error(HISTORY_FAILED);
            }
            changed = true;
        }

        changed
    }

    fn on_paraphrase_outcome(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::SelectionParaphrased(_) => {
                // The span is consumed; drop the highlight so it is not re-published.
                self.editor.clear_selection();
                self.notifications.info(PARAPHRASE_SUCCESS);
            }
            ActionOutcome::DocumentParaphrased => self.notifications.info(PARAPHRASE_SUCCESS),
            ActionOutcome::Failed(_) => self.notifications.error(PARAPHRASE_FAILED),
        }
    }

    fn report_action_error(&mut self, error: ActionError) {
        match error {
            ActionError::Busy => debug!("Paraphrase already in progress, ignoring trigger"),
            other => self.notifications.warn(other.to_string()),
        }
    }

    pub fn paraphrase_selection(&mut self) {
        if let Err(e) = self.controller.paraphrase_selection() {
            self.report_action_error(e);
        }
    }

    pub fn paraphrase_document(&mut self) {
        let text = self.editor.text();
        if let Err(e) = self.controller.paraphrase_document(&text) {
            self.report_action_error(e);
        }
    }

    pub fn copy_result(&mut self) {
        result_view::copy_paraphrase(
            self.controller.results(),
            self.clipboard.as_mut(),
            &mut self.notifications,
        );
    }

    pub fn apply_result(&mut self) {
        match self.controller.apply_result(&mut self.editor) {
            ApplyOutcome::ReplacedSelection | ApplyOutcome::ReplacedDocument => {
                self.notifications.info("Paraphrase applied to the editor");
            }
            ApplyOutcome::OriginalMissing => {
                self.notifications
                    .warn("The original text is no longer in the editor");
            }
            ApplyOutcome::NothingToApply => self.notifications.warn("Nothing to apply yet"),
        }
    }

    pub fn handle_event(&mut self, event: Event) -> Option<AppAction> {
        let action = match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Mouse(mouse) => {
                self.handle_mouse_event(mouse);
                None
            }
            Event::Paste(text) => {
                if self.tab == Tab::Editor {
                    self.editor.insert_str(&text);
                }
                None
            }
            _ => None,
        };

        if self.tab == Tab::Editor {
            self.editor.publish_selection();
        }
        self.sync_selection();
        self.poll_background();
        action
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
            return Some(AppAction::Quit);
        }

        match self.tab {
            Tab::Editor => self.handle_editor_key(key, ctrl),
            Tab::History => self.handle_history_key(key),
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent, ctrl: bool) -> Option<AppAction> {
        match key.code {
            KeyCode::Tab => self.switch_tab(Tab::History),
            KeyCode::Char('p') if ctrl => self.paraphrase_selection(),
            KeyCode::Char('d') if ctrl => self.paraphrase_document(),
            KeyCode::Char('y') if ctrl => self.copy_result(),
            KeyCode::Char('o') if ctrl => self.apply_result(),
            _ => {
                self.editor.handle_key(key);
            }
        }
        None
    }

    fn handle_history_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Tab | KeyCode::Esc => self.switch_tab(Tab::Editor),
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(history) = self.history.as_mut() {
                    history.select_next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(history) = self.history.as_mut() {
                    history.select_previous();
                }
            }
            KeyCode::Char('e') => {
                if let Some(history) = self.history.as_mut() {
                    history.toggle_expanded();
                }
            }
            KeyCode::Char('y') => {
                if let Some(history) = self.history.as_ref() {
                    history.copy_selected(self.clipboard.as_mut(), &mut self.notifications);
                }
            }
            _ => {}
        }
        None
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.tab == Tab::Editor && self.popover_hit(column, row) {
                    debug!("Paraphrase button clicked");
                    self.paraphrase_selection();
                    return;
                }
                self.feed.publish(SelectionSignal::PointerDown { column, row });
                let in_editor = self.tab == Tab::Editor && self.editor.mouse_down(column, row);
                if !in_editor {
                    self.editor.clear_selection();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.tab == Tab::Editor => {
                self.editor.mouse_drag(column, row);
            }
            MouseEventKind::Up(MouseButton::Left) if self.tab == Tab::Editor => {
                self.editor.mouse_up();
            }
            MouseEventKind::ScrollDown => match self.tab {
                Tab::Editor => self.editor.scroll_by(WHEEL_STEP),
                Tab::History => {
                    if let Some(history) = self.history.as_mut() {
                        history.select_next();
                    }
                }
            },
            MouseEventKind::ScrollUp => match self.tab {
                Tab::Editor => self.editor.scroll_by(-WHEEL_STEP),
                Tab::History => {
                    if let Some(history) = self.history.as_mut() {
                        history.select_previous();
                    }
                }
            },
            _ => {}
        }
    }

    fn popover_hit(&self, column: u16, row: u16) -> bool {
        self.controller
            .tracker()
            .popover_area()
            .is_some_and(|area| area.contains(Position::new(column, row)))
    }

    fn is_busy(&self) -> bool {
        self.controller.is_processing() || self.history.as_ref().is_some_and(HistoryView::is_loading)
    }

    /// Periodic housekeeping. Returns true if a redraw is needed.
    pub fn on_tick(&mut self) -> bool {
        let mut changed = self.notifications.update();
        if self.poll_background() {
            changed = true;
        }
        if self.is_busy() {
            self.tick = self.tick.wrapping_add(1);
            changed = true;
        }
        changed
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = self.palette;
        let area = f.area();
        f.render_widget(
            Block::default().style(Style::default().bg(palette.base_00)),
            area,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_tabs(f, chunks[0]);
        match self.tab {
            Tab::Editor => self.draw_editor_tab(f, chunks[1]),
            Tab::History => {
                if let Some(history) = self.history.as_mut() {
                    history.render(f, chunks[1], self.tick, palette);
                }
                self.controller.tracker_mut().set_popover_area(None);
            }
        }
        self.draw_status(f, chunks[2]);
    }

    fn draw_tabs(&self, f: &mut Frame, area: Rect) {
        let selected = match self.tab {
            Tab::Editor => 0,
            Tab::History => 1,
        };
        let tabs = Tabs::new(vec![" Editor ", " History "])
            .select(selected)
            .style(Style::default().fg(self.palette.base_04))
            .highlight_style(
                Style::default()
                    .fg(self.palette.base_0a)
                    .add_modifier(Modifier::BOLD),
            )
            .divider("|");
        f.render_widget(tabs, area);
    }

    fn draw_editor_tab(&mut self, f: &mut Frame, area: Rect) {
        let palette = self.palette;
        let chunks = if area.width >= SIDE_BY_SIDE_MIN_WIDTH {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(area)
        } else {
            Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(area)
        };

        self.editor.render(f, chunks[0], true, palette);
        // The render may have published a new selection position.
        self.sync_selection();

        let processing = self.controller.is_processing();
        result_view::render(f, chunks[1], self.controller.results(), processing, palette);

        let frame = f.area();
        let button = self
            .controller
            .tracker()
            .active()
            .map(|span| popover::area_for(span, frame));
        if let Some(button) = button {
            popover::render(f, button, processing, self.tick, palette);
        }
        self.controller.tracker_mut().set_popover_area(button);
    }

    fn draw_status(&self, f: &mut Frame, area: Rect) {
        if let Some(notification) = self.notifications.current() {
            hud_message::render(f, area, notification, self.palette);
            return;
        }

        let help = match self.tab {
            Tab::Editor => {
                "Tab: History | ^P: Paraphrase selection | ^D: Paraphrase all | ^Y: Copy | ^O: Apply | ^Q: Quit"
            }
            Tab::History => "Tab/Esc: Editor | j/k: Move | e: Expand | y: Copy Result | q: Quit",
        };
        let mut spans = Vec::new();
        if self.controller.is_processing() {
            spans.push(Span::styled(
                " Paraphrasing… ",
                Style::default()
                    .fg(self.palette.base_00)
                    .bg(self.palette.base_0a),
            ));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            help,
            Style::default().fg(self.palette.base_03),
        ));
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    // Draw before reading input so the editor knows its area.
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            needs_redraw = false;
        }

        let mut events_processed = 0;
        let mut should_quit = false;
        let mut timeout = tick_rate.saturating_sub(last_tick.elapsed());
        while events_processed < MAX_EVENTS_PER_FRAME && event_source.poll(timeout)? {
            timeout = Duration::ZERO;
            let event = event_source.read()?;
            events_processed += 1;
            if app.handle_event(event) == Some(AppAction::Quit) {
                should_quit = true;
                break;
            }
        }

        if should_quit {
            info!("Quit requested");
            break;
        }

        if events_processed > 0 || app.sync_selection() {
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            if app.on_tick() {
                needs_redraw = true;
            }
            last_tick = Instant::now();
        }
    }

    Ok(())
}
