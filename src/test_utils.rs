pub mod test_helpers {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::event_source::{Event, KeyCode, KeyModifiers, MouseButton, MouseEventKind, SimulatedEventSource};
    use crate::service::{HistoryRecord, ParaphraseService, ServiceError};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use reqwest::StatusCode;

    /// Builder for creating test scenarios with simulated user input
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self { events: Vec::new() }
        }

        /// Type each character of `text`; newlines become Enter
        pub fn type_text(mut self, text: &str) -> Self {
            for c in text.chars() {
                let event = match c {
                    '\n' => SimulatedEventSource::key_event(KeyCode::Enter, KeyModifiers::empty()),
                    c => SimulatedEventSource::char_key(c),
                };
                self.events.push(event);
            }
            self
        }

        /// Deliver `text` as a single bracketed paste
        pub fn paste(mut self, text: &str) -> Self {
            self.events.push(SimulatedEventSource::paste(text));
            self
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        /// Add a Ctrl+character key press
        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        pub fn press_tab(self) -> Self {
            self.press_key(KeyCode::Tab)
        }

        pub fn press_esc(self) -> Self {
            self.press_key(KeyCode::Esc)
        }

        /// Extend the selection `times` characters to the left
        pub fn select_left(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::shift_key(KeyCode::Left));
            }
            self
        }

        /// Move the cursor `times` characters left without selecting
        pub fn move_left(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events
                    .push(SimulatedEventSource::key_event(KeyCode::Left, KeyModifiers::empty()));
            }
            self
        }

        pub fn select_all(self) -> Self {
            self.press_ctrl_char('a')
        }

        /// Left button press at a screen cell
        pub fn mouse_down(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_event(
                MouseEventKind::Down(MouseButton::Left),
                column,
                row,
            ));
            self
        }

        pub fn drag_to(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_event(
                MouseEventKind::Drag(MouseButton::Left),
                column,
                row,
            ));
            self
        }

        pub fn mouse_up(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_event(
                MouseEventKind::Up(MouseButton::Left),
                column,
                row,
            ));
            self
        }

        /// One wheel notch down at a screen cell
        pub fn scroll_down(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_event(
                MouseEventKind::ScrollDown,
                column,
                row,
            ));
            self
        }

        /// Press and release at the same cell
        pub fn click(self, column: u16, row: u16) -> Self {
            self.mouse_down(column, row).mouse_up(column, row)
        }

        /// Quit the application (Ctrl+Q)
        pub fn quit(self) -> Self {
            self.press_ctrl_char('q')
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            // Trim trailing whitespace from each line
            lines.push(line.trim_end().to_string());
        }

        // Remove trailing empty lines
        while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
            lines.pop();
        }

        lines.join("\n")
    }

    /// In-memory stand-in for the remote service that records every call.
    #[derive(Default)]
    pub struct MockParaphraseService {
        replies: HashMap<String, String>,
        paraphrase_failure: Option<StatusCode>,
        history: Vec<HistoryRecord>,
        history_failure: Option<StatusCode>,
        calls: Mutex<Vec<String>>,
        history_calls: Mutex<usize>,
    }

    impl MockParaphraseService {
        /// Answers each known input with its pair; anything else is echoed
        /// back with a "Paraphrased: " prefix.
        pub fn replying(pairs: &[(&str, &str)]) -> Self {
            Self {
                replies: pairs
                    .iter()
                    .map(|(from, to)| (from.to_string(), to.to_string()))
                    .collect(),
                ..Self::default()
            }
        }

        /// Every paraphrase request fails with `status`.
        pub fn failing(status: StatusCode) -> Self {
            Self {
                paraphrase_failure: Some(status),
                ..Self::default()
            }
        }

        pub fn with_history(mut self, records: Vec<HistoryRecord>) -> Self {
            self.history = records;
            self
        }

        pub fn with_history_failure(mut self, status: StatusCode) -> Self {
            self.history_failure = Some(status);
            self
        }

        /// Texts sent to `paraphrase`, in call order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn history_calls(&self) -> usize {
            *self.history_calls.lock().unwrap()
        }
    }

    impl ParaphraseService for MockParaphraseService {
        fn paraphrase(&self, text: &str) -> Result<String, ServiceError> {
            self.calls.lock().unwrap().push(text.to_string());
            if let Some(status) = self.paraphrase_failure {
                return Err(ServiceError::Status(status));
            }
            Ok(self
                .replies
                .get(text)
                .cloned()
                .unwrap_or_else(|| format!("Paraphrased: {text}")))
        }

        fn history(&self) -> Result<Vec<HistoryRecord>, ServiceError> {
            *self.history_calls.lock().unwrap() += 1;
            match self.history_failure {
                Some(status) => Err(ServiceError::Status(status)),
                None => Ok(self.history.clone()),
            }
        }
    }
}
