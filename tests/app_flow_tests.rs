use std::sync::Arc;

use chrono::{TimeZone, Utc};
use paraphrat::clipboard::MockClipboard;
use paraphrat::event_source::KeyCode;
use paraphrat::main_app::{HISTORY_FAILED, PARAPHRASE_FAILED, PARAPHRASE_SUCCESS};
use paraphrat::paraphrase_controller::DisplayedResult;
use paraphrat::service::HistoryRecord;
use paraphrat::test_utils::test_helpers::{
    MockParaphraseService, TestScenarioBuilder, capture_terminal_state, create_test_terminal,
};
use paraphrat::widget::history_view::EMPTY_MESSAGE;
use paraphrat::worker::Dispatch;
use paraphrat::{App, Tab, run_app_with_event_source};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use reqwest::StatusCode;

fn create_app(service: &Arc<MockParaphraseService>) -> App {
    create_app_with_clipboard(service, MockClipboard::new())
}

/// Keep a clone of `clipboard` to read back what the app copied.
fn create_app_with_clipboard(
    service: &Arc<MockParaphraseService>,
    clipboard: MockClipboard,
) -> App {
    App::with_dispatch(service.clone(), Box::new(clipboard), Dispatch::Inline)
}

fn run(app: &mut App, terminal: &mut Terminal<TestBackend>, scenario: TestScenarioBuilder) {
    let mut events = scenario.build();
    run_app_with_event_source(terminal, app, &mut events).unwrap();
    terminal.draw(|f| app.draw(f)).unwrap();
}

fn history_record(id: &str, original: &str, paraphrased: &str) -> HistoryRecord {
    HistoryRecord {
        id: id.to_string(),
        original_text: original.to_string(),
        paraphrased_text: paraphrased.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap(),
    }
}

#[test]
fn paraphrasing_a_selection_shows_original_and_rewrite() {
    let service = Arc::new(MockParaphraseService::replying(&[(
        "the quick fox",
        "the swift fox",
    )]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("see the quick fox run")
        .move_left(4)
        .select_left(13)
        .press_ctrl_char('p');
    run(&mut app, &mut terminal, scenario);

    assert_eq!(service.calls(), vec!["the quick fox".to_string()]);
    let pair = app.controller.results().pair().expect("pair result");
    assert_eq!(pair.original, "the quick fox");
    assert_eq!(pair.paraphrased, "the swift fox");
    assert_eq!((pair.start_offset, pair.end_offset), (4, 17));
    assert!(app.controller.tracker().active().is_none());
    assert!(!app.controller.is_processing());
    assert!(app.notifications.contains(PARAPHRASE_SUCCESS));
    assert_eq!(app.editor.text(), "see the quick fox run");

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Original"), "screen:\n{screen}");
    assert!(screen.contains("the swift fox"), "screen:\n{screen}");
}

#[test]
fn repeated_phrase_maps_to_first_occurrence() {
    let service = Arc::new(MockParaphraseService::replying(&[("fox", "wolf")]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("fox and fox")
        .select_left(3)
        .press_ctrl_char('p')
        .press_ctrl_char('o');
    run(&mut app, &mut terminal, scenario);

    let pair = app.controller.results().pair().expect("pair result");
    assert_eq!((pair.start_offset, pair.end_offset), (0, 3));
    assert_eq!(app.editor.text(), "wolf and fox");
}

#[test]
fn document_result_replaces_selection_result() {
    let service = Arc::new(MockParaphraseService::replying(&[
        ("world", "earth"),
        ("Hello world", "Hi there, world"),
    ]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(120, 30);

    let scenario = TestScenarioBuilder::new()
        .type_text("Hello world")
        .select_left(5)
        .press_ctrl_char('p')
        .press_ctrl_char('d');
    run(&mut app, &mut terminal, scenario);

    assert_eq!(
        service.calls(),
        vec!["world".to_string(), "Hello world".to_string()]
    );
    assert!(app.controller.results().pair().is_none());
    assert_eq!(
        app.controller.results().displayed(),
        DisplayedResult::Document("Hi there, world")
    );
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Hi there, world"), "screen:\n{screen}");
}

#[test]
fn blank_document_is_rejected_without_calling_service() {
    let service = Arc::new(MockParaphraseService::replying(&[]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("   ")
        .press_ctrl_char('d');
    run(&mut app, &mut terminal, scenario);

    assert!(service.calls().is_empty());
    assert!(app.notifications.contains("Please enter some text to paraphrase"));
    assert_eq!(
        app.controller.results().displayed(),
        DisplayedResult::Empty
    );
}

#[test]
fn paraphrase_without_selection_warns() {
    let service = Arc::new(MockParaphraseService::replying(&[]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("nothing selected")
        .press_ctrl_char('p');
    run(&mut app, &mut terminal, scenario);

    assert!(service.calls().is_empty());
    assert!(app.notifications.contains("Select some text to paraphrase first"));
}

#[test]
fn whitespace_selection_is_not_active() {
    let service = Arc::new(MockParaphraseService::replying(&[]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("a    ")
        .select_left(3)
        .press_ctrl_char('p');
    run(&mut app, &mut terminal, scenario);

    assert!(app.editor.has_selection());
    assert!(app.controller.tracker().active().is_none());
    assert!(service.calls().is_empty());
}

#[test]
fn service_failure_notifies_and_leaves_state_alone() {
    let service = Arc::new(MockParaphraseService::failing(
        StatusCode::INTERNAL_SERVER_ERROR,
    ));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("keep me")
        .select_left(2)
        .press_ctrl_char('p');
    run(&mut app, &mut terminal, scenario);

    assert_eq!(service.calls(), vec!["me".to_string()]);
    assert!(app.notifications.contains(PARAPHRASE_FAILED));
    assert!(!app.controller.is_processing());
    assert_eq!(app.editor.text(), "keep me");
    assert_eq!(
        app.controller.results().displayed(),
        DisplayedResult::Empty
    );
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains(PARAPHRASE_FAILED), "screen:\n{screen}");
}

#[test]
fn copy_puts_paraphrase_on_clipboard_without_changing_results() {
    let service = Arc::new(MockParaphraseService::replying(&[(
        "Hello world",
        "Hi there, world",
    )]));
    let clipboard = MockClipboard::new();
    let mut app = create_app_with_clipboard(&service, clipboard.clone());
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("Hello world")
        .press_ctrl_char('d');
    run(&mut app, &mut terminal, scenario);
    let before = app.controller.results().clone();

    run(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new().press_ctrl_char('y'),
    );

    assert_eq!(clipboard.copied(), vec!["Hi there, world".to_string()]);
    assert!(app.notifications.contains("Text copied to clipboard!"));
    assert_eq!(app.controller.results(), &before);
    assert_eq!(app.editor.text(), "Hello world");
}

#[test]
fn apply_writes_document_result_into_editor() {
    let service = Arc::new(MockParaphraseService::replying(&[(
        "Hello world",
        "Hi there, world",
    )]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("Hello world")
        .press_ctrl_char('d')
        .press_ctrl_char('o');
    run(&mut app, &mut terminal, scenario);

    assert_eq!(app.editor.text(), "Hi there, world");
    assert_eq!(
        app.controller.results().document(),
        Some("Hi there, world")
    );
}

#[test]
fn clicking_paraphrase_button_triggers_request() {
    let service = Arc::new(MockParaphraseService::replying(&[("brown", "tan")]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("the brown dog")
        .move_left(4)
        .select_left(5);
    run(&mut app, &mut terminal, scenario);

    let span = app.controller.tracker().active().cloned().expect("active span");
    assert_eq!(span.text, "brown");
    let button = app
        .controller
        .tracker()
        .popover_area()
        .expect("button drawn under selection");
    assert_eq!(button.y, span.anchor_y);
    assert!(capture_terminal_state(&terminal).contains("[ AI ^P ]"));

    run(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new().click(button.x + 1, button.y),
    );

    assert_eq!(service.calls(), vec!["brown".to_string()]);
    assert_eq!(
        app.controller.results().displayed_paraphrase(),
        Some("tan")
    );
    assert!(app.controller.tracker().popover_area().is_none());
}

#[test]
fn clicking_outside_editor_dismisses_selection() {
    let service = Arc::new(MockParaphraseService::replying(&[]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("dismiss this")
        .select_left(4);
    run(&mut app, &mut terminal, scenario);
    assert!(app.controller.tracker().active().is_some());

    // Bottom row holds the status line, outside the editor.
    run(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new().click(0, 23),
    );

    assert!(app.controller.tracker().active().is_none());
    assert!(!app.editor.has_selection());
    assert!(service.calls().is_empty());

    terminal.backend_mut().resize(100, 30);
    run(&mut app, &mut terminal, TestScenarioBuilder::new());
    assert!(app.controller.tracker().active().is_none());
    assert!(!capture_terminal_state(&terminal).contains("[ AI ^P ]"));
}

#[test]
fn paraphrased_selection_stays_dismissed_after_resize_and_scroll() {
    let service = Arc::new(MockParaphraseService::replying(&[("fox", "wolf")]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("one\nbrown fox")
        .select_left(3)
        .press_ctrl_char('p');
    run(&mut app, &mut terminal, scenario);
    assert_eq!(
        app.controller.results().displayed_paraphrase(),
        Some("wolf")
    );
    assert!(!app.editor.has_selection());

    terminal.backend_mut().resize(100, 30);
    run(&mut app, &mut terminal, TestScenarioBuilder::new());
    let area = app.editor.area();
    run(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new().scroll_down(area.x, area.y),
    );

    assert!(app.controller.tracker().active().is_none());
    assert!(app.controller.tracker().popover_area().is_none());
    assert!(!app.editor.has_selection());
    assert!(!capture_terminal_state(&terminal).contains("[ AI ^P ]"));
    assert_eq!(service.calls(), vec!["fox".to_string()]);
}

#[test]
fn dragging_across_a_word_selects_it_for_paraphrase() {
    let service = Arc::new(MockParaphraseService::replying(&[("brown", "tan")]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    run(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new().type_text("the brown dog"),
    );
    let area = app.editor.area();

    let scenario = TestScenarioBuilder::new()
        .mouse_down(area.x + 4, area.y)
        .drag_to(area.x + 9, area.y)
        .mouse_up(area.x + 9, area.y);
    run(&mut app, &mut terminal, scenario);

    let span = app.controller.tracker().active().cloned().expect("active span");
    assert_eq!(span.text, "brown");
    assert_eq!((span.start_offset, span.end_offset), (4, 9));

    run(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new().press_ctrl_char('p'),
    );
    assert_eq!(service.calls(), vec!["brown".to_string()]);
    assert_eq!(
        app.controller.results().displayed_paraphrase(),
        Some("tan")
    );
}

#[test]
fn select_all_sends_whole_text() {
    let service = Arc::new(MockParaphraseService::replying(&[(
        "Hello world",
        "Hi there, world",
    )]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("Hello world")
        .select_all()
        .press_ctrl_char('p');
    run(&mut app, &mut terminal, scenario);

    assert_eq!(service.calls(), vec!["Hello world".to_string()]);
    let pair = app.controller.results().pair().expect("pair result");
    assert_eq!((pair.start_offset, pair.end_offset), (0, 11));
}

#[test]
fn pasted_text_lands_in_editor() {
    let service = Arc::new(MockParaphraseService::replying(&[]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .paste("first line\r\nsecond\tline")
        .press_key(KeyCode::Home)
        .type_text(">");
    run(&mut app, &mut terminal, scenario);

    assert_eq!(app.editor.text(), "first line\n>second    line");
}

#[test]
fn empty_history_shows_empty_message() {
    let service = Arc::new(MockParaphraseService::replying(&[]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    run(&mut app, &mut terminal, TestScenarioBuilder::new().press_tab());

    assert_eq!(app.tab(), Tab::History);
    assert_eq!(service.history_calls(), 1);
    let history = app.history().expect("history mounted");
    assert!(!history.is_loading());
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains(EMPTY_MESSAGE), "screen:\n{screen}");
    assert!(!screen.contains("Loading history"), "screen:\n{screen}");
}

#[test]
fn history_lists_records_in_service_order_and_copies_selected() {
    let service = Arc::new(MockParaphraseService::replying(&[]).with_history(vec![
        history_record("1", "the quick fox", "the swift fox"),
        history_record("2", "Hello world", "Hi there, world"),
    ]));
    let clipboard = MockClipboard::new();
    let mut app = create_app_with_clipboard(&service, clipboard.clone());
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .press_tab()
        .press_char('j')
        .press_char('y');
    run(&mut app, &mut terminal, scenario);

    let history = app.history().expect("history mounted");
    assert_eq!(history.records().len(), 2);
    assert_eq!(history.records()[0].id, "1");
    assert_eq!(history.selected_index(), 1);
    assert_eq!(clipboard.copied(), vec!["Hi there, world".to_string()]);

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Paraphrasing History"), "screen:\n{screen}");
    assert!(screen.contains("the swift fox"), "screen:\n{screen}");
    assert!(screen.contains("2024"), "screen:\n{screen}");
}

#[test]
fn history_failure_notifies_and_shows_empty_state() {
    let service = Arc::new(
        MockParaphraseService::replying(&[]).with_history_failure(StatusCode::BAD_GATEWAY),
    );
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    run(&mut app, &mut terminal, TestScenarioBuilder::new().press_tab());

    assert!(app.notifications.contains(HISTORY_FAILED));
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains(EMPTY_MESSAGE), "screen:\n{screen}");
}

#[test]
fn leaving_history_unmounts_and_reentering_fetches_again() {
    let service = Arc::new(MockParaphraseService::replying(&[]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new().press_tab().press_esc();
    run(&mut app, &mut terminal, scenario);
    assert_eq!(app.tab(), Tab::Editor);
    assert!(app.history().is_none());

    run(&mut app, &mut terminal, TestScenarioBuilder::new().press_tab());
    assert_eq!(service.history_calls(), 2);
}

#[test]
fn editor_content_survives_tab_switches() {
    let service = Arc::new(MockParaphraseService::replying(&[]));
    let mut app = create_app(&service);
    let mut terminal = create_test_terminal(80, 24);

    let scenario = TestScenarioBuilder::new()
        .type_text("draft")
        .press_tab()
        .press_tab()
        .type_text("!");
    run(&mut app, &mut terminal, scenario);

    assert_eq!(app.editor.text(), "draft!");
}
