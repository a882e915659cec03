// Export modules for use in tests
pub mod clipboard;
pub mod editor;
pub mod event_source;
pub mod feed;
pub mod main_app;
pub mod notification;
pub mod panic_handler;
pub mod paraphrase_controller;
pub mod selection_tracker;
pub mod service;
pub mod settings;
pub mod theme;
pub mod widget;
pub mod worker;

pub mod test_utils;

// Re-export main app components
pub use main_app::{App, AppAction, Tab, run_app_with_event_source};
