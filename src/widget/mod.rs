pub mod history_view;
pub mod hud_message;
pub mod popover;
pub mod result_view;
