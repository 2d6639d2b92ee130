// Presentation layer - HTTP surface of the three views
pub mod app_state;
pub mod handlers;
