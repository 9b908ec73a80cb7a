//! TUI module for the interactive movie browser.
//!
//! Uses `ratatui` + `crossterm` for rendering.

mod browser;
/// Search input debouncing.
pub mod debounce;
/// Browser state types.
pub mod state;
mod ui;

pub use browser::run_browser;
