//! Ratatui front-end: the application shell, its dialogs and the record grid.

mod app;
mod forms;
mod helpers;
mod table;
mod terminal;

pub use app::App;
pub use terminal::run_app;
