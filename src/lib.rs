//! Core library surface for the book catalog TUI.
//!
//! The binary only wires these pieces together; tests and any external tooling
//! can reach the same persistence and export functions directly.
pub mod config;
pub mod csv;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer.
pub use db::{
    count_books, create_book, delete_book, export_csv, fetch_books, open_catalog, read_csv,
    update_book_field,
};

pub use config::Settings;
pub use error::BookError;
pub use models::{Book, BookField};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
