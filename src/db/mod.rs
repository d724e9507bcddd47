//! Persistence module split across logical submodules.

mod books;
mod connection;
mod export;

pub use books::{count_books, create_book, delete_book, fetch_books, update_book_field};
pub use connection::{ensure_schema, open_catalog, open_in_memory};
pub use export::{ensure_csv_extension, export_csv, read_csv, CSV_HEADER};
