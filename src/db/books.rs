use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::error::BookError;
use crate::models::{Book, BookField, FieldValue, NewBook};

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        year: row.get(3)?,
    })
}

/// Fetch every book, or only those whose title contains `keyword`. Matching
/// goes through `instr`, so it is case-sensitive and `%`/`_` in the keyword
/// are taken literally. Rows come back in id order for a stable grid.
pub fn fetch_books(conn: &Connection, keyword: &str) -> Result<Vec<Book>> {
    let books = if keyword.is_empty() {
        let mut stmt = conn
            .prepare("SELECT ID, Judul, Pengarang, Tahun FROM Buku ORDER BY ID")
            .context("failed to prepare book query")?;
        let rows = stmt
            .query_map([], book_from_row)
            .context("failed to load books")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect books")?;
        rows
    } else {
        let mut stmt = conn
            .prepare(
                "SELECT ID, Judul, Pengarang, Tahun FROM Buku
                 WHERE instr(Judul, ?1) > 0
                 ORDER BY ID",
            )
            .context("failed to prepare title search")?;
        let rows = stmt
            .query_map([keyword], book_from_row)
            .context("failed to search books")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect search results")?;
        rows
    };

    debug!(keyword, rows = books.len(), "fetched books");
    Ok(books)
}

/// Number of stored books.
pub fn count_books(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM Buku", [], |row| row.get(0))
        .context("failed to count books")
}

/// Validate the raw form input and insert a new row. Invalid input surfaces as
/// a [`BookError`] before anything touches the database.
pub fn create_book(conn: &Connection, title: &str, author: &str, year_text: &str) -> Result<Book> {
    let new_book = NewBook::parse(title, author, year_text)?;

    conn.execute(
        "INSERT INTO Buku (Judul, Pengarang, Tahun) VALUES (?1, ?2, ?3)",
        params![new_book.title, new_book.author, new_book.year],
    )
    .context("failed to insert book")?;

    let id = conn.last_insert_rowid();
    info!(id, title = %new_book.title, "book added");
    Ok(Book {
        id,
        title: new_book.title,
        author: new_book.author,
        year: new_book.year,
    })
}

/// Overwrite one field of an existing book. The value is trimmed and checked
/// against the field's rules first; an id that matches nothing is reported as
/// [`BookError::NotFound`].
pub fn update_book_field(conn: &Connection, id: i64, field: BookField, raw: &str) -> Result<()> {
    let value = field.parse_value(raw)?;

    let sql = match field {
        BookField::Title => "UPDATE Buku SET Judul = ?1 WHERE ID = ?2",
        BookField::Author => "UPDATE Buku SET Pengarang = ?1 WHERE ID = ?2",
        BookField::Year => "UPDATE Buku SET Tahun = ?1 WHERE ID = ?2",
    };

    let updated = match &value {
        FieldValue::Text(text) => conn.execute(sql, params![text, id]),
        FieldValue::Year(year) => conn.execute(sql, params![year, id]),
    }
    .with_context(|| format!("failed to update {}", field.column_name()))?;

    if updated == 0 {
        return Err(BookError::NotFound(id).into());
    }

    info!(id, field = field.column_name(), "book updated");
    Ok(())
}

/// Remove a book. Returns whether a row was actually deleted; a missing id is
/// not an error.
pub fn delete_book(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM Buku WHERE ID = ?1", params![id])
        .context("failed to delete book")?;

    info!(id, deleted, "book delete requested");
    Ok(deleted > 0)
}
