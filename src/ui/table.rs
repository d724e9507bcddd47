use std::cmp::min;

use anyhow::Result;
use rusqlite::Connection;

use crate::db::{fetch_books, update_book_field};
use crate::models::{Book, BookField};

use super::forms::CellEdit;

/// Number of grid columns: ID plus the three editable fields.
pub(crate) const COLUMN_COUNT: usize = 4;
pub(crate) const COLUMN_TITLES: [&str; COLUMN_COUNT] = ["ID", "Title", "Author", "Year"];

/// View model behind the record grid. Every refresh builds a fresh row list
/// and swaps it in, so there is no half-updated state for a handler to
/// observe.
pub(crate) struct BookTable {
    rows: Vec<Book>,
    filter: String,
    selected: Option<usize>,
    column: usize,
}

impl BookTable {
    pub(crate) fn load(conn: &Connection) -> Result<Self> {
        let mut table = Self {
            rows: Vec::new(),
            filter: String::new(),
            selected: None,
            column: BookField::Title.column_index(),
        };
        table.refresh(conn)?;
        Ok(table)
    }

    /// Re-run the active filter and replace the rows.
    pub(crate) fn refresh(&mut self, conn: &Connection) -> Result<()> {
        let rows = fetch_books(conn, &self.filter)?;
        self.replace_rows(rows);
        Ok(())
    }

    fn replace_rows(&mut self, rows: Vec<Book>) {
        self.rows = rows;
        self.selected = match self.selected {
            _ if self.rows.is_empty() => None,
            Some(idx) => Some(min(idx, self.rows.len() - 1)),
            None => None,
        };
    }

    pub(crate) fn set_filter(&mut self, conn: &Connection, keyword: &str) -> Result<()> {
        self.filter = keyword.to_string();
        self.refresh(conn)
    }

    pub(crate) fn filter(&self) -> &str {
        &self.filter
    }

    pub(crate) fn rows(&self) -> &[Book] {
        &self.rows
    }

    pub(crate) fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub(crate) fn column(&self) -> usize {
        self.column
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.selected.and_then(|idx| self.rows.get(idx))
    }

    /// Put the cursor on a specific cell, clamped to the grid.
    pub(crate) fn select_cell(&mut self, row: usize, column: usize) {
        if self.rows.is_empty() {
            self.selected = None;
        } else {
            self.selected = Some(min(row, self.rows.len() - 1));
        }
        self.column = min(column, COLUMN_COUNT - 1);
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.rows.is_empty() {
            self.selected = None;
            return;
        }
        let last = self.rows.len() as isize - 1;
        let next = match self.selected {
            Some(idx) => (idx as isize + offset).clamp(0, last),
            None if offset < 0 => last,
            None => 0,
        };
        self.selected = Some(next as usize);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = if self.rows.is_empty() { None } else { Some(0) };
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.rows.len().checked_sub(1);
    }

    pub(crate) fn move_column(&mut self, offset: isize) {
        let last = COLUMN_COUNT as isize - 1;
        self.column = (self.column as isize + offset).clamp(0, last) as usize;
    }

    /// Open an edit prompt for the cell under the cursor.
    pub(crate) fn begin_edit(&self) -> Option<CellEdit> {
        let row = self.selected?;
        self.edit_cell(row, self.column)
    }

    /// Open an edit prompt for a given cell, pre-filled with its text. The ID
    /// column is read-only and yields `None`.
    pub(crate) fn edit_cell(&self, row: usize, column: usize) -> Option<CellEdit> {
        let field = BookField::from_column(column)?;
        let book = self.rows.get(row)?;
        Some(CellEdit {
            book_id: book.id,
            row,
            field,
            input: book.cell(column),
            error: None,
        })
    }

    /// Write the prompt's value through, refresh, and move the cursor to the
    /// next editable column of the same row. Blank input leaves everything as
    /// it was and returns `Ok(false)`.
    pub(crate) fn commit_edit(&mut self, conn: &Connection, edit: &CellEdit) -> Result<bool> {
        if edit.is_blank() {
            return Ok(false);
        }

        update_book_field(conn, edit.book_id, edit.field, &edit.input)?;
        self.refresh(conn)?;

        let column = edit
            .field
            .next()
            .unwrap_or(edit.field)
            .column_index();
        self.select_cell(edit.row, column);
        Ok(true)
    }
}
