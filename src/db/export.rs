use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::csv::{encode_record, parse_records};
use crate::error::BookError;
use crate::models::Book;

use super::books::fetch_books;

/// Header row written at the top of every export.
pub const CSV_HEADER: [&str; 4] = ["ID", "Judul", "Pengarang", "Tahun"];

/// Dump the whole table to `path`, replacing any existing file. Returns the
/// number of data rows written.
pub fn export_csv(conn: &Connection, path: &Path) -> Result<usize> {
    let books = fetch_books(conn, "")?;

    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", encode_record(&CSV_HEADER)).context("failed to write CSV header")?;
    for book in &books {
        let fields = [
            book.id.to_string(),
            book.title.clone(),
            book.author.clone(),
            book.year.to_string(),
        ];
        writeln!(writer, "{}", encode_record(&fields)).context("failed to write CSV row")?;
    }
    writer.flush().context("failed to flush CSV file")?;

    info!(path = %path.display(), rows = books.len(), "catalog exported");
    Ok(books.len())
}

/// Read an exported file back into books. The header must match
/// [`CSV_HEADER`] and every row needs four fields.
pub fn read_csv(path: &Path) -> Result<Vec<Book>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut records = parse_records(&text)?.into_iter();

    let header = records.next().ok_or(BookError::InvalidCsv {
        line: 1,
        reason: "missing header row".to_string(),
    })?;
    if header != CSV_HEADER {
        return Err(BookError::InvalidCsv {
            line: 1,
            reason: format!("unexpected header {header:?}"),
        }
        .into());
    }

    records
        .enumerate()
        .map(|(idx, record)| book_from_record(idx + 2, record))
        .collect()
}

fn book_from_record(line: usize, record: Vec<String>) -> Result<Book> {
    let invalid = |reason: String| BookError::InvalidCsv { line, reason };

    let [id, title, author, year]: [String; 4] = record
        .try_into()
        .map_err(|fields: Vec<String>| invalid(format!("expected 4 fields, found {}", fields.len())))?;

    Ok(Book {
        id: id
            .parse()
            .map_err(|_| invalid(format!("ID '{id}' is not a number")))?,
        title,
        author,
        year: year
            .parse()
            .map_err(|_| invalid(format!("year '{year}' is not a number")))?,
    })
}

/// Append `.csv` unless the path already ends with it.
pub fn ensure_csv_extension(path: &Path) -> PathBuf {
    if path.as_os_str().to_string_lossy().ends_with(".csv") {
        path.to_path_buf()
    } else {
        let mut raw = path.as_os_str().to_os_string();
        raw.push(".csv");
        PathBuf::from(raw)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::db::{create_book, open_in_memory};

    #[test]
    fn export_writes_header_then_rows() {
        let conn = open_in_memory().unwrap();
        create_book(&conn, "A", "B", "2000").unwrap();
        create_book(&conn, "C", "D", "2010").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        assert_eq!(export_csv(&conn, &path).unwrap(), 2);

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("ID,Judul,Pengarang,Tahun"));

        let books = read_csv(&path).unwrap();
        let expected = vec![
            Book { id: 1, title: "A".into(), author: "B".into(), year: 2000 },
            Book { id: 2, title: "C".into(), author: "D".into(), year: 2010 },
        ];
        assert_eq!(books.len(), 2);
        for book in expected {
            assert!(books.contains(&book), "missing {book:?}");
        }
    }

    #[test]
    fn export_round_trips_awkward_text() {
        let conn = open_in_memory().unwrap();
        let inserted = vec![
            create_book(&conn, "War, and Peace", "Leo \"Lev\" Tolstoy", "1869").unwrap(),
            create_book(&conn, "Cantik Itu Luka", "Eka Kurniawan", "2002").unwrap(),
            create_book(&conn, "Line\nBreak", "Ñandú", "0").unwrap(),
            create_book(&conn, " spaced ", "x", "1999").unwrap(),
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_csv(&conn, &path).unwrap();

        let parsed: HashSet<(i64, String, String, i64)> = read_csv(&path)
            .unwrap()
            .into_iter()
            .map(|b| (b.id, b.title, b.author, b.year))
            .collect();
        let expected: HashSet<(i64, String, String, i64)> = inserted
            .into_iter()
            .map(|b| (b.id, b.title, b.author, b.year))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn export_overwrites_existing_file() {
        let conn = open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale content that is much longer than the header\n".repeat(10)).unwrap();

        assert_eq!(export_csv(&conn, &path).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "ID,Judul,Pengarang,Tahun\n");
    }

    #[test]
    fn read_csv_rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");

        fs::write(&path, "name,age\nx,1\n").unwrap();
        let err = read_csv(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BookError>(),
            Some(BookError::InvalidCsv { line: 1, .. })
        ));

        fs::write(&path, "ID,Judul,Pengarang,Tahun\n1,A,B\n").unwrap();
        let err = read_csv(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BookError>(),
            Some(BookError::InvalidCsv { line: 2, .. })
        ));
    }

    #[test]
    fn csv_extension_is_appended_once() {
        assert_eq!(ensure_csv_extension(Path::new("data_buku")), PathBuf::from("data_buku.csv"));
        assert_eq!(
            ensure_csv_extension(Path::new("out/data_buku.csv")),
            PathBuf::from("out/data_buku.csv")
        );
        assert_eq!(ensure_csv_extension(Path::new("report.txt")), PathBuf::from("report.txt.csv"));
    }

    #[test]
    fn bare_csv_file_name_is_left_alone() {
        assert_eq!(ensure_csv_extension(Path::new(".csv")), PathBuf::from(".csv"));
        assert_eq!(ensure_csv_extension(Path::new("out/.csv")), PathBuf::from("out/.csv"));
    }
}
