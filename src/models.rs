//! Domain models that mirror the `Buku` table and get passed throughout the
//! TUI. They stay light-weight data holders; validation of raw user input
//! happens here so both the gateway and the forms share one set of rules.

use std::fmt;

use crate::error::BookError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One catalog entry. The struct mirrors a row in the `Buku` table.
pub struct Book {
    /// Primary key assigned by SQLite. Never edited from the UI.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i64,
}

impl Book {
    /// Cell text for a grid column (0 = ID, 1 = title, 2 = author, 3 = year).
    pub fn cell(&self, column: usize) -> String {
        match BookField::from_column(column) {
            Some(BookField::Title) => self.title.clone(),
            Some(BookField::Author) => self.author.clone(),
            Some(BookField::Year) => self.year.to_string(),
            None => self.id.to_string(),
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.title, self.author, self.year)
    }
}

/// The columns a user may overwrite after creation. Keeping this closed means
/// every update maps onto a fixed statement instead of a caller-supplied
/// column name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BookField {
    #[default]
    Title,
    Author,
    Year,
}

impl BookField {
    pub const ALL: [BookField; 3] = [BookField::Title, BookField::Author, BookField::Year];

    /// Column name in the `Buku` table.
    pub fn column_name(self) -> &'static str {
        match self {
            BookField::Title => "Judul",
            BookField::Author => "Pengarang",
            BookField::Year => "Tahun",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Year => "Year",
        }
    }

    /// Grid column index; column 0 holds the read-only ID.
    pub fn column_index(self) -> usize {
        match self {
            BookField::Title => 1,
            BookField::Author => 2,
            BookField::Year => 3,
        }
    }

    pub fn from_column(column: usize) -> Option<BookField> {
        match column {
            1 => Some(BookField::Title),
            2 => Some(BookField::Author),
            3 => Some(BookField::Year),
            _ => None,
        }
    }

    /// The editable field right of this one, if any.
    pub fn next(self) -> Option<BookField> {
        match self {
            BookField::Title => Some(BookField::Author),
            BookField::Author => Some(BookField::Year),
            BookField::Year => None,
        }
    }

    /// Trim and type-check a replacement value for this field.
    pub fn parse_value(self, raw: &str) -> Result<FieldValue, BookError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BookError::EmptyValue);
        }
        match self {
            BookField::Title | BookField::Author => Ok(FieldValue::Text(trimmed.to_string())),
            BookField::Year => parse_year(trimmed).map(FieldValue::Year),
        }
    }
}

/// Typed replacement value for a single-field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Year(i64),
}

/// Validated input for a brand new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i64,
}

impl NewBook {
    /// Apply the insert rules: title and author non-empty, year digits only.
    /// Inputs are expected to be trimmed by the caller already; whitespace is
    /// kept as-is so the stored text matches what was validated.
    pub fn parse(title: &str, author: &str, year_text: &str) -> Result<Self, BookError> {
        if title.is_empty() {
            return Err(BookError::EmptyTitle);
        }
        if author.is_empty() {
            return Err(BookError::EmptyAuthor);
        }
        let year = parse_year(year_text)?;
        Ok(Self {
            title: title.to_string(),
            author: author.to_string(),
            year,
        })
    }
}

fn parse_year(text: &str) -> Result<i64, BookError> {
    if text.is_empty() || !text.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(BookError::InvalidYear(text.to_string()));
    }
    text.parse::<i64>()
        .map_err(|_| BookError::InvalidYear(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_book_rejects_missing_fields() {
        assert_eq!(NewBook::parse("", "B", "2000"), Err(BookError::EmptyTitle));
        assert_eq!(NewBook::parse("A", "", "2000"), Err(BookError::EmptyAuthor));
    }

    #[test]
    fn new_book_requires_digit_only_year() {
        for bad in ["", "20x0", "-2000", "2000.0", " 2000", "１９９９"] {
            assert!(
                matches!(NewBook::parse("A", "B", bad), Err(BookError::InvalidYear(_))),
                "{bad:?} should be rejected"
            );
        }
        let book = NewBook::parse("A", "B", "0042").unwrap();
        assert_eq!(book.year, 42);
    }

    #[test]
    fn oversized_year_is_a_validation_error() {
        let err = NewBook::parse("A", "B", "99999999999999999999999").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn field_columns_line_up_with_grid() {
        for field in BookField::ALL {
            assert_eq!(BookField::from_column(field.column_index()), Some(field));
        }
        assert_eq!(BookField::from_column(0), None);
        assert_eq!(BookField::Year.next(), None);
        assert_eq!(BookField::Title.next(), Some(BookField::Author));
    }

    #[test]
    fn parse_value_trims_and_checks_year() {
        assert_eq!(
            BookField::Title.parse_value("  Dune  "),
            Ok(FieldValue::Text("Dune".into()))
        );
        assert_eq!(BookField::Author.parse_value("   "), Err(BookError::EmptyValue));
        assert_eq!(BookField::Year.parse_value(" 1965 "), Ok(FieldValue::Year(1965)));
        assert!(BookField::Year.parse_value("soon").is_err());
    }

    #[test]
    fn cell_text_follows_column_order() {
        let book = Book {
            id: 7,
            title: "Dune".into(),
            author: "Herbert".into(),
            year: 1965,
        };
        let cells: Vec<String> = (0..4).map(|c| book.cell(c)).collect();
        assert_eq!(cells, ["7", "Dune", "Herbert", "1965"]);
    }
}
