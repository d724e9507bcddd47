//! Domain failures the UI needs to tell apart from storage trouble. Anything
//! listed here is something the user can fix by changing their input, so the
//! shell shows it as a warning instead of a hard error.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("Title is required.")]
    EmptyTitle,
    #[error("Author is required.")]
    EmptyAuthor,
    #[error("Year must be numeric, got '{0}'.")]
    InvalidYear(String),
    #[error("Value must not be blank.")]
    EmptyValue,
    #[error("Book ID {0} not found.")]
    NotFound(i64),
    #[error("CSV line {line}: {reason}")]
    InvalidCsv { line: usize, reason: String },
}

impl BookError {
    /// Whether the error stems from user input rather than stored state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BookError::EmptyTitle
                | BookError::EmptyAuthor
                | BookError::InvalidYear(_)
                | BookError::EmptyValue
        )
    }
}
