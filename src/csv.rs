//! Minimal comma-separated encoding used by the export feature. Fields that
//! contain a comma, a double quote or a line break are quoted and their quotes
//! doubled; everything else is written verbatim.

use crate::error::BookError;

const SEPARATOR: char = ',';
const QUOTE: char = '"';

/// Encode one record as a line, without the trailing newline.
pub fn encode_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            line.push(SEPARATOR);
        }
        push_field(&mut line, field.as_ref());
    }
    line
}

fn push_field(line: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|ch| matches!(ch, SEPARATOR | QUOTE | '\n' | '\r'));
    if !needs_quotes {
        line.push_str(field);
        return;
    }
    line.push(QUOTE);
    for ch in field.chars() {
        if ch == QUOTE {
            line.push(QUOTE);
        }
        line.push(ch);
    }
    line.push(QUOTE);
}

/// Split CSV text into records. Accepts `\n` or `\r\n` row endings and quoted
/// fields spanning multiple lines. A trailing newline does not produce an
/// empty record.
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>, BookError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();
    // Set once a record has any content, so blank trailing input is skipped.
    let mut dirty = false;

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    field.push(QUOTE);
                }
                QUOTE => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            QUOTE if field.is_empty() => {
                in_quotes = true;
                dirty = true;
            }
            QUOTE => {
                return Err(BookError::InvalidCsv {
                    line,
                    reason: "unexpected quote inside unquoted field".to_string(),
                })
            }
            SEPARATOR => {
                record.push(std::mem::take(&mut field));
                dirty = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if dirty || !field.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                dirty = false;
                line += 1;
            }
            _ => {
                field.push(ch);
                dirty = true;
            }
        }
    }

    if in_quotes {
        return Err(BookError::InvalidCsv {
            line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if dirty || !field.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}
