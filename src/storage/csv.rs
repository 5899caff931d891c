//! Comma-separated framing for the record files.
//!
//! Fields containing a comma, quote, or line break are quoted, with embedded
//! quotes doubled. The parser accepts both `\n` and `\r\n` row endings and
//! skips blank lines.

/// The input could not be framed into rows.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// A quoted field was still open at the end of the input.
    #[error("unterminated quoted field")]
    UnterminatedQuote,

    /// A closing quote was followed by something other than a delimiter or
    /// end of row.
    #[error("unexpected {0:?} after closing quote")]
    TrailingAfterQuote(char),
}

/// Splits the input into rows of fields.
pub(crate) fn parse(input: &str) -> Result<Vec<Vec<String>>, ParseError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        let mut field = String::new();

        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    Some('"') => break,
                    Some(c) => field.push(c),
                    None => return Err(ParseError::UnterminatedQuote),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if matches!(c, ',' | '\r' | '\n') {
                    break;
                }
                chars.next();
                field.push(c);
            }
        }

        match chars.next() {
            Some(',') => row.push(field),
            terminator @ (Some('\r' | '\n') | None) => {
                if terminator == Some('\r') && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(field);
                // A bare line break produces a single empty field; treat it
                // as a blank line, matching the reader the files came from.
                if row.len() > 1 || !row[0].is_empty() {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            Some(c) => return Err(ParseError::TrailingAfterQuote(c)),
        }
    }

    // A comma as the very last character leaves a pending empty field.
    if !row.is_empty() {
        row.push(String::new());
        rows.push(row);
    }

    Ok(rows)
}

/// Appends one row to `out`, quoting fields where needed.
pub(crate) fn write_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let field = field.as_ref();
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            for c in field.chars() {
                if c == '"' {
                    out.push('"');
                }
                out.push(c);
            }
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
