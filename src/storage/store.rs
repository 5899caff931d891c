//! A flat-file backed store of library records.
//!
//! The [`Store`] owns a data directory holding one file per record kind.
//! Loading a kind reads its whole file in order; saving rewrites the whole
//! file, header row first. A missing file is an empty collection, not an
//! error.

use std::{fs, io, path::PathBuf};

use chrono::NaiveDate;

use super::csv::{self, ParseError};
use crate::domain::{Book, Loan, Member};

/// A flat-file backed store of library records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// The directory the record files are stored in.
    root: PathBuf,
}

/// A record file could not be read, parsed, or written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying file could not be read or written.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The file could not be framed into rows.
    #[error("{file}: {source}")]
    Parse {
        /// Name of the offending record file.
        file: &'static str,
        /// The framing failure.
        source: ParseError,
    },

    /// The header row does not match the expected field names.
    #[error("{file}: expected header {expected:?}, found {found:?}")]
    Header {
        /// Name of the offending record file.
        file: &'static str,
        /// The field names the file should declare.
        expected: &'static [&'static str],
        /// The field names the file actually declares.
        found: Vec<String>,
    },

    /// A data row could not be converted into a record.
    #[error("{file}, line {line}: {message}")]
    Malformed {
        /// Name of the offending record file.
        file: &'static str,
        /// One-based line number of the bad row.
        line: usize,
        /// What was wrong with the row.
        message: String,
    },
}

/// A record kind with a fixed file name and column order.
pub(crate) trait TabularRecord: Sized {
    const FILE_NAME: &'static str;
    const FIELDS: &'static [&'static str];

    /// Converts a data row into a record. Returns a description of the
    /// problem if the row does not fit the schema.
    fn from_row(row: &[String]) -> Result<Self, String>;

    fn to_row(&self) -> Vec<String>;
}

impl Store {
    /// Opens a store rooted at the given data directory.
    ///
    /// The directory does not need to exist yet; it is created on first save.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Loads all books, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_books(&self) -> Result<Vec<Book>, Error> {
        self.load()
    }

    /// Replaces the book file with the given records.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or file cannot be written.
    pub fn save_books(&self, books: &[Book]) -> Result<(), Error> {
        self.save(books)
    }

    /// Loads all members, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_members(&self) -> Result<Vec<Member>, Error> {
        self.load()
    }

    /// Replaces the member file with the given records.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or file cannot be written.
    pub fn save_members(&self, members: &[Member]) -> Result<(), Error> {
        self.save(members)
    }

    /// Loads all loans, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_loans(&self) -> Result<Vec<Loan>, Error> {
        self.load()
    }

    /// Replaces the loan file with the given records.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or file cannot be written.
    pub fn save_loans(&self, loans: &[Loan]) -> Result<(), Error> {
        self.save(loans)
    }

    fn load<R: TabularRecord>(&self) -> Result<Vec<R>, Error> {
        let path = self.root.join(R::FILE_NAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist yet, loading empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut rows = csv::parse(&content)
            .map_err(|source| Error::Parse {
                file: R::FILE_NAME,
                source,
            })?
            .into_iter();

        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };
        if header.iter().map(String::as_str).ne(R::FIELDS.iter().copied()) {
            return Err(Error::Header {
                file: R::FILE_NAME,
                expected: R::FIELDS,
                found: header,
            });
        }

        rows.enumerate()
            .map(|(i, row)| {
                R::from_row(&row).map_err(|message| Error::Malformed {
                    file: R::FILE_NAME,
                    line: i + 2,
                    message,
                })
            })
            .collect()
    }

    fn save<R: TabularRecord>(&self, records: &[R]) -> Result<(), Error> {
        fs::create_dir_all(&self.root)?;

        let mut out = String::new();
        csv::write_row(&mut out, R::FIELDS);
        for record in records {
            csv::write_row(&mut out, &record.to_row());
        }

        let path = self.root.join(R::FILE_NAME);
        tracing::debug!("writing {} records to {}", records.len(), path.display());
        fs::write(path, out)?;
        Ok(())
    }
}

fn parse_count(field: &str, name: &str) -> Result<u32, String> {
    field
        .parse()
        .map_err(|_| format!("{name} {field:?} is not a non-negative integer"))
}

fn parse_date(field: &str, name: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(field, "%Y-%m-%d")
        .map_err(|_| format!("{name} {field:?} is not a YYYY-MM-DD date"))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn check_width(row: &[String], expected: usize) -> Result<(), String> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} fields, found {}", row.len()))
    }
}

impl TabularRecord for Book {
    const FILE_NAME: &'static str = "books.csv";
    const FIELDS: &'static [&'static str] =
        &["ISBN", "Title", "Author", "CopiesTotal", "CopiesAvailable"];

    fn from_row(row: &[String]) -> Result<Self, String> {
        check_width(row, Self::FIELDS.len())?;
        Ok(Self {
            isbn: row[0].clone(),
            title: row[1].clone(),
            author: row[2].clone(),
            copies_total: parse_count(&row[3], "CopiesTotal")?,
            copies_available: parse_count(&row[4], "CopiesAvailable")?,
        })
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.isbn.clone(),
            self.title.clone(),
            self.author.clone(),
            self.copies_total.to_string(),
            self.copies_available.to_string(),
        ]
    }
}

impl TabularRecord for Member {
    const FILE_NAME: &'static str = "members.csv";
    const FIELDS: &'static [&'static str] =
        &["MemberID", "Name", "PasswordHash", "Email", "JoinDate"];

    fn from_row(row: &[String]) -> Result<Self, String> {
        check_width(row, Self::FIELDS.len())?;
        Ok(Self {
            id: row[0].clone(),
            name: row[1].clone(),
            password_hash: row[2].clone(),
            email: row[3].clone(),
            join_date: parse_date(&row[4], "JoinDate")?,
        })
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.password_hash.clone(),
            self.email.clone(),
            format_date(self.join_date),
        ]
    }
}

impl TabularRecord for Loan {
    const FILE_NAME: &'static str = "loans.csv";
    const FIELDS: &'static [&'static str] = &[
        "LoanID",
        "MemberID",
        "ISBN",
        "IssueDate",
        "DueDate",
        "ReturnDate",
    ];

    fn from_row(row: &[String]) -> Result<Self, String> {
        check_width(row, Self::FIELDS.len())?;
        let return_date = if row[5].is_empty() {
            None
        } else {
            Some(parse_date(&row[5], "ReturnDate")?)
        };
        Ok(Self {
            id: row[0].clone(),
            member_id: row[1].clone(),
            isbn: row[2].clone(),
            issue_date: parse_date(&row[3], "IssueDate")?,
            due_date: parse_date(&row[4], "DueDate")?,
            return_date,
        })
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.member_id.clone(),
            self.isbn.clone(),
            format_date(self.issue_date),
            format_date(self.due_date),
            self.return_date.map(format_date).unwrap_or_default(),
        ]
    }
}
