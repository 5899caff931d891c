//! Domain operations over the record store.
//!
//! Every operation follows the same shape: load the relevant collection(s)
//! in full, validate, mutate in memory, save in full. Failures are reported
//! as [`Error`] values and never terminate the process; only storage and
//! hashing faults propagate past the menu loop.

use chrono::{Local, NaiveDate};

use crate::{
    credential::{self, Scheme},
    domain::{Book, Loan, Member},
    session::Session,
    storage::{self, Store},
};

/// Username of the built-in librarian identity.
///
/// A demo-only placeholder: the librarian is a single static account compared
/// by exact match, not a record in the member roster.
pub const LIBRARIAN_USERNAME: &str = "admin";

/// Password of the built-in librarian identity.
pub const LIBRARIAN_PASSWORD: &str = "admin";

/// A domain operation failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record with this key already exists.
    #[error("{0} already exists")]
    DuplicateKey(String),

    /// No record matches this key.
    #[error("{0} not found")]
    NotFound(String),

    /// An input value does not parse as required.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Inputs are individually well-formed but mutually inconsistent.
    #[error("{0}")]
    Validation(String),

    /// Every copy of the book is already on loan.
    #[error("no copies of {0} are available")]
    NoCopiesAvailable(String),

    /// The loan has already been returned.
    #[error("loan {0} was already returned")]
    AlreadyReturned(String),

    /// Authentication failed.
    #[error("bad credentials")]
    BadCredential,

    /// A record file could not be read or written.
    #[error(transparent)]
    Store(#[from] storage::Error),

    /// The password could not be hashed.
    #[error(transparent)]
    Credential(#[from] credential::Error),
}

impl Error {
    /// Whether the menu loop can report this failure and carry on.
    ///
    /// Storage and hashing faults are environmental and propagate; everything
    /// else is recovered at the prompt.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Credential(_))
    }
}

/// Parses a copy count entered at the prompt.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the input is not a non-negative
/// integer.
pub fn parse_copies(input: &str) -> Result<u32, Error> {
    input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{input:?} is not a non-negative integer")))
}

/// Authenticates the built-in librarian identity.
///
/// # Errors
///
/// Returns [`Error::BadCredential`] unless both the username and password
/// match the static account exactly.
pub fn authenticate_librarian(username: &str, password: &str) -> Result<Session, Error> {
    if username == LIBRARIAN_USERNAME && password == LIBRARIAN_PASSWORD {
        Ok(Session::Librarian)
    } else {
        tracing::debug!("librarian authentication rejected for {username:?}");
        Err(Error::BadCredential)
    }
}

/// The library's catalogue, roster, and loan ledger.
///
/// Wraps a [`Store`] and implements every mutation and query of the system.
/// Operations that depend on the calendar have `*_on` forms taking the date
/// explicitly; the undated forms use the local calendar date.
#[derive(Debug)]
pub struct Library {
    store: Store,
    scheme: Scheme,
}

impl Library {
    /// Opens the library over the given store, hashing new passwords with
    /// the default scheme.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self::with_scheme(store, Scheme::default())
    }

    /// Opens the library with an explicit credential scheme.
    #[must_use]
    pub const fn with_scheme(store: Store, scheme: Scheme) -> Self {
        Self { store, scheme }
    }

    /// Access to the underlying record store.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Adds a new book to the catalogue with all copies available.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DuplicateKey`] if the ISBN is already catalogued.
    pub fn add_book(
        &self,
        isbn: &str,
        title: &str,
        author: &str,
        copies_total: u32,
    ) -> Result<Book, Error> {
        let mut books = self.store.load_books()?;
        if books.iter().any(|book| book.isbn == isbn) {
            return Err(Error::DuplicateKey(format!("ISBN {isbn}")));
        }

        let book = Book::new(isbn, title, author, copies_total);
        books.push(book.clone());
        self.store.save_books(&books)?;
        Ok(book)
    }

    /// Removes a book from the catalogue.
    ///
    /// Outstanding loans referencing the ISBN are left in place; returning
    /// one later records the return without adjusting any copy count.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if the ISBN is not catalogued.
    pub fn remove_book(&self, isbn: &str) -> Result<(), Error> {
        let mut books = self.store.load_books()?;
        let before = books.len();
        books.retain(|book| book.isbn != isbn);
        if books.len() == before {
            return Err(Error::NotFound(format!("ISBN {isbn}")));
        }
        Ok(self.store.save_books(&books)?)
    }

    /// Registers a new member, joining today.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DuplicateKey`] if the member ID is taken, or
    /// [`Error::Validation`] if the passwords do not match.
    pub fn register_member(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Member, Error> {
        self.register_member_on(id, name, email, password, confirm, today())
    }

    /// Registers a new member with an explicit join date.
    ///
    /// # Errors
    ///
    /// See [`Self::register_member`].
    pub fn register_member_on(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password: &str,
        confirm: &str,
        joined: NaiveDate,
    ) -> Result<Member, Error> {
        let mut members = self.store.load_members()?;
        if members.iter().any(|member| member.id == id) {
            return Err(Error::DuplicateKey(format!("member {id}")));
        }
        if password != confirm {
            return Err(Error::Validation("passwords do not match".into()));
        }

        let hash = credential::hash(self.scheme, password)?;
        let member = Member::new(id, name, hash, email, joined);
        members.push(member.clone());
        self.store.save_members(&members)?;
        Ok(member)
    }

    /// Authenticates a member and returns a session bound to their identity.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if the member ID is unknown, or
    /// [`Error::BadCredential`] if the password does not verify.
    pub fn authenticate_member(&self, id: &str, password: &str) -> Result<Session, Error> {
        let members = self.store.load_members()?;
        let member = members
            .iter()
            .find(|member| member.id == id)
            .ok_or_else(|| Error::NotFound(format!("member {id}")))?;

        if credential::verify(password, &member.password_hash) {
            Ok(Session::Member {
                id: member.id.clone(),
                name: member.name.clone(),
            })
        } else {
            tracing::debug!("password verification failed for member {id:?}");
            Err(Error::BadCredential)
        }
    }

    /// Issues a book to a member, due back in
    /// [`crate::domain::LOAN_PERIOD_DAYS`] days.
    ///
    /// # Errors
    ///
    /// See [`Self::issue_loan_on`].
    pub fn issue_loan(&self, isbn: &str, member_id: &str) -> Result<Loan, Error> {
        self.issue_loan_on(isbn, member_id, today())
    }

    /// Issues a book as of an explicit date.
    ///
    /// Appends an outstanding loan and decrements the book's available
    /// count, keeping the two collections consistent.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if the book or member is absent, or
    /// [`Error::NoCopiesAvailable`] if every copy is already on loan.
    pub fn issue_loan_on(
        &self,
        isbn: &str,
        member_id: &str,
        issued: NaiveDate,
    ) -> Result<Loan, Error> {
        let mut books = self.store.load_books()?;
        let members = self.store.load_members()?;
        let mut loans = self.store.load_loans()?;

        let book = books
            .iter_mut()
            .find(|book| book.isbn == isbn)
            .ok_or_else(|| Error::NotFound(format!("ISBN {isbn}")))?;
        if !book.has_available_copy() {
            return Err(Error::NoCopiesAvailable(isbn.to_string()));
        }
        if !members.iter().any(|member| member.id == member_id) {
            return Err(Error::NotFound(format!("member {member_id}")));
        }

        let loan = Loan::issue(member_id, isbn, issued);
        loans.push(loan.clone());
        book.copies_available -= 1;

        self.store.save_loans(&loans)?;
        self.store.save_books(&books)?;
        Ok(loan)
    }

    /// Records the return of a loan as of today.
    ///
    /// # Errors
    ///
    /// See [`Self::return_loan_on`].
    pub fn return_loan(&self, identifier: &str) -> Result<Loan, Error> {
        self.return_loan_on(identifier, today())
    }

    /// Records the return of a loan as of an explicit date.
    ///
    /// The identifier is either a loan ID or a whitespace-separated
    /// `"member-id isbn"` pair. A loan ID match is tried first; failing
    /// that, a two-token identifier selects the first outstanding loan for
    /// that member and ISBN, in collection order.
    ///
    /// The corresponding book's available count is incremented, unless the
    /// book has since been removed from the catalogue.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if no loan resolves, or
    /// [`Error::AlreadyReturned`] if the resolved loan has a return date.
    pub fn return_loan_on(&self, identifier: &str, returned: NaiveDate) -> Result<Loan, Error> {
        let mut loans = self.store.load_loans()?;
        let mut books = self.store.load_books()?;

        let position = loans
            .iter()
            .position(|loan| loan.id == identifier)
            .or_else(|| {
                let tokens: Vec<&str> = identifier.split_whitespace().collect();
                let [member_id, isbn] = tokens[..] else {
                    return None;
                };
                loans.iter().position(|loan| {
                    loan.member_id == member_id && loan.isbn == isbn && loan.is_outstanding()
                })
            })
            .ok_or_else(|| Error::NotFound(format!("loan {identifier}")))?;

        let loan = &mut loans[position];
        if loan.return_date.is_some() {
            return Err(Error::AlreadyReturned(loan.id.clone()));
        }
        loan.return_date = Some(returned);
        let loan = loan.clone();

        if let Some(book) = books.iter_mut().find(|book| book.isbn == loan.isbn) {
            book.copies_available += 1;
        } else {
            tracing::debug!("book {} no longer catalogued, skipping restock", loan.isbn);
        }

        self.store.save_loans(&loans)?;
        self.store.save_books(&books)?;
        Ok(loan)
    }

    /// All outstanding loans due strictly before today, in collection order.
    ///
    /// # Errors
    ///
    /// Returns an error if the loan file cannot be read.
    pub fn overdue_loans(&self) -> Result<Vec<Loan>, Error> {
        self.overdue_loans_on(today())
    }

    /// All outstanding loans due strictly before the given date.
    ///
    /// # Errors
    ///
    /// Returns an error if the loan file cannot be read.
    pub fn overdue_loans_on(&self, today: NaiveDate) -> Result<Vec<Loan>, Error> {
        let loans = self.store.load_loans()?;
        Ok(loans
            .into_iter()
            .filter(|loan| loan.is_overdue(today))
            .collect())
    }

    /// Books whose title or author contains the keyword, case-insensitively,
    /// in collection order. An empty keyword matches the whole catalogue.
    ///
    /// # Errors
    ///
    /// Returns an error if the book file cannot be read.
    pub fn search_catalog(&self, keyword: &str) -> Result<Vec<Book>, Error> {
        let books = self.store.load_books()?;
        Ok(books
            .into_iter()
            .filter(|book| book.matches_keyword(keyword))
            .collect())
    }

    /// All loans held by a member, in collection order.
    ///
    /// # Errors
    ///
    /// Returns an error if the loan file cannot be read.
    pub fn loans_for(&self, member_id: &str) -> Result<Vec<Loan>, Error> {
        let loans = self.store.load_loans()?;
        Ok(loans
            .into_iter()
            .filter(|loan| loan.member_id == member_id)
            .collect())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::{Error, Library, authenticate_librarian, parse_copies};
    use crate::{
        domain::{LOAN_PERIOD_DAYS, Member},
        session::Session,
        storage::Store,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn library() -> (tempfile::TempDir, Library) {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::new(Store::new(dir.path().join("data")));
        (dir, library)
    }

    fn member(id: &str, name: &str) -> Member {
        // Placeholder hash; tests that authenticate register for real.
        Member::new(id, name, "pbkdf2$fake$salthash", "a@b.com", date(2024, 1, 1))
    }

    /// A library with one book ("111", 2 copies) and one member ("M1").
    fn stocked_library() -> (tempfile::TempDir, Library) {
        let (dir, library) = library();
        library.add_book("111", "Clean Code", "Robert C. Martin", 2).unwrap();
        library.store().save_members(&[member("M1", "Ananya")]).unwrap();
        (dir, library)
    }

    #[test]
    fn add_book_persists_with_all_copies_available() {
        let (_dir, library) = library();

        library.add_book("111", "T", "A", 2).unwrap();

        let books = library.store().load_books().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].copies_total, 2);
        assert_eq!(books[0].copies_available, 2);
    }

    #[test]
    fn add_book_rejects_duplicate_isbn() {
        let (_dir, library) = library();
        library.add_book("111", "T", "A", 2).unwrap();

        let error = library.add_book("111", "Other", "B", 1).unwrap_err();
        assert!(matches!(error, Error::DuplicateKey(_)));
        assert_eq!(library.store().load_books().unwrap().len(), 1);
    }

    #[test]
    fn parse_copies_accepts_non_negative_integers_only() {
        assert_eq!(parse_copies(" 3 ").unwrap(), 3);
        assert!(matches!(parse_copies("three"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_copies("-1"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_copies("2.5"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn remove_book_deletes_the_record() {
        let (_dir, library) = stocked_library();

        library.remove_book("111").unwrap();

        assert_eq!(library.store().load_books().unwrap(), vec![]);
        assert!(matches!(
            library.remove_book("111"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn register_member_rejects_duplicate_id_and_password_mismatch() {
        let (_dir, library) = stocked_library();

        assert!(matches!(
            library.register_member_on("M1", "X", "x@y.z", "pw", "pw", date(2024, 1, 2)),
            Err(Error::DuplicateKey(_))
        ));
        assert!(matches!(
            library.register_member_on("M2", "X", "x@y.z", "pw", "other", date(2024, 1, 2)),
            Err(Error::Validation(_))
        ));
        assert_eq!(library.store().load_members().unwrap().len(), 1);
    }

    #[test]
    fn member_authentication_round_trips() {
        let (_dir, library) = library();
        library
            .register_member_on("M1", "Ananya", "a@b.com", "pw", "pw", date(2024, 1, 1))
            .unwrap();

        let session = library.authenticate_member("M1", "pw").unwrap();
        assert_eq!(
            session,
            Session::Member {
                id: "M1".into(),
                name: "Ananya".into(),
            }
        );

        assert!(matches!(
            library.authenticate_member("M1", "wrong"),
            Err(Error::BadCredential)
        ));
        assert!(matches!(
            library.authenticate_member("M9", "pw"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn librarian_authentication_requires_the_exact_static_identity() {
        assert_eq!(
            authenticate_librarian("admin", "admin").unwrap(),
            Session::Librarian
        );
        assert!(matches!(
            authenticate_librarian("admin", "wrong"),
            Err(Error::BadCredential)
        ));
        assert!(matches!(
            authenticate_librarian("root", "admin"),
            Err(Error::BadCredential)
        ));
    }

    #[test]
    fn issue_creates_an_outstanding_loan_and_decrements_availability() {
        let (_dir, library) = stocked_library();
        let today = date(2024, 3, 1);

        let loan = library.issue_loan_on("111", "M1", today).unwrap();

        assert_eq!(loan.issue_date, today);
        assert_eq!(loan.due_date, today + Days::new(LOAN_PERIOD_DAYS));
        assert!(loan.is_outstanding());

        let books = library.store().load_books().unwrap();
        assert_eq!(books[0].copies_available, 1);
        assert_eq!(library.store().load_loans().unwrap(), vec![loan]);
    }

    #[test]
    fn issue_rejects_unknown_book_and_unknown_member() {
        let (_dir, library) = stocked_library();

        assert!(matches!(
            library.issue_loan_on("999", "M1", date(2024, 3, 1)),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            library.issue_loan_on("111", "M9", date(2024, 3, 1)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn issue_with_no_copies_left_fails_and_leaves_storage_unchanged() {
        let (_dir, library) = stocked_library();
        let today = date(2024, 3, 1);
        library.issue_loan_on("111", "M1", today).unwrap();
        library.issue_loan_on("111", "M1", today).unwrap();

        let books_before = library.store().load_books().unwrap();
        let loans_before = library.store().load_loans().unwrap();

        let error = library.issue_loan_on("111", "M1", today).unwrap_err();
        assert!(matches!(error, Error::NoCopiesAvailable(_)));

        assert_eq!(library.store().load_books().unwrap(), books_before);
        assert_eq!(library.store().load_loans().unwrap(), loans_before);
    }

    #[test]
    fn return_by_loan_id_restocks_the_book() {
        let (_dir, library) = stocked_library();
        let loan = library.issue_loan_on("111", "M1", date(2024, 3, 1)).unwrap();

        let returned = library.return_loan_on(&loan.id, date(2024, 3, 5)).unwrap();

        assert_eq!(returned.return_date, Some(date(2024, 3, 5)));
        assert_eq!(
            library.store().load_books().unwrap()[0].copies_available,
            2
        );
    }

    #[test]
    fn return_resolves_member_and_isbn_pairs_against_outstanding_loans() {
        let (_dir, library) = stocked_library();
        library.issue_loan_on("111", "M1", date(2024, 3, 1)).unwrap();

        let returned = library.return_loan_on("M1 111", date(2024, 3, 5)).unwrap();

        assert_eq!(returned.return_date, Some(date(2024, 3, 5)));
        assert_eq!(
            library.store().load_books().unwrap()[0].copies_available,
            2
        );

        // The pair form only matches outstanding loans, so a second return
        // through it no longer resolves.
        assert!(matches!(
            library.return_loan_on("M1 111", date(2024, 3, 6)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn returning_twice_by_id_fails_without_a_second_restock() {
        let (_dir, library) = stocked_library();
        let loan = library.issue_loan_on("111", "M1", date(2024, 3, 1)).unwrap();
        library.return_loan_on(&loan.id, date(2024, 3, 5)).unwrap();

        let error = library.return_loan_on(&loan.id, date(2024, 3, 6)).unwrap_err();

        assert!(matches!(error, Error::AlreadyReturned(_)));
        let loans = library.store().load_loans().unwrap();
        assert_eq!(loans[0].return_date, Some(date(2024, 3, 5)));
        assert_eq!(
            library.store().load_books().unwrap()[0].copies_available,
            2
        );
    }

    #[test]
    fn returning_a_loan_for_a_removed_book_still_records_the_return() {
        let (_dir, library) = stocked_library();
        let loan = library.issue_loan_on("111", "M1", date(2024, 3, 1)).unwrap();
        library.remove_book("111").unwrap();

        let returned = library.return_loan_on(&loan.id, date(2024, 3, 5)).unwrap();

        assert_eq!(returned.return_date, Some(date(2024, 3, 5)));
        assert_eq!(library.store().load_books().unwrap(), vec![]);
    }

    #[test]
    fn available_copies_equal_total_minus_outstanding_loans() {
        let (_dir, library) = stocked_library();
        let today = date(2024, 3, 1);

        let first = library.issue_loan_on("111", "M1", today).unwrap();
        library.issue_loan_on("111", "M1", today).unwrap();
        library.return_loan_on(&first.id, date(2024, 3, 2)).unwrap();

        let book = &library.store().load_books().unwrap()[0];
        let outstanding = library
            .store()
            .load_loans()
            .unwrap()
            .iter()
            .filter(|loan| loan.isbn == book.isbn && loan.is_outstanding())
            .count();
        assert_eq!(
            book.copies_available,
            book.copies_total - u32::try_from(outstanding).unwrap()
        );
    }

    #[test]
    fn overdue_report_includes_only_outstanding_loans_past_due() {
        let (_dir, library) = stocked_library();
        let today = date(2024, 3, 20);

        // Due 2024-03-19 (yesterday relative to `today`), still outstanding.
        let issued = today - Days::new(LOAN_PERIOD_DAYS + 1);
        let overdue = library.issue_loan_on("111", "M1", issued).unwrap();
        // Same due date, but already returned.
        let returned = library.issue_loan_on("111", "M1", issued).unwrap();
        library.return_loan_on(&returned.id, today).unwrap();

        let report = library.overdue_loans_on(today).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, overdue.id);
    }

    #[test]
    fn loans_due_today_are_not_overdue() {
        let (_dir, library) = stocked_library();
        let today = date(2024, 3, 15);
        library
            .issue_loan_on("111", "M1", today - Days::new(LOAN_PERIOD_DAYS))
            .unwrap();

        assert_eq!(library.overdue_loans_on(today).unwrap(), vec![]);
    }

    #[test]
    fn search_is_case_insensitive_and_empty_keyword_matches_all() {
        let (_dir, library) = stocked_library();
        library.add_book("222", "Refactoring", "Martin Fowler", 1).unwrap();

        let hits = library.search_catalog("MARTIN").unwrap();
        assert_eq!(hits.len(), 2);

        let hits = library.search_catalog("clean").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].isbn, "111");

        assert_eq!(library.search_catalog("").unwrap().len(), 2);
        assert_eq!(library.search_catalog("dijkstra").unwrap(), vec![]);
    }

    #[test]
    fn loans_for_returns_only_that_members_loans() {
        let (_dir, library) = stocked_library();
        library
            .store()
            .save_members(&[member("M1", "Ananya"), member("M2", "Björn")])
            .unwrap();
        library.issue_loan_on("111", "M1", date(2024, 3, 1)).unwrap();
        library.issue_loan_on("111", "M2", date(2024, 3, 2)).unwrap();

        let mine = library.loans_for("M1").unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].member_id, "M1");
        assert_eq!(library.loans_for("M3").unwrap(), vec![]);
    }
}
