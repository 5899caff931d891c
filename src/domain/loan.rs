use chrono::{Days, NaiveDate};
use uuid::Uuid;

/// Length of the loan period, in calendar days.
pub const LOAN_PERIOD_DAYS: u64 = 14;

/// A single lending of a book to a member.
///
/// A loan is created when a book is issued and mutated exactly once, when it
/// is returned. Loans are never deleted; a loan with no return date is
/// *outstanding*.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    /// Unique, opaque identifier for the loan.
    pub id: String,
    /// The borrowing member.
    pub member_id: String,
    /// The borrowed book.
    pub isbn: String,
    /// Date the loan was created.
    pub issue_date: NaiveDate,
    /// Date the book is due back: issue date plus [`LOAN_PERIOD_DAYS`].
    pub due_date: NaiveDate,
    /// Date the book came back, or `None` while the loan is outstanding.
    ///
    /// Once set, never cleared or changed.
    pub return_date: Option<NaiveDate>,
}

impl Loan {
    /// Create a new outstanding loan issued on the given date.
    ///
    /// A fresh UUID is generated for the loan identifier and the due date is
    /// derived from the issue date.
    #[must_use]
    pub fn issue(member_id: impl Into<String>, isbn: impl Into<String>, issued: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            member_id: member_id.into(),
            isbn: isbn.into(),
            issue_date: issued,
            due_date: issued + Days::new(LOAN_PERIOD_DAYS),
            return_date: None,
        }
    }

    /// Whether the book has not yet come back.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        self.return_date.is_none()
    }

    /// Whether the loan is outstanding and due strictly before `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_outstanding() && self.due_date < today
    }
}
