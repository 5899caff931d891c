//! Domain records for the library catalogue.
//!
//! This module contains the three record kinds persisted by the store:
//! books, members, and loans.

/// Book records and copy accounting.
pub mod book;
pub use book::Book;

/// Member records.
pub mod member;
pub use member::Member;

/// Loan records and the loan period.
pub mod loan;
pub use loan::{LOAN_PERIOD_DAYS, Loan};
