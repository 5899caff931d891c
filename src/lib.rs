//! Single-user library management over flat CSV files.
//!
//! A catalogue of books, a roster of members, and a ledger of loans, each
//! persisted as a comma-separated file and rewritten whole on every
//! mutation.

/// One-way password hashing and verification.
pub mod credential;

pub mod domain;
pub use domain::{Book, Loan, Member};

/// Domain operations over the record store.
pub mod service;
pub use service::Library;

pub mod session;
pub use session::Session;

/// Flat-file persistence for the record collections.
pub mod storage;
pub use storage::Store;
