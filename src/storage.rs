//! Flat-file persistence for the record collections.
//!
//! Each record kind lives in its own comma-separated file under the data
//! directory. Files are read and rewritten whole; there is no partial update
//! and no persisted index.

mod csv;
mod store;

pub use csv::ParseError;
pub use store::{Error, Store};
