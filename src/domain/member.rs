use chrono::NaiveDate;

/// A registered borrower.
///
/// Members authenticate with a password that is stored only as a
/// method-tagged credential string (see [`crate::credential`]). Members are
/// never mutated or deleted once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Unique key for the member within the roster.
    pub id: String,
    /// Display name of the member.
    pub name: String,
    /// Method-tagged one-way hash of the member's password.
    pub password_hash: String,
    /// Contact email address.
    pub email: String,
    /// Date the member joined the library.
    pub join_date: NaiveDate,
}

impl Member {
    /// Construct a new member record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
        email: impl Into<String>,
        join_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            password_hash: password_hash.into(),
            email: email.into(),
            join_date,
        }
    }
}
