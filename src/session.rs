//! Explicit session state for the interactive controller.
//!
//! A session is an ordinary value created by a successful authentication and
//! dropped on logout. The menu loop owns it and passes it to the operations
//! that need the caller's identity; there is no ambient session state.

/// An authenticated identity and its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// The built-in librarian identity.
    Librarian,
    /// A session bound to a registered member.
    Member {
        /// The authenticated member's ID.
        id: String,
        /// The authenticated member's display name.
        name: String,
    },
}
