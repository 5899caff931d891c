/// A title held by the library.
///
/// A book tracks how many physical copies the library owns and how many are
/// currently on the shelf. The two counts are kept consistent by the issue
/// and return operations: `copies_available` equals `copies_total` minus the
/// number of outstanding loans against this ISBN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Unique key for the book within the catalogue.
    pub isbn: String,
    /// Title of the book.
    pub title: String,
    /// Author of the book.
    pub author: String,
    /// Number of physical copies the library owns.
    pub copies_total: u32,
    /// Number of copies currently on the shelf.
    ///
    /// Always in `0..=copies_total`.
    pub copies_available: u32,
}

impl Book {
    /// Construct a new book with all copies on the shelf.
    #[must_use]
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        copies_total: u32,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            copies_total,
            copies_available: copies_total,
        }
    }

    /// Whether at least one copy is on the shelf.
    #[must_use]
    pub const fn has_available_copy(&self) -> bool {
        self.copies_available > 0
    }

    /// Case-insensitive substring match against title or author.
    ///
    /// An empty keyword matches every book.
    #[must_use]
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.title.to_lowercase().contains(&keyword)
            || self.author.to_lowercase().contains(&keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::Book;

    #[test]
    fn new_book_has_all_copies_available() {
        let book = Book::new("111", "Title", "Author", 3);
        assert_eq!(book.copies_total, 3);
        assert_eq!(book.copies_available, 3);
    }

    #[test]
    fn keyword_matches_title_and_author_case_insensitively() {
        let book = Book::new("111", "Clean Code", "Robert C. Martin", 1);
        assert!(book.matches_keyword("clean"));
        assert!(book.matches_keyword("MARTIN"));
        assert!(!book.matches_keyword("refactoring"));
    }

    #[test]
    fn empty_keyword_matches_everything() {
        let book = Book::new("111", "Clean Code", "Robert C. Martin", 1);
        assert!(book.matches_keyword(""));
    }
}
