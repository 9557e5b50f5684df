mod copies;
mod detail;
mod id;
mod isbn;
mod title;

pub use self::{copies::*, detail::*, id::*, isbn::*, title::*};
use crate::entity::common::{CreatedAt, UpdatedAt};
use destructure::Destructure;
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure)]
pub struct Book {
    id: BookId,
    title: BookTitle,
    author: BookAuthor,
    isbn: BookIsbn,
    page_count: BookPageCount,
    publisher: BookPublisher,
    publication_date: Option<BookPublicationDate>,
    description: BookDescription,
    copies: BookCopies,
    created_at: CreatedAt<Book>,
    updated_at: UpdatedAt<Book>,
}

impl Book {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BookId,
        title: BookTitle,
        author: BookAuthor,
        isbn: BookIsbn,
        page_count: BookPageCount,
        publisher: BookPublisher,
        publication_date: Option<BookPublicationDate>,
        description: BookDescription,
        copies: BookCopies,
        created_at: CreatedAt<Book>,
        updated_at: UpdatedAt<Book>,
    ) -> Self {
        Self {
            id,
            title,
            author,
            isbn,
            page_count,
            publisher,
            publication_date,
            description,
            copies,
            created_at,
            updated_at,
        }
    }

    pub fn is_available(&self) -> bool {
        self.copies.is_available()
    }
}
