use time::{Date, OffsetDateTime};
use uuid::Uuid;

use kernel::interface::query::BookOrder;
use kernel::prelude::entity::{Book, DestructBook, SelectLimit, SelectOffset};

#[derive(Debug, Clone)]
pub struct BookDto {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub page_count: i32,
    pub publisher: String,
    pub publication_date: Option<Date>,
    pub description: String,
    pub available_copies: i32,
    pub total_copies: i32,
    pub is_available: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Book> for BookDto {
    fn from(value: Book) -> Self {
        let is_available = value.is_available();
        let DestructBook {
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
        } = value.into_destruct();
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            page_count: page_count.into(),
            publisher: publisher.into(),
            publication_date: publication_date.map(Into::into),
            description: description.into(),
            available_copies: copies.available(),
            total_copies: copies.total(),
            is_available,
            created_at: created_at.into(),
            updated_at: updated_at.into(),
        }
    }
}

#[derive(Debug)]
pub struct GetBookDto {
    pub id: Uuid,
}

#[derive(Debug, Default)]
pub struct GetAllBookDto {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub search: Option<String>,
    pub available_only: bool,
    pub order: Option<BookOrder>,
    pub limit: SelectLimit,
    pub offset: SelectOffset,
}

#[derive(Debug)]
pub struct CreateBookDto {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub page_count: i32,
    pub publisher: String,
    pub publication_date: Option<Date>,
    pub description: String,
    pub available_copies: Option<i32>,
    pub total_copies: i32,
}

#[derive(Debug, Default)]
pub struct UpdateBookDto {
    pub id: Uuid,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub page_count: Option<i32>,
    pub publisher: Option<String>,
    pub publication_date: Option<Date>,
    pub description: Option<String>,
    pub available_copies: Option<i32>,
    pub total_copies: Option<i32>,
}

#[derive(Debug)]
pub struct DeleteBookDto {
    pub id: Uuid,
}
