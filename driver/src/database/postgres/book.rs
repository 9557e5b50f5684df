use sqlx::PgConnection;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use kernel::interface::query::{BookFilter, BookOrder, BookOrderKey, BookQuery};
use kernel::interface::update::BookModifier;
use kernel::prelude::entity::{
    Book, BookAuthor, BookCopies, BookDescription, BookId, BookIsbn, BookPageCount,
    BookPublicationDate, BookPublisher, BookTitle, CreatedAt, SelectLimit, SelectOffset,
    UpdatedAt,
};
use kernel::KernelError;

use crate::database::postgres::{like_pattern, PostgresTransaction};
use crate::error::ConvertError;

pub struct PostgresBookRepository;

#[async_trait::async_trait]
impl BookQuery for PostgresBookRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::find_by_id(con, id, false).await
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut PostgresTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::find_by_id(con, id, true).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresTransaction,
        filter: &BookFilter,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        PgBookInternal::find_all(con, filter, limit, offset).await
    }
}

#[async_trait::async_trait]
impl BookModifier for PostgresBookRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        PgBookInternal::create(con, book).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        PgBookInternal::update(con, book).await
    }

    async fn delete(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        PgBookInternal::delete(con, book_id).await
    }

    async fn take_copy(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<bool, KernelError> {
        PgBookInternal::take_copy(con, book_id).await
    }

    async fn restore_copy(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<bool, KernelError> {
        PgBookInternal::restore_copy(con, book_id).await
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    author: String,
    isbn: String,
    page_count: i32,
    publisher: String,
    publication_date: Option<Date>,
    description: String,
    available_copies: i32,
    total_copies: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<BookRow> for Book {
    type Error = error_stack::Report<KernelError>;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let copies = BookCopies::new(row.available_copies, row.total_copies)
            .map_err(|report| report.change_context(KernelError::Internal))?;
        Ok(Book::new(
            BookId::new(row.id),
            BookTitle::new(row.title),
            BookAuthor::new(row.author),
            BookIsbn::new(row.isbn),
            BookPageCount::new(row.page_count),
            BookPublisher::new(row.publisher),
            row.publication_date.map(BookPublicationDate::new),
            BookDescription::new(row.description),
            copies,
            CreatedAt::new(row.created_at),
            UpdatedAt::new(row.updated_at),
        ))
    }
}

/// Only fixed column names reach the SQL text.
fn order_clause(order: Option<BookOrder>) -> &'static str {
    let Some(order) = order else {
        return "created_at DESC";
    };
    match (order.key, order.descending) {
        (BookOrderKey::Title, false) => "title ASC, created_at DESC",
        (BookOrderKey::Title, true) => "title DESC, created_at DESC",
        (BookOrderKey::Author, false) => "author ASC, created_at DESC",
        (BookOrderKey::Author, true) => "author DESC, created_at DESC",
        (BookOrderKey::AvailableCopies, false) => "available_copies ASC, created_at DESC",
        (BookOrderKey::AvailableCopies, true) => "available_copies DESC, created_at DESC",
    }
}

pub(in crate::database) struct PgBookInternal;

impl PgBookInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BookId,
        lock: bool,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let query = if lock {
            // language=postgresql
            r#"
            SELECT id, title, author, isbn, page_count, publisher, publication_date, description,
                   available_copies, total_copies, created_at, updated_at
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#
        } else {
            // language=postgresql
            r#"
            SELECT id, title, author, isbn, page_count, publisher, publication_date, description,
                   available_copies, total_copies, created_at, updated_at
            FROM books
            WHERE id = $1
            "#
        };
        let row = sqlx::query_as::<_, BookRow>(query)
            .bind(id.as_ref())
            .fetch_optional(con)
            .await
            .convert_error()?;
        row.map(Book::try_from).transpose()
    }

    async fn find_all(
        con: &mut PgConnection,
        filter: &BookFilter,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let query = format!(
            // language=postgresql
            r#"
            SELECT id, title, author, isbn, page_count, publisher, publication_date, description,
                   available_copies, total_copies, created_at, updated_at
            FROM books
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR author ILIKE $2)
              AND ($3::text IS NULL OR isbn = $3)
              AND ($4::text IS NULL
                   OR title ILIKE $4 OR author ILIKE $4 OR isbn ILIKE $4 OR description ILIKE $4)
              AND (NOT $5 OR available_copies > 0)
            ORDER BY {}
            LIMIT $6 OFFSET $7
            "#,
            order_clause(filter.order)
        );
        let rows = sqlx::query_as::<_, BookRow>(&query)
        .bind(filter.title.as_deref().map(like_pattern))
        .bind(filter.author.as_deref().map(like_pattern))
        .bind(filter.isbn.as_deref())
        .bind(filter.search.as_deref().map(like_pattern))
        .bind(filter.available_only)
        .bind(i64::from(*limit.as_ref()))
        .bind(i64::from(*offset.as_ref()))
        .fetch_all(con)
        .await
        .convert_error()?;
        rows.into_iter().map(Book::try_from).collect()
    }

    async fn create(con: &mut PgConnection, book: &Book) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, isbn, page_count, publisher, publication_date,
                               description, available_copies, total_copies, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(book.id().as_ref())
        .bind(book.title().as_ref())
        .bind(book.author().as_ref())
        .bind(book.isbn().as_ref())
        .bind(book.page_count().as_ref())
        .bind(book.publisher().as_ref())
        .bind(book.publication_date().as_ref().map(|date| *date.as_ref()))
        .bind(book.description().as_ref())
        .bind(book.copies().available())
        .bind(book.copies().total())
        .bind(book.created_at().as_ref())
        .bind(book.updated_at().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(con: &mut PgConnection, book: &Book) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3, isbn = $4, page_count = $5, publisher = $6,
                publication_date = $7, description = $8, available_copies = $9,
                total_copies = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(book.id().as_ref())
        .bind(book.title().as_ref())
        .bind(book.author().as_ref())
        .bind(book.isbn().as_ref())
        .bind(book.page_count().as_ref())
        .bind(book.publisher().as_ref())
        .bind(book.publication_date().as_ref().map(|date| *date.as_ref()))
        .bind(book.description().as_ref())
        .bind(book.copies().available())
        .bind(book.copies().total())
        .bind(book.updated_at().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn delete(con: &mut PgConnection, book_id: &BookId) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            DELETE FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn take_copy(con: &mut PgConnection, book_id: &BookId) -> error_stack::Result<bool, KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = now()
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(book_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() == 1)
    }

    async fn restore_copy(
        con: &mut PgConnection,
        book_id: &BookId,
    ) -> error_stack::Result<bool, KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = now()
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(book_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() == 1)
    }
}
