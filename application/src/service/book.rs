use error_stack::Report;
use tracing::info;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{
    BookFilter, BookQuery, DependOnBookQuery, DependOnLoanQuery, LoanQuery,
};
use kernel::interface::update::{BookModifier, DependOnBookModifier};
use kernel::prelude::entity::{
    stored_now, Book, BookAuthor, BookCopies, BookDescription, BookId, BookIsbn, BookPageCount,
    BookPublicationDate, BookPublisher, BookTitle, CreatedAt, UpdatedAt,
};
use kernel::prelude::policy::{Capability, Operation};
use kernel::KernelError;

use crate::transfer::{BookDto, CreateBookDto, DeleteBookDto, GetAllBookDto, GetBookDto, UpdateBookDto};

#[async_trait::async_trait]
pub trait GetBookService: 'static + Sync + Send + DependOnBookQuery {
    async fn get_book(&self, dto: GetBookDto) -> error_stack::Result<Option<BookDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        let book = self.book_query().find_by_id(&mut connection, &id).await?;

        Ok(book.map(BookDto::from))
    }

    async fn get_books(&self, dto: GetAllBookDto) -> error_stack::Result<Vec<BookDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let filter = BookFilter {
            title: dto.title,
            author: dto.author,
            isbn: dto.isbn,
            search: dto.search,
            available_only: dto.available_only,
            order: dto.order,
        };
        let books = self
            .book_query()
            .find_all(&mut connection, &filter, &dto.limit, &dto.offset)
            .await?;

        Ok(books.into_iter().map(BookDto::from).collect())
    }
}

impl<T> GetBookService for T where T: DependOnBookQuery {}

#[async_trait::async_trait]
pub trait CreateBookService: 'static + Sync + Send + DependOnBookModifier {
    #[tracing::instrument(skip(self))]
    async fn create_book(
        &self,
        actor: &Capability,
        dto: CreateBookDto,
    ) -> error_stack::Result<BookDto, KernelError> {
        actor.authorize(Operation::WriteCatalog)?;

        let copies = match dto.available_copies {
            Some(available) => BookCopies::new(available, dto.total_copies)?,
            None => BookCopies::full(dto.total_copies)?,
        };
        let now = stored_now();
        let book = Book::new(
            BookId::new(Uuid::new_v4()),
            BookTitle::new(dto.title),
            BookAuthor::new(dto.author),
            BookIsbn::new(dto.isbn),
            BookPageCount::new(dto.page_count),
            BookPublisher::new(dto.publisher),
            dto.publication_date.map(BookPublicationDate::new),
            BookDescription::new(dto.description),
            copies,
            CreatedAt::new(now),
            UpdatedAt::new(now),
        );

        let mut connection = self.database_connection().transact().await?;
        self.book_modifier().create(&mut connection, &book).await?;
        connection.commit().await?;

        info!("Book {} added to the catalog", book.id().as_ref());
        Ok(BookDto::from(book))
    }
}

impl<T> CreateBookService for T where T: DependOnBookModifier {}

#[async_trait::async_trait]
pub trait UpdateBookService: 'static + Sync + Send + DependOnBookQuery + DependOnBookModifier {
    /// Applies a partial catalog update. A new total keeps the copies on loan and moves
    /// the free copies by the same amount.
    #[tracing::instrument(skip(self))]
    async fn update_book(
        &self,
        actor: &Capability,
        dto: UpdateBookDto,
    ) -> error_stack::Result<Option<BookDto>, KernelError> {
        actor.authorize(Operation::WriteCatalog)?;

        let mut connection = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        let Some(book) = self
            .book_query()
            .find_by_id_for_update(&mut connection, &id)
            .await?
        else {
            return Ok(None);
        };

        let mut book = book.into_destruct();
        if let Some(total) = dto.total_copies {
            book.copies = book.copies.resize(total)?;
        }
        if let Some(available) = dto.available_copies {
            // Free copies are derived from the open loans and cannot be set apart from them.
            BookCopies::new(available, book.copies.total())?;
            if available != book.copies.available() {
                return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                    "Book {} has {} copies free given its open loans, not {available}",
                    dto.id,
                    book.copies.available()
                )));
            }
        }
        if let Some(title) = dto.title {
            book.title = BookTitle::new(title);
        }
        if let Some(author) = dto.author {
            book.author = BookAuthor::new(author);
        }
        if let Some(isbn) = dto.isbn {
            book.isbn = BookIsbn::new(isbn);
        }
        if let Some(page_count) = dto.page_count {
            book.page_count = BookPageCount::new(page_count);
        }
        if let Some(publisher) = dto.publisher {
            book.publisher = BookPublisher::new(publisher);
        }
        if let Some(date) = dto.publication_date {
            book.publication_date = Some(BookPublicationDate::new(date));
        }
        if let Some(description) = dto.description {
            book.description = BookDescription::new(description);
        }
        book.updated_at = UpdatedAt::new(stored_now());
        let book = book.freeze();

        self.book_modifier().update(&mut connection, &book).await?;
        connection.commit().await?;

        info!(
            "Book {} updated ({} of {} copies available)",
            dto.id,
            book.copies().available(),
            book.copies().total()
        );
        Ok(Some(BookDto::from(book)))
    }
}

impl<T> UpdateBookService for T where T: DependOnBookQuery + DependOnBookModifier {}

#[async_trait::async_trait]
pub trait DeleteBookService:
    'static + Sync + Send + DependOnBookQuery + DependOnBookModifier + DependOnLoanQuery
{
    #[tracing::instrument(skip(self))]
    async fn delete_book(
        &self,
        actor: &Capability,
        dto: DeleteBookDto,
    ) -> error_stack::Result<(), KernelError> {
        actor.authorize(Operation::WriteCatalog)?;

        let mut connection = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        if self
            .book_query()
            .find_by_id_for_update(&mut connection, &id)
            .await?
            .is_none()
        {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("Book {} does not exist", dto.id)));
        }

        let active = self
            .loan_query()
            .count_active_by_book(&mut connection, &id)
            .await?;
        if active > 0 {
            return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                "Book {} still has {active} copies on loan",
                dto.id
            )));
        }

        self.book_modifier().delete(&mut connection, &id).await?;
        connection.commit().await?;

        info!("Book {} removed from the catalog", dto.id);
        Ok(())
    }
}

impl<T> DeleteBookService for T where
    T: DependOnBookQuery + DependOnBookModifier + DependOnLoanQuery
{
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use kernel::interface::query::{BookOrder, BookOrderKey};
    use kernel::prelude::policy::Capability;
    use kernel::KernelError;

    use crate::mock::InMemoryDatabase;
    use crate::service::{
        BorrowService, CreateBookService, DeleteBookService, GetBookService, ReturnService,
        UpdateBookService,
    };
    use crate::transfer::{
        BorrowDto, CreateBookDto, DeleteBookDto, GetAllBookDto, GetBookDto, ReturnDto,
        UpdateBookDto,
    };

    fn create(isbn: &str, total: i32, available: Option<i32>) -> CreateBookDto {
        CreateBookDto {
            title: "The Rust Programming Language".to_string(),
            author: "Steve Klabnik".to_string(),
            isbn: isbn.to_string(),
            page_count: 560,
            publisher: "No Starch Press".to_string(),
            publication_date: None,
            description: "An introduction to Rust".to_string(),
            available_copies: available,
            total_copies: total,
        }
    }

    #[tokio::test]
    async fn create_and_search() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let librarian = db.seed_staff("librarian").await;

        let book = db
            .create_book(&librarian, create("9781718503106", 3, None))
            .await?;
        assert_eq!((book.available_copies, book.total_copies), (3, 3));
        assert!(book.is_available);

        let found = db.get_book(GetBookDto { id: book.id }).await?.unwrap();
        assert_eq!(found.title, "The Rust Programming Language");

        let hits = db
            .get_books(GetAllBookDto {
                search: Some("KLABNIK".to_string()),
                ..Default::default()
            })
            .await?;
        assert_eq!(hits.len(), 1);

        let misses = db
            .get_books(GetAllBookDto {
                isbn: Some("9781718503".to_string()),
                ..Default::default()
            })
            .await?;
        assert!(misses.is_empty());

        assert!(db
            .get_book(GetBookDto { id: Uuid::new_v4() })
            .await?
            .is_none());
        Ok(())
    }

    #[tokio::test]
    async fn listing_follows_requested_order() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let librarian = db.seed_staff("librarian").await;

        for (isbn, title, author, total) in [
            ("0000000000011", "Dune", "Frank Herbert", 1),
            ("0000000000012", "Anathem", "Neal Stephenson", 3),
            ("0000000000013", "Hyperion", "Dan Simmons", 2),
        ] {
            let mut dto = create(isbn, total, None);
            dto.title = title.to_string();
            dto.author = author.to_string();
            db.create_book(&librarian, dto).await?;
        }

        let ordered = |key, descending| GetAllBookDto {
            order: Some(BookOrder { key, descending }),
            ..Default::default()
        };
        let titles = |books: Vec<crate::transfer::BookDto>| {
            books.into_iter().map(|book| book.title).collect::<Vec<_>>()
        };

        let by_title = db.get_books(ordered(BookOrderKey::Title, false)).await?;
        assert_eq!(titles(by_title), ["Anathem", "Dune", "Hyperion"]);

        let by_author = db.get_books(ordered(BookOrderKey::Author, true)).await?;
        assert_eq!(titles(by_author), ["Anathem", "Dune", "Hyperion"]);

        let by_free = db
            .get_books(ordered(BookOrderKey::AvailableCopies, true))
            .await?;
        assert_eq!(titles(by_free), ["Anathem", "Hyperion", "Dune"]);
        Ok(())
    }

    #[tokio::test]
    async fn create_validates_copies() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let librarian = db.seed_staff("librarian").await;

        let book = db
            .create_book(&librarian, create("0000000000001", 4, Some(1)))
            .await?;
        assert_eq!((book.available_copies, book.total_copies), (1, 4));

        let report = db
            .create_book(&librarian, create("0000000000002", 2, Some(3)))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::InvalidInput);

        let report = db
            .create_book(&librarian, create("0000000000001", 1, None))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::InvalidInput);
        Ok(())
    }

    #[tokio::test]
    async fn catalog_writes_need_staff() {
        let db = InMemoryDatabase::default();
        let reader = db.seed_member("reader").await;

        let report = db
            .create_book(&reader, create("0000000000003", 1, None))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Forbidden);

        let report = db
            .create_book(&Capability::Anonymous, create("0000000000003", 1, None))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Unauthorized);
    }

    #[tokio::test]
    async fn resize_respects_loans() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let librarian = db.seed_staff("librarian").await;
        let reader = db.seed_member("reader").await;
        let book = db.seed_book(3, 3).await;

        let first = db
            .borrow_book(&reader, BorrowDto { book_id: book, duration_days: 14 })
            .await?;
        db.borrow_book(&reader, BorrowDto { book_id: book, duration_days: 14 })
            .await?;

        let grown = db
            .update_book(
                &librarian,
                UpdateBookDto {
                    id: book,
                    total_copies: Some(5),
                    ..Default::default()
                },
            )
            .await?
            .unwrap();
        assert_eq!((grown.available_copies, grown.total_copies), (3, 5));

        let report = db
            .update_book(
                &librarian,
                UpdateBookDto {
                    id: book,
                    total_copies: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::InvalidInput);
        assert_eq!(db.copies(book).await, (3, 5));

        let shrunk = db
            .update_book(
                &librarian,
                UpdateBookDto {
                    id: book,
                    title: Some("Renamed".to_string()),
                    total_copies: Some(2),
                    ..Default::default()
                },
            )
            .await?
            .unwrap();
        assert_eq!((shrunk.available_copies, shrunk.total_copies), (0, 2));
        assert_eq!(shrunk.title, "Renamed");

        db.return_book(&reader, ReturnDto { loan_id: first.id }).await?;
        assert_eq!(db.copies(book).await, (1, 2));
        db.assert_inventory_matches_ledger().await;

        assert!(db
            .update_book(
                &librarian,
                UpdateBookDto {
                    id: Uuid::new_v4(),
                    ..Default::default()
                }
            )
            .await?
            .is_none());
        Ok(())
    }

    #[tokio::test]
    async fn available_copies_must_agree_with_loans() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let librarian = db.seed_staff("librarian").await;
        let reader = db.seed_member("reader").await;
        let book = db.seed_book(2, 2).await;
        db.borrow_book(&reader, BorrowDto { book_id: book, duration_days: 14 })
            .await?;

        for available in [10, 3, 0] {
            let report = db
                .update_book(
                    &librarian,
                    UpdateBookDto {
                        id: book,
                        available_copies: Some(available),
                        total_copies: Some(2),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            assert_eq!(report.current_context(), &KernelError::InvalidInput);
        }
        assert_eq!(db.copies(book).await, (1, 2));

        let updated = db
            .update_book(
                &librarian,
                UpdateBookDto {
                    id: book,
                    available_copies: Some(2),
                    total_copies: Some(3),
                    ..Default::default()
                },
            )
            .await?
            .unwrap();
        assert_eq!((updated.available_copies, updated.total_copies), (2, 3));
        db.assert_inventory_matches_ledger().await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_refused_while_on_loan() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let librarian = db.seed_staff("librarian").await;
        let reader = db.seed_member("reader").await;
        let book = db.seed_book(1, 1).await;

        let loan = db
            .borrow_book(&reader, BorrowDto { book_id: book, duration_days: 14 })
            .await?;
        let report = db
            .delete_book(&librarian, DeleteBookDto { id: book })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::InvalidInput);

        db.return_book(&reader, ReturnDto { loan_id: loan.id }).await?;
        db.delete_book(&librarian, DeleteBookDto { id: book }).await?;
        assert!(db.get_book(GetBookDto { id: book }).await?.is_none());

        let report = db
            .delete_book(&librarian, DeleteBookDto { id: book })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);
        Ok(())
    }
}
