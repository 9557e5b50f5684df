use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{
    BookFilter, BookOrderKey, BookQuery, DependOnBookQuery, DependOnLoanQuery, DependOnUserQuery, LoanFilter,
    LoanQuery, UserQuery,
};
use kernel::interface::update::{
    BookModifier, DependOnBookModifier, DependOnLoanModifier, DependOnUserModifier,
    LoanModifier, UserModifier,
};
use kernel::prelude::entity::{
    Book, BookAuthor, BookCopies, BookDescription, BookId, BookIsbn, BookPageCount,
    BookPublisher, BookTitle, CreatedAt, Loan, LoanId, ReturnedAt,
    SelectLimit, SelectOffset, UpdatedAt, User, UserEmail, UserId, UserName, UserProfile,
    UserRole,
};
use kernel::prelude::policy::Capability;
use kernel::KernelError;

#[derive(Debug, Clone, Default)]
pub struct Tables {
    books: HashMap<BookId, Book>,
    loans: HashMap<LoanId, Loan>,
    users: HashMap<UserId, User>,
}

/// Store for service tests. One transaction at a time holds the tables.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        let InMemoryTransaction { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTransaction { guard, working })
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn page<T>(items: Vec<T>, limit: &SelectLimit, offset: &SelectOffset) -> Vec<T> {
    items
        .into_iter()
        .skip(*offset.as_ref() as usize)
        .take(*limit.as_ref() as usize)
        .collect()
}

pub struct InMemoryBookRepository;

#[async_trait::async_trait]
impl BookQuery for InMemoryBookRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        Ok(con.working.books.get(id).cloned())
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut InMemoryTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        self.find_by_id(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
        filter: &BookFilter,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let mut books = con
            .working
            .books
            .values()
            .filter(|book| {
                filter
                    .title
                    .as_deref()
                    .map_or(true, |title| contains(book.title().as_ref(), title))
                    && filter
                        .author
                        .as_deref()
                        .map_or(true, |author| contains(book.author().as_ref(), author))
                    && filter
                        .isbn
                        .as_deref()
                        .map_or(true, |isbn| book.isbn().as_ref() == isbn)
                    && filter.search.as_deref().map_or(true, |term| {
                        contains(book.title().as_ref(), term)
                            || contains(book.author().as_ref(), term)
                            || contains(book.isbn().as_ref(), term)
                            || contains(book.description().as_ref(), term)
                    })
                    && (!filter.available_only || book.is_available())
            })
            .cloned()
            .collect::<Vec<_>>();
        books.sort_by(|a, b| {
            let requested = filter.order.map_or(Ordering::Equal, |order| {
                let ordering = match order.key {
                    BookOrderKey::Title => a.title().as_ref().cmp(b.title().as_ref()),
                    BookOrderKey::Author => a.author().as_ref().cmp(b.author().as_ref()),
                    BookOrderKey::AvailableCopies => {
                        a.copies().available().cmp(&b.copies().available())
                    }
                };
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
            requested.then_with(|| b.created_at().as_ref().cmp(a.created_at().as_ref()))
        });
        Ok(page(books, limit, offset))
    }
}

#[async_trait::async_trait]
impl BookModifier for InMemoryBookRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        if con
            .working
            .books
            .values()
            .any(|stored| stored.isbn() == book.isbn())
        {
            return Err(error_stack::Report::new(KernelError::InvalidInput)
                .attach_printable("ISBN already registered"));
        }
        con.working.books.insert(book.id().clone(), book.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        con.working.books.insert(book.id().clone(), book.clone());
        Ok(())
    }

    async fn delete(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        con.working.books.remove(book_id);
        con.working.loans.retain(|_, loan| loan.book_id() != book_id);
        Ok(())
    }

    async fn take_copy(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<bool, KernelError> {
        Ok(adjust_copies(&mut con.working, book_id, BookCopies::take))
    }

    async fn restore_copy(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<bool, KernelError> {
        Ok(adjust_copies(&mut con.working, book_id, BookCopies::restore))
    }
}

fn adjust_copies(
    tables: &mut Tables,
    book_id: &BookId,
    step: impl FnOnce(BookCopies) -> Option<BookCopies>,
) -> bool {
    let Some(book) = tables.books.remove(book_id) else {
        return false;
    };
    let Some(copies) = step(*book.copies()) else {
        tables.books.insert(book_id.clone(), book);
        return false;
    };
    let mut book = book.into_destruct();
    book.copies = copies;
    tables.books.insert(book_id.clone(), book.freeze());
    true
}

pub struct InMemoryLoanRepository;

#[async_trait::async_trait]
impl LoanQuery for InMemoryLoanRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        Ok(con.working.loans.get(id).cloned())
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut InMemoryTransaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        self.find_by_id(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
        filter: &LoanFilter,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        let now = OffsetDateTime::now_utc();
        let mut loans = con
            .working
            .loans
            .values()
            .filter(|loan| {
                filter
                    .user_id
                    .as_ref()
                    .map_or(true, |id| loan.user_id() == id)
                    && filter
                        .book_id
                        .as_ref()
                        .map_or(true, |id| loan.book_id() == id)
                    && filter
                        .is_active
                        .map_or(true, |active| loan.is_active() == active)
                    && filter
                        .is_overdue
                        .map_or(true, |overdue| loan.is_overdue_at(now) == overdue)
            })
            .cloned()
            .collect::<Vec<_>>();
        loans.sort_by(|a, b| b.borrowed_at().as_ref().cmp(a.borrowed_at().as_ref()));
        Ok(page(loans, limit, offset))
    }

    async fn count_active_by_book(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<i64, KernelError> {
        Ok(con
            .working
            .loans
            .values()
            .filter(|loan| loan.book_id() == book_id && loan.is_active())
            .count() as i64)
    }
}

#[async_trait::async_trait]
impl LoanModifier for InMemoryLoanRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        loan: &Loan,
    ) -> error_stack::Result<(), KernelError> {
        con.working.loans.insert(loan.id().clone(), loan.clone());
        Ok(())
    }

    async fn mark_returned(
        &self,
        con: &mut InMemoryTransaction,
        loan_id: &LoanId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<bool, KernelError> {
        match con.working.loans.remove(loan_id) {
            Some(loan) if loan.is_active() => {
                con.working
                    .loans
                    .insert(loan_id.clone(), loan.close(returned_at.clone()));
                Ok(true)
            }
            Some(loan) => {
                con.working.loans.insert(loan_id.clone(), loan);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

pub struct InMemoryUserRepository;

#[async_trait::async_trait]
impl UserQuery for InMemoryUserRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        Ok(con.working.users.get(id).cloned())
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut InMemoryTransaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        self.find_by_id(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<User>, KernelError> {
        let mut users = con.working.users.values().cloned().collect::<Vec<_>>();
        users.sort_by(|a, b| b.created_at().as_ref().cmp(a.created_at().as_ref()));
        Ok(page(users, limit, offset))
    }

    async fn count_active_loans(
        &self,
        con: &mut InMemoryTransaction,
        id: &UserId,
    ) -> error_stack::Result<i64, KernelError> {
        Ok(con
            .working
            .loans
            .values()
            .filter(|loan| loan.user_id() == id && loan.is_active())
            .count() as i64)
    }
}

#[async_trait::async_trait]
impl UserModifier for InMemoryUserRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        user: &User,
    ) -> error_stack::Result<(), KernelError> {
        if con
            .working
            .users
            .values()
            .any(|stored| stored.name() == user.name() || stored.email() == user.email())
        {
            return Err(error_stack::Report::new(KernelError::InvalidInput)
                .attach_printable("Username or email already registered"));
        }
        con.working.users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        user: &User,
    ) -> error_stack::Result<(), KernelError> {
        con.working.users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn delete(
        &self,
        con: &mut InMemoryTransaction,
        user_id: &UserId,
    ) -> error_stack::Result<(), KernelError> {
        con.working.users.remove(user_id);
        con.working.loans.retain(|_, loan| loan.user_id() != user_id);
        Ok(())
    }
}

impl DependOnBookQuery for InMemoryDatabase {
    type BookQuery = InMemoryBookRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &InMemoryBookRepository
    }
}

impl DependOnBookModifier for InMemoryDatabase {
    type BookModifier = InMemoryBookRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &InMemoryBookRepository
    }
}

impl DependOnLoanQuery for InMemoryDatabase {
    type LoanQuery = InMemoryLoanRepository;
    fn loan_query(&self) -> &Self::LoanQuery {
        &InMemoryLoanRepository
    }
}

impl DependOnLoanModifier for InMemoryDatabase {
    type LoanModifier = InMemoryLoanRepository;
    fn loan_modifier(&self) -> &Self::LoanModifier {
        &InMemoryLoanRepository
    }
}

impl DependOnUserQuery for InMemoryDatabase {
    type UserQuery = InMemoryUserRepository;
    fn user_query(&self) -> &Self::UserQuery {
        &InMemoryUserRepository
    }
}

impl DependOnUserModifier for InMemoryDatabase {
    type UserModifier = InMemoryUserRepository;
    fn user_modifier(&self) -> &Self::UserModifier {
        &InMemoryUserRepository
    }
}

impl InMemoryDatabase {
    async fn seed_user(&self, name: &str, role: UserRole) -> Capability {
        let user = User::new(
            UserId::new(Uuid::new_v4()),
            UserName::new(name),
            UserEmail::new(format!("{name}@example.com")),
            role,
            UserProfile::default(),
            CreatedAt::new(OffsetDateTime::now_utc()),
        );
        let capability = Capability::of(&user);
        self.tables
            .lock()
            .await
            .users
            .insert(user.id().clone(), user);
        capability
    }

    pub async fn seed_member(&self, name: &str) -> Capability {
        self.seed_user(name, UserRole::Member).await
    }

    pub async fn seed_staff(&self, name: &str) -> Capability {
        self.seed_user(name, UserRole::Staff).await
    }

    /// Stores a book directly, bypassing the catalog services.
    pub async fn seed_book(&self, available: i32, total: i32) -> Uuid {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let book = Book::new(
            BookId::new(id),
            BookTitle::new(format!("Book {id}")),
            BookAuthor::new("Anonymous"),
            BookIsbn::new(id.simple().to_string()[..13].to_string()),
            BookPageCount::new(100),
            BookPublisher::default(),
            None,
            BookDescription::default(),
            BookCopies::new(available, total).expect("seeded copies must be valid"),
            CreatedAt::new(now),
            UpdatedAt::new(now),
        );
        self.tables.lock().await.books.insert(BookId::new(id), book);
        id
    }

    /// `(available, total)` as currently committed.
    pub async fn copies(&self, book_id: Uuid) -> (i32, i32) {
        let tables = self.tables.lock().await;
        let book = tables
            .books
            .get(&BookId::new(book_id))
            .expect("book must exist");
        (book.copies().available(), book.copies().total())
    }

    pub async fn active_loans_of(&self, user_id: &UserId) -> usize {
        self.tables
            .lock()
            .await
            .loans
            .values()
            .filter(|loan| loan.user_id() == user_id && loan.is_active())
            .count()
    }

    /// Panics unless every book's free copies equal its total minus its open loans.
    pub async fn assert_inventory_matches_ledger(&self) {
        let tables = self.tables.lock().await;
        for (id, book) in tables.books.iter() {
            let copies = book.copies();
            let active = tables
                .loans
                .values()
                .filter(|loan| loan.book_id() == id && loan.is_active())
                .count() as i32;
            assert!(copies.available() >= 0);
            assert!(copies.available() <= copies.total());
            assert_eq!(
                copies.available(),
                copies.total() - active,
                "inventory of book {:?} disagrees with the ledger",
                id
            );
        }
    }
}
