//! Lending services run against PostgreSQL, where transactions really overlap.

use std::time::Duration as StdDuration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use uuid::Uuid;

use application::service::{BorrowService, DeleteUserService, UpdateUserService};
use application::transfer::{BorrowDto, DeleteUserDto, LoanDto, UpdateUserDto};
use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{BookQuery, LoanQuery, UserQuery};
use kernel::interface::update::{BookModifier, LoanModifier, UserModifier};
use kernel::prelude::entity::{
    stored_now, Book, BookAuthor, BookCopies, BookDescription, BookId, BookIsbn, BookPageCount,
    BookPublisher, BookTitle, CreatedAt, Loan, LoanDuration, LoanId, UpdatedAt, User, UserEmail,
    UserId, UserName, UserProfile, UserRole,
};
use kernel::prelude::policy::Capability;
use kernel::KernelError;

use crate::database::postgres::{
    PostgresBookRepository, PostgresDatabase, PostgresLoanRepository, PostgresUserRepository,
};

/// Long enough for a contender to reach its lock wait.
const SETTLE: StdDuration = StdDuration::from_millis(300);

async fn member(db: &PostgresDatabase) -> error_stack::Result<UserId, KernelError> {
    let id = Uuid::new_v4();
    let user = User::new(
        UserId::new(id),
        UserName::new(format!("reader-{id}")),
        UserEmail::new(format!("{id}@library.test")),
        UserRole::Member,
        UserProfile::default(),
        CreatedAt::new(stored_now()),
    );
    let mut con = db.transact().await?;
    PostgresUserRepository.create(&mut con, &user).await?;
    con.commit().await?;
    Ok(user.id().clone())
}

async fn shelve(db: &PostgresDatabase, copies: i32) -> error_stack::Result<BookId, KernelError> {
    let id = Uuid::new_v4();
    let now = stored_now();
    let book = Book::new(
        BookId::new(id),
        BookTitle::new(format!("Contended {id}")),
        BookAuthor::new("Test Author"),
        BookIsbn::new(&id.simple().to_string()[..13]),
        BookPageCount::new(10),
        BookPublisher::default(),
        None,
        BookDescription::default(),
        BookCopies::full(copies)?,
        CreatedAt::new(now),
        UpdatedAt::new(now),
    );
    let mut con = db.transact().await?;
    PostgresBookRepository.create(&mut con, &book).await?;
    con.commit().await?;
    Ok(book.id().clone())
}

fn borrow(
    db: &PostgresDatabase,
    borrower: &UserId,
    book: &BookId,
) -> JoinHandle<error_stack::Result<LoanDto, KernelError>> {
    let db = db.clone();
    let actor = Capability::Member(borrower.clone());
    let dto = BorrowDto {
        book_id: *book.as_ref(),
        duration_days: 14,
    };
    tokio::spawn(async move { db.borrow_book(&actor, dto).await })
}

async fn available(db: &PostgresDatabase, book: &BookId) -> error_stack::Result<i32, KernelError> {
    let mut con = db.transact().await?;
    let found = PostgresBookRepository.find_by_id(&mut con, book).await?;
    Ok(found.map_or(-1, |book| book.copies().available()))
}

async fn clean_up(
    db: &PostgresDatabase,
    book: &BookId,
    users: &[&UserId],
) -> error_stack::Result<(), KernelError> {
    let mut con = db.transact().await?;
    PostgresBookRepository.delete(&mut con, book).await?;
    for user in users {
        PostgresUserRepository.delete(&mut con, user).await?;
    }
    con.commit().await
}

#[test_with::env(POSTGRES_TEST)]
#[tokio::test]
async fn borrow_waits_for_the_locked_last_copy() -> error_stack::Result<(), KernelError> {
    let db = PostgresDatabase::new().await?;
    db.migrate().await?;
    let first = member(&db).await?;
    let second = member(&db).await?;
    let book = shelve(&db, 1).await?;

    // Takes the last copy the way a borrow does, but holds the commit back.
    let mut holder = db.transact().await?;
    PostgresBookRepository
        .find_by_id_for_update(&mut holder, &book)
        .await?;
    assert!(PostgresBookRepository.take_copy(&mut holder, &book).await?);
    let loan = Loan::open(
        LoanId::new(Uuid::new_v4()),
        first.clone(),
        book.clone(),
        stored_now(),
        &LoanDuration::new(14)?,
    );
    PostgresLoanRepository.create(&mut holder, &loan).await?;

    let contender = borrow(&db, &second, &book);
    tokio::time::sleep(SETTLE).await;
    assert!(!contender.is_finished(), "borrow must wait on the book row lock");

    holder.commit().await?;
    let report = contender
        .await
        .expect("borrow task panicked")
        .unwrap_err();
    assert_eq!(report.current_context(), &KernelError::Unavailable);

    assert_eq!(available(&db, &book).await?, 0);
    let mut con = db.transact().await?;
    assert_eq!(
        PostgresLoanRepository
            .count_active_by_book(&mut con, &book)
            .await?,
        1
    );
    drop(con);
    clean_up(&db, &book, &[&first, &second]).await
}

#[test_with::env(POSTGRES_TEST)]
#[tokio::test]
async fn last_copy_goes_to_exactly_one_borrower() -> error_stack::Result<(), KernelError> {
    let db = PostgresDatabase::new().await?;
    db.migrate().await?;
    let first = member(&db).await?;
    let second = member(&db).await?;
    let book = shelve(&db, 1).await?;

    let a = borrow(&db, &first, &book);
    let b = borrow(&db, &second, &book);
    let a = a.await.expect("borrow task panicked");
    let b = b.await.expect("borrow task panicked");

    let (won, lost) = match (a, b) {
        (Ok(loan), Err(report)) | (Err(report), Ok(loan)) => (loan, report),
        (a, b) => panic!("exactly one borrow must win: {a:?} / {b:?}"),
    };
    assert!(won.is_active);
    assert_eq!(lost.current_context(), &KernelError::Unavailable);
    assert_eq!(available(&db, &book).await?, 0);

    clean_up(&db, &book, &[&first, &second]).await
}

#[test_with::env(POSTGRES_TEST)]
#[tokio::test]
async fn borrow_by_a_user_being_deleted_gives_the_copy_back() -> error_stack::Result<(), KernelError>
{
    let db = PostgresDatabase::new().await?;
    db.migrate().await?;
    let leaving = member(&db).await?;
    let book = shelve(&db, 2).await?;

    // The same steps `delete_user` takes, paused before the delete.
    let mut deleter = db.transact().await?;
    assert!(PostgresUserRepository
        .find_by_id_for_update(&mut deleter, &leaving)
        .await?
        .is_some());
    assert_eq!(
        PostgresUserRepository
            .count_active_loans(&mut deleter, &leaving)
            .await?,
        0
    );

    let contender = borrow(&db, &leaving, &book);
    tokio::time::sleep(SETTLE).await;
    assert!(!contender.is_finished(), "loan insert must wait on the user row lock");

    PostgresUserRepository.delete(&mut deleter, &leaving).await?;
    deleter.commit().await?;

    let report = contender
        .await
        .expect("borrow task panicked")
        .unwrap_err();
    assert_eq!(report.current_context(), &KernelError::NotFound);
    assert_eq!(available(&db, &book).await?, 2);

    clean_up(&db, &book, &[]).await
}

#[test_with::env(POSTGRES_TEST)]
#[tokio::test]
async fn delete_waits_for_a_pending_loan() -> error_stack::Result<(), KernelError> {
    let db = PostgresDatabase::new().await?;
    db.migrate().await?;
    let reader = member(&db).await?;
    let book = shelve(&db, 2).await?;

    // A borrow that has written its loan but not committed yet.
    let mut holder = db.transact().await?;
    assert!(PostgresBookRepository.take_copy(&mut holder, &book).await?);
    let borrowed = OffsetDateTime::now_utc().replace_nanosecond(0).unwrap();
    let loan = Loan::open(
        LoanId::new(Uuid::new_v4()),
        reader.clone(),
        book.clone(),
        borrowed,
        &LoanDuration::new(14)?,
    );
    PostgresLoanRepository.create(&mut holder, &loan).await?;

    let deleter = {
        let db = db.clone();
        let staff = Capability::Staff(UserId::new(Uuid::new_v4()));
        let dto = DeleteUserDto {
            id: *reader.as_ref(),
        };
        tokio::spawn(async move { db.delete_user(&staff, dto).await })
    };
    tokio::time::sleep(SETTLE).await;
    assert!(!deleter.is_finished(), "delete must wait for the loan insert");

    holder.commit().await?;
    let report = deleter
        .await
        .expect("delete task panicked")
        .unwrap_err();
    assert_eq!(report.current_context(), &KernelError::InvalidInput);

    let mut con = db.transact().await?;
    assert!(PostgresUserRepository.find_by_id(&mut con, &reader).await?.is_some());
    assert_eq!(
        PostgresUserRepository
            .count_active_loans(&mut con, &reader)
            .await?,
        1
    );
    drop(con);
    clean_up(&db, &book, &[&reader]).await
}

#[test_with::env(POSTGRES_TEST)]
#[tokio::test]
async fn profile_updates_do_not_overwrite_each_other() -> error_stack::Result<(), KernelError> {
    let db = PostgresDatabase::new().await?;
    db.migrate().await?;
    let reader = member(&db).await?;
    let book = shelve(&db, 1).await?;

    let mut holder = db.transact().await?;
    let user = PostgresUserRepository
        .find_by_id_for_update(&mut holder, &reader)
        .await?
        .unwrap();

    let updater = {
        let db = db.clone();
        let actor = Capability::Member(reader.clone());
        let dto = UpdateUserDto {
            id: *reader.as_ref(),
            first_name: Some("Ada".to_string()),
            ..Default::default()
        };
        tokio::spawn(async move { db.update_user(&actor, dto).await })
    };
    tokio::time::sleep(SETTLE).await;
    assert!(!updater.is_finished(), "update must wait on the user row lock");

    let mut user = user.into_destruct();
    let mut profile = user.profile.into_destruct();
    profile.last_name = "Lovelace".to_string();
    user.profile = profile.freeze();
    PostgresUserRepository
        .update(&mut holder, &user.freeze())
        .await?;
    holder.commit().await?;

    updater.await.expect("update task panicked")?.unwrap();
    let mut con = db.transact().await?;
    let user = PostgresUserRepository
        .find_by_id(&mut con, &reader)
        .await?
        .unwrap();
    assert_eq!(user.profile().first_name(), "Ada");
    assert_eq!(user.profile().last_name(), "Lovelace");
    drop(con);
    clean_up(&db, &book, &[&reader]).await
}
