use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::interface::query::{LoanFilter, LoanQuery};
use kernel::interface::update::LoanModifier;
use kernel::prelude::entity::{
    BookId, BorrowedAt, DueAt, Loan, LoanId, ReturnedAt, SelectLimit, SelectOffset, UserId,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresLoanRepository;

#[async_trait::async_trait]
impl LoanQuery for PostgresLoanRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        PgLoanInternal::find_by_id(con, id, false).await
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut PostgresTransaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        PgLoanInternal::find_by_id(con, id, true).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresTransaction,
        filter: &LoanFilter,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        PgLoanInternal::find_all(con, filter, limit, offset).await
    }

    async fn count_active_by_book(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<i64, KernelError> {
        PgLoanInternal::count_active_by_book(con, book_id).await
    }
}

#[async_trait::async_trait]
impl LoanModifier for PostgresLoanRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        loan: &Loan,
    ) -> error_stack::Result<(), KernelError> {
        PgLoanInternal::create(con, loan).await
    }

    async fn mark_returned(
        &self,
        con: &mut PostgresTransaction,
        loan_id: &LoanId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<bool, KernelError> {
        PgLoanInternal::mark_returned(con, loan_id, returned_at).await
    }
}

#[derive(sqlx::FromRow)]
struct LoanRow {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    borrowed_at: OffsetDateTime,
    due_at: OffsetDateTime,
    returned_at: Option<OffsetDateTime>,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Loan::new(
            LoanId::new(row.id),
            UserId::new(row.user_id),
            BookId::new(row.book_id),
            BorrowedAt::new(row.borrowed_at),
            DueAt::new(row.due_at),
            row.returned_at.map(ReturnedAt::new),
        )
    }
}

pub(in crate::database) struct PgLoanInternal;

impl PgLoanInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &LoanId,
        lock: bool,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        let query = if lock {
            // language=postgresql
            r#"
            SELECT id, user_id, book_id, borrowed_at, due_at, returned_at
            FROM loans
            WHERE id = $1
            FOR UPDATE
            "#
        } else {
            // language=postgresql
            r#"
            SELECT id, user_id, book_id, borrowed_at, due_at, returned_at
            FROM loans
            WHERE id = $1
            "#
        };
        let row = sqlx::query_as::<_, LoanRow>(query)
            .bind(id.as_ref())
            .fetch_optional(con)
            .await
            .convert_error()?;
        Ok(row.map(Loan::from))
    }

    async fn find_all(
        con: &mut PgConnection,
        filter: &LoanFilter,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        let rows = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, book_id, borrowed_at, due_at, returned_at
            FROM loans
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR book_id = $2)
              AND ($3::bool IS NULL OR (returned_at IS NULL) = $3)
              AND ($4::bool IS NULL OR (returned_at IS NULL AND due_at < now()) = $4)
            ORDER BY borrowed_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.user_id.as_ref().map(AsRef::<Uuid>::as_ref))
        .bind(filter.book_id.as_ref().map(AsRef::<Uuid>::as_ref))
        .bind(filter.is_active)
        .bind(filter.is_overdue)
        .bind(i64::from(*limit.as_ref()))
        .bind(i64::from(*offset.as_ref()))
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Loan::from).collect())
    }

    async fn count_active_by_book(
        con: &mut PgConnection,
        book_id: &BookId,
    ) -> error_stack::Result<i64, KernelError> {
        // language=postgresql
        let (count,) = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*)
            FROM loans
            WHERE book_id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(book_id.as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(count)
    }

    async fn create(con: &mut PgConnection, loan: &Loan) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO loans (id, user_id, book_id, borrowed_at, due_at, returned_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(loan.id().as_ref())
        .bind(loan.user_id().as_ref())
        .bind(loan.book_id().as_ref())
        .bind(loan.borrowed_at().as_ref())
        .bind(loan.due_at().as_ref())
        .bind(loan.returned_at().as_ref().map(|at| *at.as_ref()))
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn mark_returned(
        con: &mut PgConnection,
        loan_id: &LoanId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<bool, KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned_at = $2
            WHERE id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(loan_id.as_ref())
        .bind(returned_at.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() == 1)
    }
}
