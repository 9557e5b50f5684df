mod book;
#[cfg(test)]
mod lending;
mod loan;
mod user;

use std::ops::{Deref, DerefMut};

use error_stack::{Report, ResultExt};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Error, PgConnection, Pool, Postgres};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{DependOnBookQuery, DependOnLoanQuery, DependOnUserQuery};
use kernel::interface::update::{
    DependOnBookModifier, DependOnLoanModifier, DependOnUserModifier,
};
use kernel::KernelError;

use crate::error::ConvertError;
use crate::{env, env_or};

pub use self::{book::*, loan::*, user::*};

const POSTGRES_URL: &str = "POSTGRES_URL";
const POSTGRES_MAX_CONNECTIONS: &str = "POSTGRES_MAX_CONNECTIONS";
const DEFAULT_MAX_CONNECTIONS: u32 = 8;

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let url = env(POSTGRES_URL)?;
        let max_connections = env_or(POSTGRES_MAX_CONNECTIONS, DEFAULT_MAX_CONNECTIONS)?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await
            .convert_error()?;
        tracing::debug!("Connected to PostgreSQL (max {} connections)", max_connections);
        Ok(Self { pool })
    }

    /// Brings the schema up to date with `driver/migrations`.
    pub async fn migrate(&self) -> error_stack::Result<(), KernelError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable_lazy(|| "Failed to run database migrations")?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let con = self.pool.begin().await.convert_error()?;
        Ok(PostgresTransaction(con))
    }
}

/// Rolled back by sqlx when dropped before [`Transaction::commit`].
pub struct PostgresTransaction(sqlx::Transaction<'static, Postgres>);

#[async_trait::async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl Deref for PostgresTransaction {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

impl DerefMut for PostgresTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.deref_mut()
    }
}

impl<T> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let context = match &error {
                Error::PoolTimedOut => KernelError::Timeout,
                Error::Database(e) if e.is_unique_violation() || e.is_check_violation() => {
                    KernelError::InvalidInput
                }
                Error::Database(e) if e.is_foreign_key_violation() => KernelError::NotFound,
                Error::Database(e)
                    if matches!(e.code().as_deref(), Some("40001") | Some("40P01")) =>
                {
                    KernelError::Concurrency
                }
                _ => KernelError::Internal,
            };
            Report::from(error).change_context(context)
        })
    }
}

impl DependOnBookQuery for PostgresDatabase {
    type BookQuery = PostgresBookRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &PostgresBookRepository
    }
}

impl DependOnBookModifier for PostgresDatabase {
    type BookModifier = PostgresBookRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &PostgresBookRepository
    }
}

impl DependOnLoanQuery for PostgresDatabase {
    type LoanQuery = PostgresLoanRepository;
    fn loan_query(&self) -> &Self::LoanQuery {
        &PostgresLoanRepository
    }
}

impl DependOnLoanModifier for PostgresDatabase {
    type LoanModifier = PostgresLoanRepository;
    fn loan_modifier(&self) -> &Self::LoanModifier {
        &PostgresLoanRepository
    }
}

impl DependOnUserQuery for PostgresDatabase {
    type UserQuery = PostgresUserRepository;
    fn user_query(&self) -> &Self::UserQuery {
        &PostgresUserRepository
    }
}

impl DependOnUserModifier for PostgresDatabase {
    type UserModifier = PostgresUserRepository;
    fn user_modifier(&self) -> &Self::UserModifier {
        &PostgresUserRepository
    }
}

/// Escapes `LIKE` wildcards so user input only ever matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
