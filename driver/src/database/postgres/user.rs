use sqlx::PgConnection;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use kernel::interface::query::UserQuery;
use kernel::interface::update::UserModifier;
use kernel::prelude::entity::{
    CreatedAt, SelectLimit, SelectOffset, User, UserEmail, UserId, UserName, UserProfile,
    UserRole,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresUserRepository;

#[async_trait::async_trait]
impl UserQuery for PostgresUserRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        PgUserInternal::find_by_id(con, id, false).await
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut PostgresTransaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        PgUserInternal::find_by_id(con, id, true).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresTransaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<User>, KernelError> {
        PgUserInternal::find_all(con, limit, offset).await
    }

    async fn count_active_loans(
        &self,
        con: &mut PostgresTransaction,
        id: &UserId,
    ) -> error_stack::Result<i64, KernelError> {
        PgUserInternal::count_active_loans(con, id).await
    }
}

#[async_trait::async_trait]
impl UserModifier for PostgresUserRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        user: &User,
    ) -> error_stack::Result<(), KernelError> {
        PgUserInternal::create(con, user).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        user: &User,
    ) -> error_stack::Result<(), KernelError> {
        PgUserInternal::update(con, user).await
    }

    async fn delete(
        &self,
        con: &mut PostgresTransaction,
        user_id: &UserId,
    ) -> error_stack::Result<(), KernelError> {
        PgUserInternal::delete(con, user_id).await
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    is_staff: bool,
    first_name: String,
    last_name: String,
    phone_number: String,
    address: String,
    date_of_birth: Option<Date>,
    created_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::new(
            UserId::new(row.id),
            UserName::new(row.name),
            UserEmail::new(row.email),
            UserRole::from(row.is_staff),
            UserProfile::new(
                row.first_name,
                row.last_name,
                row.phone_number,
                row.address,
                row.date_of_birth,
            ),
            CreatedAt::new(row.created_at),
        )
    }
}

pub(in crate::database) struct PgUserInternal;

impl PgUserInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &UserId,
        lock: bool,
    ) -> error_stack::Result<Option<User>, KernelError> {
        let query = if lock {
            // language=postgresql
            r#"
            SELECT id, name, email, is_staff, first_name, last_name, phone_number, address,
                   date_of_birth, created_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#
        } else {
            // language=postgresql
            r#"
            SELECT id, name, email, is_staff, first_name, last_name, phone_number, address,
                   date_of_birth, created_at
            FROM users
            WHERE id = $1
            "#
        };
        let row = sqlx::query_as::<_, UserRow>(query)
            .bind(id.as_ref())
            .fetch_optional(con)
            .await
            .convert_error()?;
        Ok(row.map(User::from))
    }

    async fn find_all(
        con: &mut PgConnection,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<User>, KernelError> {
        let rows = sqlx::query_as::<_, UserRow>(
            // language=postgresql
            r#"
            SELECT id, name, email, is_staff, first_name, last_name, phone_number, address,
                   date_of_birth, created_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(*limit.as_ref()))
        .bind(i64::from(*offset.as_ref()))
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn count_active_loans(
        con: &mut PgConnection,
        id: &UserId,
    ) -> error_stack::Result<i64, KernelError> {
        // language=postgresql
        let (count,) = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*)
            FROM loans
            WHERE user_id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(id.as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(count)
    }

    async fn create(con: &mut PgConnection, user: &User) -> error_stack::Result<(), KernelError> {
        let profile = user.profile();
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO users (id, name, email, is_staff, first_name, last_name, phone_number,
                               address, date_of_birth, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id().as_ref())
        .bind(user.name().as_ref())
        .bind(user.email().as_ref())
        .bind(user.role().is_staff())
        .bind(profile.first_name())
        .bind(profile.last_name())
        .bind(profile.phone_number())
        .bind(profile.address())
        .bind(*profile.date_of_birth())
        .bind(user.created_at().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(con: &mut PgConnection, user: &User) -> error_stack::Result<(), KernelError> {
        let profile = user.profile();
        // language=postgresql
        sqlx::query(
            r#"
            UPDATE users
            SET email = $2, is_staff = $3, first_name = $4, last_name = $5, phone_number = $6,
                address = $7, date_of_birth = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_ref())
        .bind(user.email().as_ref())
        .bind(user.role().is_staff())
        .bind(profile.first_name())
        .bind(profile.last_name())
        .bind(profile.phone_number())
        .bind(profile.address())
        .bind(*profile.date_of_birth())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn delete(con: &mut PgConnection, user_id: &UserId) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }
}
