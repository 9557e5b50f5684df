use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{SelectLimit, SelectOffset, User, UserId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait UserQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError>;

    /// Like `find_by_id`, but holds a row lock until the transaction ends.
    /// Loan inserts referencing the user wait on it.
    async fn find_by_id_for_update(
        &self,
        con: &mut Self::Transaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError>;

    async fn find_all(
        &self,
        con: &mut Self::Transaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<User>, KernelError>;

    async fn count_active_loans(
        &self,
        con: &mut Self::Transaction,
        id: &UserId,
    ) -> error_stack::Result<i64, KernelError>;
}

pub trait DependOnUserQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type UserQuery: UserQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn user_query(&self) -> &Self::UserQuery;
}
