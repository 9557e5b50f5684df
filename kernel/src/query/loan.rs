use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{BookId, Loan, LoanId, SelectLimit, SelectOffset, UserId};
use crate::KernelError;

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LoanFilter {
    pub user_id: Option<UserId>,
    pub book_id: Option<BookId>,
    pub is_active: Option<bool>,
    /// Compared against the clock at query time.
    pub is_overdue: Option<bool>,
}

#[async_trait::async_trait]
pub trait LoanQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError>;

    async fn find_by_id_for_update(
        &self,
        con: &mut Self::Transaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError>;

    async fn find_all(
        &self,
        con: &mut Self::Transaction,
        filter: &LoanFilter,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Loan>, KernelError>;

    async fn count_active_by_book(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
    ) -> error_stack::Result<i64, KernelError>;
}

pub trait DependOnLoanQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type LoanQuery: LoanQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn loan_query(&self) -> &Self::LoanQuery;
}
