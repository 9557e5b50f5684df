use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Loan, LoanId, ReturnedAt};
use crate::KernelError;

#[async_trait::async_trait]
pub trait LoanModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn create(
        &self,
        con: &mut Self::Transaction,
        loan: &Loan,
    ) -> error_stack::Result<(), KernelError>;

    /// Records the return unless one is already recorded. Returns whether this call recorded it.
    async fn mark_returned(
        &self,
        con: &mut Self::Transaction,
        loan_id: &LoanId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<bool, KernelError>;
}

pub trait DependOnLoanModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type LoanModifier: LoanModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn loan_modifier(&self) -> &Self::LoanModifier;
}
