use std::collections::HashMap;

use error_stack::Report;
use tracing::{debug, error, info};
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{
    BookQuery, DependOnBookQuery, DependOnLoanQuery, DependOnUserQuery, LoanFilter, LoanQuery,
    UserQuery,
};
use kernel::interface::update::{
    BookModifier, DependOnBookModifier, DependOnLoanModifier, LoanModifier,
};
use kernel::prelude::entity::{
    stored_now, BookId, Loan, LoanDuration, LoanId, ReturnedAt, UserId,
};
use kernel::prelude::policy::{Capability, LoanScope, Operation};
use kernel::KernelError;

use crate::transfer::{BorrowDto, GetAllLoanDto, GetLoanDto, LoanDto, ReturnDto};

type TransactionOf<T> =
    <<T as DependOnDatabaseConnection>::DatabaseConnection as DatabaseConnection>::Transaction;

async fn book_title<T>(
    service: &T,
    connection: &mut TransactionOf<T>,
    id: &BookId,
) -> error_stack::Result<String, KernelError>
where
    T: ?Sized + DependOnBookQuery,
{
    let book = service
        .book_query()
        .find_by_id(connection, id)
        .await?
        .ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("Loaned book {} is missing", id.as_ref()))
        })?;
    Ok(book.title().as_ref().to_string())
}

async fn user_name<T>(
    service: &T,
    connection: &mut TransactionOf<T>,
    id: &UserId,
) -> error_stack::Result<String, KernelError>
where
    T: ?Sized + DependOnUserQuery,
{
    let user = service
        .user_query()
        .find_by_id(connection, id)
        .await?
        .ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("Borrower {} is missing", id.as_ref()))
        })?;
    Ok(user.name().as_ref().to_string())
}

/// Pairs each loan with its book title and borrower name, looking each up once.
async fn describe<T>(
    service: &T,
    connection: &mut TransactionOf<T>,
    loans: Vec<Loan>,
) -> error_stack::Result<Vec<LoanDto>, KernelError>
where
    T: ?Sized + DependOnBookQuery + DependOnUserQuery,
{
    let mut titles = HashMap::<BookId, String>::new();
    let mut names = HashMap::<UserId, String>::new();
    let mut described = Vec::with_capacity(loans.len());
    for loan in loans {
        let title = match titles.get(loan.book_id()) {
            Some(title) => title.clone(),
            None => {
                let title = book_title(service, connection, loan.book_id()).await?;
                titles.insert(loan.book_id().clone(), title.clone());
                title
            }
        };
        let name = match names.get(loan.user_id()) {
            Some(name) => name.clone(),
            None => {
                let name = user_name(service, connection, loan.user_id()).await?;
                names.insert(loan.user_id().clone(), name.clone());
                name
            }
        };
        described.push(LoanDto::new(loan, title, name));
    }
    Ok(described)
}

#[async_trait::async_trait]
pub trait GetLoanService:
    'static + Sync + Send + DependOnLoanQuery + DependOnBookQuery + DependOnUserQuery
{
    async fn get_loan(
        &self,
        actor: &Capability,
        dto: GetLoanDto,
    ) -> error_stack::Result<Option<LoanDto>, KernelError> {
        actor.require_identity()?;
        let mut connection = self.database_connection().transact().await?;

        let id = LoanId::new(dto.id);
        let loan = self.loan_query().find_by_id(&mut connection, &id).await?;
        match loan {
            None => Ok(None),
            Some(loan) => {
                actor.authorize(Operation::ReadLoan(&loan))?;
                let title = book_title(self, &mut connection, loan.book_id()).await?;
                let name = user_name(self, &mut connection, loan.user_id()).await?;
                Ok(Some(LoanDto::new(loan, title, name)))
            }
        }
    }

    async fn get_loans(
        &self,
        actor: &Capability,
        dto: GetAllLoanDto,
    ) -> error_stack::Result<Vec<LoanDto>, KernelError> {
        let user_id = match actor.loan_scope()? {
            LoanScope::All => dto.user_id.map(UserId::new),
            LoanScope::Own(id) => Some(id),
        };
        let filter = LoanFilter {
            user_id,
            book_id: dto.book_id.map(BookId::new),
            is_active: dto.is_active,
            is_overdue: dto.is_overdue,
        };

        let mut connection = self.database_connection().transact().await?;
        let loans = self
            .loan_query()
            .find_all(&mut connection, &filter, &dto.limit, &dto.offset)
            .await?;

        describe(self, &mut connection, loans).await
    }
}

impl<T> GetLoanService for T where T: DependOnLoanQuery + DependOnBookQuery + DependOnUserQuery {}

#[async_trait::async_trait]
pub trait BorrowService:
    'static
    + Sync
    + Send
    + DependOnBookQuery
    + DependOnBookModifier
    + DependOnLoanModifier
    + DependOnUserQuery
{
    /// Lends one copy of a book to the caller.
    ///
    /// The book row is locked for the whole transaction and the decrement itself is
    /// conditional, so two borrowers racing for the last copy cannot both succeed.
    #[tracing::instrument(skip(self))]
    async fn borrow_book(
        &self,
        actor: &Capability,
        dto: BorrowDto,
    ) -> error_stack::Result<LoanDto, KernelError> {
        let borrower = actor.borrower()?.clone();
        let duration = LoanDuration::new(dto.duration_days)?;
        let book_id = BookId::new(dto.book_id);

        let mut connection = self.database_connection().transact().await?;

        let book = self
            .book_query()
            .find_by_id_for_update(&mut connection, &book_id)
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::NotFound)
                    .attach_printable(format!("Book {} does not exist", dto.book_id))
            })?;

        if !book.is_available() {
            debug!("Book {} has no copy left", dto.book_id);
            return Err(Report::new(KernelError::Unavailable)
                .attach_printable(format!("Book {} has no copy left", dto.book_id)));
        }

        if !self
            .book_modifier()
            .take_copy(&mut connection, &book_id)
            .await?
        {
            debug!("Book {} was drained before the copy was taken", dto.book_id);
            return Err(Report::new(KernelError::Unavailable)
                .attach_printable(format!("Book {} has no copy left", dto.book_id)));
        }

        let name = self
            .user_query()
            .find_by_id(&mut connection, &borrower)
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::NotFound)
                    .attach_printable(format!("User {} does not exist", borrower.as_ref()))
            })?
            .name()
            .as_ref()
            .to_string();
        let loan = Loan::open(
            LoanId::new(Uuid::new_v4()),
            borrower,
            book_id,
            stored_now(),
            &duration,
        );
        self.loan_modifier().create(&mut connection, &loan).await?;
        connection.commit().await?;

        info!(
            "Loan {} opened for book {} until {}",
            loan.id().as_ref(),
            dto.book_id,
            loan.due_at().as_ref()
        );
        Ok(LoanDto::new(loan, book.title().as_ref().to_string(), name))
    }
}

impl<T> BorrowService for T where
    T: DependOnBookQuery + DependOnBookModifier + DependOnLoanModifier + DependOnUserQuery
{
}

#[async_trait::async_trait]
pub trait ReturnService:
    'static
    + Sync
    + Send
    + DependOnLoanQuery
    + DependOnLoanModifier
    + DependOnBookModifier
    + DependOnBookQuery
    + DependOnUserQuery
{
    /// Closes an active loan and puts its copy back on the shelf.
    #[tracing::instrument(skip(self))]
    async fn return_book(
        &self,
        actor: &Capability,
        dto: ReturnDto,
    ) -> error_stack::Result<LoanDto, KernelError> {
        actor.require_identity()?;
        let loan_id = LoanId::new(dto.loan_id);

        let mut connection = self.database_connection().transact().await?;

        let loan = self
            .loan_query()
            .find_by_id_for_update(&mut connection, &loan_id)
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::NotFound)
                    .attach_printable(format!("Loan {} does not exist", dto.loan_id))
            })?;

        actor.authorize(Operation::ReturnLoan(&loan))?;

        let already_returned = || {
            Report::new(KernelError::AlreadyReturned)
                .attach_printable(format!("Loan {} is already closed", dto.loan_id))
        };
        if !loan.is_active() {
            debug!("Loan {} is already closed", dto.loan_id);
            return Err(already_returned());
        }

        let returned_at = ReturnedAt::new(stored_now());
        if !self
            .loan_modifier()
            .mark_returned(&mut connection, &loan_id, &returned_at)
            .await?
        {
            return Err(already_returned());
        }

        if !self
            .book_modifier()
            .restore_copy(&mut connection, loan.book_id())
            .await?
        {
            error!(
                "Book {} has every copy on the shelf while loan {} was still open",
                loan.book_id().as_ref(),
                dto.loan_id
            );
            connection.roll_back().await?;
            return Err(Report::new(KernelError::Internal).attach_printable(format!(
                "Inventory of book {} disagrees with its loans",
                loan.book_id().as_ref()
            )));
        }

        let title = book_title(self, &mut connection, loan.book_id()).await?;
        let name = user_name(self, &mut connection, loan.user_id()).await?;
        connection.commit().await?;

        info!("Loan {} closed", dto.loan_id);
        Ok(LoanDto::new(loan.close(returned_at), title, name))
    }
}

impl<T> ReturnService for T where
    T: DependOnLoanQuery
        + DependOnLoanModifier
        + DependOnBookModifier
        + DependOnBookQuery
        + DependOnUserQuery
{
}
