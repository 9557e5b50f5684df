use error_stack::Report;

use crate::entity::{Loan, User, UserId};
use crate::KernelError;

/// Authorization level of whoever issued a request.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Capability {
    Anonymous,
    Member(UserId),
    Staff(UserId),
}

#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    ReadCatalog,
    WriteCatalog,
    Borrow,
    ListLoans,
    ReadLoan(&'a Loan),
    ReturnLoan(&'a Loan),
    RegisterUser { staff: bool },
    ListUsers,
    ReadUser(&'a UserId),
    UpdateUser { target: &'a UserId, changes_role: bool },
    DeleteUser,
}

impl Operation<'_> {
    fn name(&self) -> &'static str {
        match self {
            Operation::ReadCatalog => "read catalog",
            Operation::WriteCatalog => "write catalog",
            Operation::Borrow => "borrow",
            Operation::ListLoans => "list loans",
            Operation::ReadLoan(_) => "read loan",
            Operation::ReturnLoan(_) => "return loan",
            Operation::RegisterUser { .. } => "register user",
            Operation::ListUsers => "list users",
            Operation::ReadUser(_) => "read user",
            Operation::UpdateUser { .. } => "update user",
            Operation::DeleteUser => "delete user",
        }
    }
}

/// Which loans a caller may list.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LoanScope {
    All,
    Own(UserId),
}

impl Capability {
    pub fn of(user: &User) -> Self {
        if user.role().is_staff() {
            Capability::Staff(user.id().clone())
        } else {
            Capability::Member(user.id().clone())
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Capability::Anonymous => None,
            Capability::Member(id) | Capability::Staff(id) => Some(id),
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Capability::Staff(_))
    }

    /// The authenticated identity, or `Unauthorized`.
    pub fn require_identity(&self) -> error_stack::Result<&UserId, KernelError> {
        self.user_id().ok_or_else(|| {
            Report::new(KernelError::Unauthorized)
                .attach_printable("Anonymous callers have no identity")
        })
    }

    pub fn authorize(&self, operation: Operation<'_>) -> error_stack::Result<(), KernelError> {
        let permitted = match (self, operation) {
            (_, Operation::ReadCatalog) => true,
            (_, Operation::RegisterUser { staff: false }) => true,
            (Capability::Anonymous, _) => {
                return Err(Report::new(KernelError::Unauthorized)
                    .attach_printable(format!("Anonymous callers cannot {}", operation.name())))
            }
            (Capability::Staff(_), _) => true,
            (Capability::Member(_), Operation::Borrow | Operation::ListLoans) => true,
            (Capability::Member(id), Operation::ReadLoan(loan) | Operation::ReturnLoan(loan)) => {
                loan.user_id() == id
            }
            (Capability::Member(id), Operation::ReadUser(target)) => target == id,
            (
                Capability::Member(id),
                Operation::UpdateUser {
                    target,
                    changes_role,
                },
            ) => target == id && !changes_role,
            (Capability::Member(_), _) => false,
        };
        if permitted {
            Ok(())
        } else {
            Err(Report::new(KernelError::Forbidden)
                .attach_printable(format!("Caller may not {}", operation.name())))
        }
    }

    /// Borrowing always happens on behalf of the caller itself.
    pub fn borrower(&self) -> error_stack::Result<&UserId, KernelError> {
        self.authorize(Operation::Borrow)?;
        self.require_identity()
    }

    pub fn loan_scope(&self) -> error_stack::Result<LoanScope, KernelError> {
        self.authorize(Operation::ListLoans)?;
        match self {
            Capability::Staff(_) => Ok(LoanScope::All),
            _ => self.require_identity().cloned().map(LoanScope::Own),
        }
    }
}
