mod duration;
mod id;
mod period;
mod returned_at;

pub use self::{duration::*, id::*, period::*, returned_at::*};
use crate::entity::{BookId, UserId};
use destructure::Destructure;
use time::OffsetDateTime;
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure)]
pub struct Loan {
    id: LoanId,
    user_id: UserId,
    book_id: BookId,
    borrowed_at: BorrowedAt,
    due_at: DueAt,
    returned_at: Option<ReturnedAt>,
}

impl Loan {
    pub fn new(
        id: LoanId,
        user_id: UserId,
        book_id: BookId,
        borrowed_at: BorrowedAt,
        due_at: DueAt,
        returned_at: Option<ReturnedAt>,
    ) -> Self {
        Self {
            id,
            user_id,
            book_id,
            borrowed_at,
            due_at,
            returned_at,
        }
    }

    /// Starts a new loan at `now`, due after `duration`.
    pub fn open(
        id: LoanId,
        user_id: UserId,
        book_id: BookId,
        now: OffsetDateTime,
        duration: &LoanDuration,
    ) -> Self {
        Self::new(
            id,
            user_id,
            book_id,
            BorrowedAt::new(now),
            duration.due_from(now),
            None,
        )
    }

    pub fn close(self, returned_at: ReturnedAt) -> Self {
        Self {
            returned_at: Some(returned_at),
            ..self
        }
    }

    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn is_overdue_at(&self, now: OffsetDateTime) -> bool {
        self.is_active() && now > *self.due_at.as_ref()
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(OffsetDateTime::now_utc())
    }
}
