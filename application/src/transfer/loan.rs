use time::OffsetDateTime;
use uuid::Uuid;

use kernel::prelude::entity::{DestructLoan, Loan, SelectLimit, SelectOffset};

#[derive(Debug, Clone)]
pub struct LoanDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrowed_at: OffsetDateTime,
    pub due_at: OffsetDateTime,
    pub returned_at: Option<OffsetDateTime>,
    pub is_active: bool,
    pub is_overdue: bool,
    pub book_title: String,
    pub user_name: String,
}

impl LoanDto {
    pub fn new(value: Loan, book_title: String, user_name: String) -> Self {
        let is_active = value.is_active();
        let is_overdue = value.is_overdue();
        let DestructLoan {
            id,
            user_id,
            book_id,
            borrowed_at,
            due_at,
            returned_at,
        } = value.into_destruct();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            book_id: book_id.into(),
            borrowed_at: borrowed_at.into(),
            due_at: due_at.into(),
            returned_at: returned_at.map(Into::into),
            is_active,
            is_overdue,
            book_title,
            user_name,
        }
    }
}

#[derive(Debug)]
pub struct BorrowDto {
    pub book_id: Uuid,
    pub duration_days: i64,
}

#[derive(Debug)]
pub struct ReturnDto {
    pub loan_id: Uuid,
}

#[derive(Debug)]
pub struct GetLoanDto {
    pub id: Uuid,
}

#[derive(Debug, Default)]
pub struct GetAllLoanDto {
    pub user_id: Option<Uuid>,
    pub book_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub is_overdue: Option<bool>,
    pub limit: SelectLimit,
    pub offset: SelectOffset,
}
