use application::transfer::{BorrowDto, GetAllLoanDto, GetLoanDto, ReturnDto};
use error_stack::Report;
use kernel::prelude::entity::{LoanDuration, SelectLimit, SelectOffset};
use kernel::KernelError;
use serde::Deserialize;
use uuid::Uuid;

use crate::controller::{Intake, TryIntake};
use crate::route::check_page;

#[derive(Debug, Deserialize)]
pub struct BorrowRequest {
    book_id: Uuid,
    duration_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    loan_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GetAllRequest {
    user_id: Option<Uuid>,
    book_id: Option<Uuid>,
    is_active: Option<bool>,
    is_overdue: Option<bool>,
    #[serde(default)]
    limit: SelectLimit,
    #[serde(default)]
    offset: SelectOffset,
}

#[derive(Debug)]
pub struct GetRequest {
    id: Uuid,
}

impl GetRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Fills in the configured loan length when a borrow request leaves it out.
pub struct Transformer {
    default: LoanDuration,
}

impl Transformer {
    pub fn new(default: LoanDuration) -> Self {
        Self { default }
    }
}

impl Intake<BorrowRequest> for Transformer {
    type To = BorrowDto;
    fn emit(&self, input: BorrowRequest) -> Self::To {
        BorrowDto {
            book_id: input.book_id,
            duration_days: input.duration_days.unwrap_or(self.default.days()),
        }
    }
}

impl Intake<ReturnRequest> for Transformer {
    type To = ReturnDto;
    fn emit(&self, input: ReturnRequest) -> Self::To {
        ReturnDto {
            loan_id: input.loan_id,
        }
    }
}

impl Intake<GetRequest> for Transformer {
    type To = GetLoanDto;
    fn emit(&self, input: GetRequest) -> Self::To {
        GetLoanDto { id: input.id }
    }
}

impl TryIntake<GetAllRequest> for Transformer {
    type To = GetAllLoanDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: GetAllRequest) -> Result<Self::To, Self::Error> {
        check_page(&input.limit, &input.offset)?;
        Ok(GetAllLoanDto {
            user_id: input.user_id,
            book_id: input.book_id,
            is_active: input.is_active,
            is_overdue: input.is_overdue,
            limit: input.limit,
            offset: input.offset,
        })
    }
}
