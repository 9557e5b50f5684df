use error_stack::Report;
use time::{Duration, OffsetDateTime};

use crate::entity::DueAt;
use crate::KernelError;

/// Lending period in whole days, limited to `MIN_DAYS..=MAX_DAYS`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LoanDuration(i64);

impl LoanDuration {
    pub const MIN_DAYS: i64 = 1;
    pub const MAX_DAYS: i64 = 90;
    pub const DEFAULT_DAYS: i64 = 14;

    pub fn new(days: impl Into<i64>) -> error_stack::Result<Self, KernelError> {
        let days = days.into();
        if !(Self::MIN_DAYS..=Self::MAX_DAYS).contains(&days) {
            return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                "Loan duration must be between {} and {} days (got {days})",
                Self::MIN_DAYS,
                Self::MAX_DAYS
            )));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> i64 {
        self.0
    }

    pub fn due_from(&self, borrowed_at: OffsetDateTime) -> DueAt {
        DueAt::new(borrowed_at + Duration::days(self.0))
    }
}

impl Default for LoanDuration {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}
