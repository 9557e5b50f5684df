use error_stack::Report;

use crate::KernelError;

/// Copy inventory of a single book.
///
/// `0 <= available <= total` and `total >= 1` hold for every value of this type,
/// so a stored book can never report more free copies than it owns.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BookCopies {
    available: i32,
    total: i32,
}

impl BookCopies {
    pub fn new(
        available: impl Into<i32>,
        total: impl Into<i32>,
    ) -> error_stack::Result<Self, KernelError> {
        let available = available.into();
        let total = total.into();
        if total < 1 {
            return Err(Report::new(KernelError::InvalidInput)
                .attach_printable(format!("Total copies must be at least 1 (got {total})")));
        }
        if available < 0 {
            return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                "Available copies cannot be negative (got {available})"
            )));
        }
        if available > total {
            return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                "Available copies ({available}) cannot exceed total copies ({total})"
            )));
        }
        Ok(Self { available, total })
    }

    /// Inventory with every copy on the shelf.
    pub fn full(total: impl Into<i32>) -> error_stack::Result<Self, KernelError> {
        let total = total.into();
        Self::new(total, total)
    }

    pub fn available(&self) -> i32 {
        self.available
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn on_loan(&self) -> i32 {
        self.total - self.available
    }

    pub fn is_available(&self) -> bool {
        self.available > 0
    }

    /// One copy leaves the shelf. `None` when nothing is left to lend.
    pub fn take(self) -> Option<Self> {
        self.is_available().then(|| Self {
            available: self.available - 1,
            ..self
        })
    }

    /// One copy comes back. `None` when every copy is already on the shelf.
    pub fn restore(self) -> Option<Self> {
        (self.available < self.total).then(|| Self {
            available: self.available + 1,
            ..self
        })
    }

    /// Changes the number of owned copies while keeping the copies on loan untouched.
    pub fn resize(self, total: impl Into<i32>) -> error_stack::Result<Self, KernelError> {
        let total = total.into();
        let on_loan = self.on_loan();
        if total < on_loan {
            return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                "Cannot shrink to {total} copies while {on_loan} are on loan"
            )));
        }
        Self::new(total - on_loan, total)
    }
}
