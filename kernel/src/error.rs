use std::fmt::Display;

use error_stack::Context;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KernelError {
    NotFound,
    Unavailable,
    AlreadyReturned,
    Forbidden,
    Unauthorized,
    InvalidInput,
    Concurrency,
    Timeout,
    Internal,
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::NotFound => write!(f, "Requested resource was not found"),
            KernelError::Unavailable => write!(f, "No copy of the book is available"),
            KernelError::AlreadyReturned => write!(f, "Book already returned"),
            KernelError::Forbidden => write!(f, "Operation is not permitted"),
            KernelError::Unauthorized => write!(f, "Authentication required"),
            KernelError::InvalidInput => write!(f, "Invalid input"),
            KernelError::Concurrency => write!(f, "Concurrency error"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}
