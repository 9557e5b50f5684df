mod book;
mod health;
mod loan;
mod user;

pub use self::{book::*, health::*, loan::*, user::*};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use error_stack::Report;
use kernel::prelude::entity::{SelectLimit, SelectOffset};
use kernel::KernelError;

use crate::error::ErrorStatus;

use time::Date;

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

/// 404 with the usual error body when a lookup comes back empty.
fn found_or_404<R: IntoResponse>(found: Option<R>) -> Response {
    found
        .map(IntoResponse::into_response)
        .unwrap_or_else(|| ErrorStatus::from(KernelError::NotFound).into_response())
}

fn created<R: IntoResponse>(response: R) -> Response {
    (StatusCode::CREATED, response).into_response()
}

fn invalid(report: garde::Report) -> Report<KernelError> {
    Report::new(KernelError::InvalidInput).attach_printable(report.to_string())
}

fn check_page(limit: &SelectLimit, offset: &SelectOffset) -> error_stack::Result<(), KernelError> {
    if !limit.is_within_bounds() {
        return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
            "limit must be between 1 and {}",
            SelectLimit::MAX
        )));
    }
    if !offset.is_within_bounds() {
        return Err(Report::new(KernelError::InvalidInput)
            .attach_printable("offset must not be negative"));
    }
    Ok(())
}
