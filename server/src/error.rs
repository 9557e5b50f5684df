use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use error_stack::{AttachmentKind, FrameKind, Report};
use kernel::KernelError;
use serde::Serialize;
use std::process::{ExitCode, Termination};

#[derive(Debug)]
pub struct StackTrace(Report<KernelError>);

impl From<Report<KernelError>> for StackTrace {
    fn from(e: Report<KernelError>) -> Self {
        StackTrace(e)
    }
}

impl Termination for StackTrace {
    fn report(self) -> ExitCode {
        self.0.report()
    }
}

#[derive(Debug)]
pub struct ErrorStatus(Report<KernelError>);

impl From<Report<KernelError>> for ErrorStatus {
    fn from(e: Report<KernelError>) -> Self {
        ErrorStatus(e)
    }
}

impl From<KernelError> for ErrorStatus {
    fn from(e: KernelError) -> Self {
        ErrorStatus(Report::new(e))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn status_of(error: &KernelError) -> StatusCode {
    match error {
        KernelError::NotFound => StatusCode::NOT_FOUND,
        KernelError::Unavailable | KernelError::Concurrency => StatusCode::CONFLICT,
        KernelError::AlreadyReturned | KernelError::InvalidInput => StatusCode::BAD_REQUEST,
        KernelError::Forbidden => StatusCode::FORBIDDEN,
        KernelError::Unauthorized => StatusCode::UNAUTHORIZED,
        KernelError::Timeout => StatusCode::REQUEST_TIMEOUT,
        KernelError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_of(error: &KernelError) -> &'static str {
    match error {
        KernelError::NotFound => "not_found",
        KernelError::Unavailable => "unavailable",
        KernelError::AlreadyReturned => "already_returned",
        KernelError::Forbidden => "forbidden",
        KernelError::Unauthorized => "unauthorized",
        KernelError::InvalidInput => "invalid_input",
        KernelError::Concurrency => "concurrency",
        KernelError::Timeout => "timeout",
        KernelError::Internal => "internal",
    }
}

impl ErrorStatus {
    /// Latest printable attachment, which is the most specific description of a client error.
    fn message(&self) -> String {
        let context = self.0.current_context();
        if status_of(context).is_server_error() {
            return context.to_string();
        }
        self.0
            .frames()
            .find_map(|frame| match frame.kind() {
                FrameKind::Attachment(AttachmentKind::Printable(attachment)) => {
                    Some(attachment.to_string())
                }
                _ => None,
            })
            .unwrap_or_else(|| context.to_string())
    }
}

impl IntoResponse for ErrorStatus {
    fn into_response(self) -> Response {
        let context = self.0.current_context();
        let status = status_of(context);
        if status.is_server_error() {
            tracing::error!("{:?}", self.0);
        } else {
            tracing::debug!("{:?}", self.0);
        }
        let body = ErrorBody {
            error: kind_of(context),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
