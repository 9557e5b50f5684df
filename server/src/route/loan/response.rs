use application::transfer::LoanDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::controller::Exhaust;

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    book_title: String,
    user_name: String,
    #[serde(with = "time::serde::rfc3339")]
    borrowed_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    due_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    returned_at: Option<OffsetDateTime>,
    is_active: bool,
    is_overdue: bool,
}

impl From<LoanDto> for LoanResponse {
    fn from(value: LoanDto) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            book_id: value.book_id,
            book_title: value.book_title,
            user_name: value.user_name,
            borrowed_at: value.borrowed_at,
            due_at: value.due_at,
            returned_at: value.returned_at,
            is_active: value.is_active,
            is_overdue: value.is_overdue,
        }
    }
}

impl IntoResponse for LoanResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub struct Presenter;

impl Exhaust<LoanDto> for Presenter {
    type To = LoanResponse;
    fn emit(&self, input: LoanDto) -> Self::To {
        LoanResponse::from(input)
    }
}

impl Exhaust<Option<LoanDto>> for Presenter {
    type To = Option<LoanResponse>;
    fn emit(&self, input: Option<LoanDto>) -> Self::To {
        input.map(LoanResponse::from)
    }
}

impl Exhaust<Vec<LoanDto>> for Presenter {
    type To = Json<Vec<LoanResponse>>;
    fn emit(&self, input: Vec<LoanDto>) -> Self::To {
        Json(input.into_iter().map(LoanResponse::from).collect())
    }
}
