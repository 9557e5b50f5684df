use application::transfer::BookDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::controller::Exhaust;
use crate::route::calendar_date;

#[derive(Debug, Serialize)]
pub struct BookResponse {
    id: Uuid,
    title: String,
    author: String,
    isbn: String,
    page_count: i32,
    publisher: String,
    #[serde(with = "calendar_date::option")]
    publication_date: Option<Date>,
    description: String,
    available_copies: i32,
    total_copies: i32,
    is_available: bool,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl From<BookDto> for BookResponse {
    fn from(value: BookDto) -> Self {
        Self {
            id: value.id,
            title: value.title,
            author: value.author,
            isbn: value.isbn,
            page_count: value.page_count,
            publisher: value.publisher,
            publication_date: value.publication_date,
            description: value.description,
            available_copies: value.available_copies,
            total_copies: value.total_copies,
            is_available: value.is_available,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl IntoResponse for BookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub struct Presenter;

impl Exhaust<BookDto> for Presenter {
    type To = BookResponse;
    fn emit(&self, input: BookDto) -> Self::To {
        BookResponse::from(input)
    }
}

impl Exhaust<Option<BookDto>> for Presenter {
    type To = Option<BookResponse>;
    fn emit(&self, input: Option<BookDto>) -> Self::To {
        input.map(BookResponse::from)
    }
}

impl Exhaust<Vec<BookDto>> for Presenter {
    type To = Json<Vec<BookResponse>>;
    fn emit(&self, input: Vec<BookDto>) -> Self::To {
        Json(input.into_iter().map(BookResponse::from).collect())
    }
}

impl Exhaust<()> for Presenter {
    type To = StatusCode;
    fn emit(&self, _: ()) -> Self::To {
        StatusCode::NO_CONTENT
    }
}
