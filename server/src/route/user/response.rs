use application::transfer::UserDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::controller::Exhaust;
use crate::route::calendar_date;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    id: Uuid,
    name: String,
    email: String,
    is_staff: bool,
    first_name: String,
    last_name: String,
    phone_number: String,
    address: String,
    #[serde(with = "calendar_date::option")]
    date_of_birth: Option<Date>,
    active_loans_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl From<UserDto> for UserResponse {
    fn from(value: UserDto) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            is_staff: value.is_staff,
            first_name: value.first_name,
            last_name: value.last_name,
            phone_number: value.phone_number,
            address: value.address,
            date_of_birth: value.date_of_birth,
            active_loans_count: value.active_loans_count,
            created_at: value.created_at,
        }
    }
}

impl IntoResponse for UserResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub struct Presenter;

impl Exhaust<UserDto> for Presenter {
    type To = UserResponse;
    fn emit(&self, input: UserDto) -> Self::To {
        UserResponse::from(input)
    }
}

impl Exhaust<Option<UserDto>> for Presenter {
    type To = Option<UserResponse>;
    fn emit(&self, input: Option<UserDto>) -> Self::To {
        input.map(UserResponse::from)
    }
}

impl Exhaust<Vec<UserDto>> for Presenter {
    type To = Json<Vec<UserResponse>>;
    fn emit(&self, input: Vec<UserDto>) -> Self::To {
        Json(input.into_iter().map(UserResponse::from).collect())
    }
}

impl Exhaust<()> for Presenter {
    type To = StatusCode;
    fn emit(&self, _: ()) -> Self::To {
        StatusCode::NO_CONTENT
    }
}
