use application::transfer::{
    CreateBookDto, DeleteBookDto, GetAllBookDto, GetBookDto, UpdateBookDto,
};
use error_stack::Report;
use garde::Validate;
use kernel::interface::query::BookOrder;
use kernel::prelude::entity::{SelectLimit, SelectOffset};
use kernel::KernelError;
use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::controller::{Intake, TryIntake};
use crate::route::{calendar_date, check_page, invalid};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    #[garde(length(min = 1, max = 255))]
    title: String,
    #[garde(length(min = 1, max = 255))]
    author: String,
    #[garde(length(min = 1, max = 13))]
    isbn: String,
    #[garde(range(min = 1))]
    page_count: i32,
    #[serde(default)]
    #[garde(length(max = 255))]
    publisher: String,
    #[serde(default, with = "calendar_date::option")]
    #[garde(skip)]
    publication_date: Option<Date>,
    #[serde(default)]
    #[garde(skip)]
    description: String,
    #[garde(range(min = 0))]
    available_copies: Option<i32>,
    #[garde(range(min = 1))]
    total_copies: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRequest {
    #[garde(length(min = 1, max = 255))]
    title: Option<String>,
    #[garde(length(min = 1, max = 255))]
    author: Option<String>,
    #[garde(length(min = 1, max = 13))]
    isbn: Option<String>,
    #[garde(range(min = 1))]
    page_count: Option<i32>,
    #[garde(length(max = 255))]
    publisher: Option<String>,
    #[serde(default, with = "calendar_date::option")]
    #[garde(skip)]
    publication_date: Option<Date>,
    #[garde(skip)]
    description: Option<String>,
    #[garde(range(min = 0))]
    available_copies: Option<i32>,
    #[garde(range(min = 1))]
    total_copies: Option<i32>,
}

#[derive(Debug)]
pub struct DeleteRequest {
    id: Uuid,
}

impl DeleteRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

// I want to use primitive type(i32) in these fields, but default attribute not supported for literals(https://github.com/serde-rs/serde/issues/368)
#[derive(Debug, Deserialize)]
pub struct GetAllRequest {
    title: Option<String>,
    author: Option<String>,
    isbn: Option<String>,
    search: Option<String>,
    #[serde(default)]
    available_only: bool,
    /// `title`, `author` or `available_copies`, prefixed with `-` to reverse.
    ordering: Option<String>,
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

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub struct Transformer;

impl TryIntake<CreateRequest> for Transformer {
    type To = CreateBookDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: CreateRequest) -> Result<Self::To, Self::Error> {
        input.validate().map_err(invalid)?;
        Ok(CreateBookDto {
            title: input.title,
            author: input.author,
            isbn: input.isbn,
            page_count: input.page_count,
            publisher: input.publisher,
            publication_date: input.publication_date,
            description: input.description,
            available_copies: input.available_copies,
            total_copies: input.total_copies,
        })
    }
}

impl TryIntake<(Uuid, UpdateRequest)> for Transformer {
    type To = UpdateBookDto;
    type Error = Report<KernelError>;
    fn emit(&self, (id, input): (Uuid, UpdateRequest)) -> Result<Self::To, Self::Error> {
        input.validate().map_err(invalid)?;
        if let (Some(available), Some(total)) = (input.available_copies, input.total_copies) {
            if available > total {
                return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                    "available copies ({available}) exceed total copies ({total})"
                )));
            }
        }
        Ok(UpdateBookDto {
            id,
            title: input.title,
            author: input.author,
            isbn: input.isbn,
            page_count: input.page_count,
            publisher: input.publisher,
            publication_date: input.publication_date,
            description: input.description,
            available_copies: input.available_copies,
            total_copies: input.total_copies,
        })
    }
}

impl Intake<DeleteRequest> for Transformer {
    type To = DeleteBookDto;
    fn emit(&self, input: DeleteRequest) -> Self::To {
        DeleteBookDto { id: input.id }
    }
}

impl Intake<GetRequest> for Transformer {
    type To = GetBookDto;
    fn emit(&self, input: GetRequest) -> Self::To {
        GetBookDto { id: input.id }
    }
}

impl TryIntake<GetAllRequest> for Transformer {
    type To = GetAllBookDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: GetAllRequest) -> Result<Self::To, Self::Error> {
        check_page(&input.limit, &input.offset)?;
        let order = non_blank(input.ordering)
            .map(|ordering| ordering.trim().parse::<BookOrder>())
            .transpose()?;
        Ok(GetAllBookDto {
            title: non_blank(input.title),
            author: non_blank(input.author),
            isbn: non_blank(input.isbn),
            search: non_blank(input.search),
            available_only: input.available_only,
            order,
            limit: input.limit,
            offset: input.offset,
        })
    }
}
