use application::transfer::{CreateUserDto, DeleteUserDto, GetAllUserDto, GetUserDto, UpdateUserDto};
use error_stack::Report;
use garde::Validate;
use kernel::prelude::entity::{SelectLimit, SelectOffset};
use kernel::KernelError;
use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::controller::{Intake, TryIntake};
use crate::route::{calendar_date, check_page, invalid};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    #[garde(length(min = 1, max = 150))]
    name: String,
    #[garde(email)]
    email: String,
    #[serde(default)]
    #[garde(skip)]
    is_staff: bool,
    #[serde(default)]
    #[garde(length(max = 150))]
    first_name: String,
    #[serde(default)]
    #[garde(length(max = 150))]
    last_name: String,
    #[serde(default)]
    #[garde(length(max = 20))]
    phone_number: String,
    #[serde(default)]
    #[garde(skip)]
    address: String,
    #[serde(default, with = "calendar_date::option")]
    #[garde(skip)]
    date_of_birth: Option<Date>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRequest {
    #[garde(email)]
    email: Option<String>,
    #[garde(skip)]
    is_staff: Option<bool>,
    #[garde(length(max = 150))]
    first_name: Option<String>,
    #[garde(length(max = 150))]
    last_name: Option<String>,
    #[garde(length(max = 20))]
    phone_number: Option<String>,
    #[garde(skip)]
    address: Option<String>,
    #[serde(default, with = "calendar_date::option")]
    #[garde(skip)]
    date_of_birth: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct GetAllRequest {
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

#[derive(Debug)]
pub struct DeleteRequest {
    id: Uuid,
}

impl DeleteRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

pub struct Transformer;

impl TryIntake<CreateRequest> for Transformer {
    type To = CreateUserDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: CreateRequest) -> Result<Self::To, Self::Error> {
        input.validate().map_err(invalid)?;
        Ok(CreateUserDto {
            name: input.name,
            email: input.email,
            is_staff: input.is_staff,
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            address: input.address,
            date_of_birth: input.date_of_birth,
        })
    }
}

impl TryIntake<(Uuid, UpdateRequest)> for Transformer {
    type To = UpdateUserDto;
    type Error = Report<KernelError>;
    fn emit(&self, (id, input): (Uuid, UpdateRequest)) -> Result<Self::To, Self::Error> {
        input.validate().map_err(invalid)?;
        Ok(UpdateUserDto {
            id,
            email: input.email,
            is_staff: input.is_staff,
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            address: input.address,
            date_of_birth: input.date_of_birth,
        })
    }
}

impl TryIntake<GetAllRequest> for Transformer {
    type To = GetAllUserDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: GetAllRequest) -> Result<Self::To, Self::Error> {
        check_page(&input.limit, &input.offset)?;
        Ok(GetAllUserDto {
            limit: input.limit,
            offset: input.offset,
        })
    }
}

impl Intake<GetRequest> for Transformer {
    type To = GetUserDto;
    fn emit(&self, input: GetRequest) -> Self::To {
        GetUserDto { id: input.id }
    }
}

impl Intake<DeleteRequest> for Transformer {
    type To = DeleteUserDto;
    fn emit(&self, input: DeleteRequest) -> Self::To {
        DeleteUserDto { id: input.id }
    }
}
