use time::{Date, OffsetDateTime};
use uuid::Uuid;

use kernel::prelude::entity::{
    DestructUser, DestructUserProfile, SelectLimit, SelectOffset, User,
};

#[derive(Debug, Clone)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_staff: bool,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub date_of_birth: Option<Date>,
    pub active_loans_count: i64,
    pub created_at: OffsetDateTime,
}

impl UserDto {
    pub fn new(user: User, active_loans_count: i64) -> Self {
        let DestructUser {
            id,
            name,
            email,
            role,
            profile,
            created_at,
        } = user.into_destruct();
        let DestructUserProfile {
            first_name,
            last_name,
            phone_number,
            address,
            date_of_birth,
        } = profile.into_destruct();
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            is_staff: role.is_staff(),
            first_name,
            last_name,
            phone_number,
            address,
            date_of_birth,
            active_loans_count,
            created_at: created_at.into(),
        }
    }
}

#[derive(Debug)]
pub struct GetUserDto {
    pub id: Uuid,
}

#[derive(Debug, Default)]
pub struct GetAllUserDto {
    pub limit: SelectLimit,
    pub offset: SelectOffset,
}

#[derive(Debug, Default)]
pub struct CreateUserDto {
    pub name: String,
    pub email: String,
    pub is_staff: bool,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub date_of_birth: Option<Date>,
}

#[derive(Debug, Default)]
pub struct UpdateUserDto {
    pub id: Uuid,
    pub email: Option<String>,
    pub is_staff: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<Date>,
}

#[derive(Debug)]
pub struct DeleteUserDto {
    pub id: Uuid,
}
