mod email;
mod id;
mod name;
mod profile;
mod role;

pub use self::{email::*, id::*, name::*, profile::*, role::*};
use crate::entity::common::CreatedAt;
use destructure::Destructure;
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, Destructure, References)]
pub struct User {
    id: UserId,
    name: UserName,
    email: UserEmail,
    role: UserRole,
    profile: UserProfile,
    created_at: CreatedAt<User>,
}

impl User {
    pub fn new(
        id: UserId,
        name: UserName,
        email: UserEmail,
        role: UserRole,
        profile: UserProfile,
        created_at: CreatedAt<User>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            profile,
            created_at,
        }
    }
}
