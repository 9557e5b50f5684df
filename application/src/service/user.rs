use error_stack::Report;
use tracing::info;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{DependOnUserQuery, UserQuery};
use kernel::interface::update::{DependOnUserModifier, UserModifier};
use kernel::prelude::entity::{
    stored_now, CreatedAt, User, UserEmail, UserId, UserName, UserProfile, UserRole,
};
use kernel::prelude::policy::{Capability, Operation};
use kernel::KernelError;

use crate::transfer::{
    CreateUserDto, DeleteUserDto, GetAllUserDto, GetUserDto, UpdateUserDto, UserDto,
};

#[async_trait::async_trait]
pub trait ResolveActorService: 'static + Sync + Send + DependOnUserQuery {
    /// Maps the forwarded caller id to a capability. No id means an anonymous caller.
    async fn resolve_actor(&self, id: Option<Uuid>) -> error_stack::Result<Capability, KernelError> {
        let Some(id) = id else {
            return Ok(Capability::Anonymous);
        };
        let mut connection = self.database_connection().transact().await?;
        let user = self
            .user_query()
            .find_by_id(&mut connection, &UserId::new(id))
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::Unauthorized)
                    .attach_printable(format!("No user is registered as {id}"))
            })?;
        Ok(Capability::of(&user))
    }
}

impl<T> ResolveActorService for T where T: DependOnUserQuery {}

#[async_trait::async_trait]
pub trait GetUserService: 'static + Sync + Send + DependOnUserQuery {
    async fn get_user(
        &self,
        actor: &Capability,
        dto: GetUserDto,
    ) -> error_stack::Result<Option<UserDto>, KernelError> {
        let id = UserId::new(dto.id);
        actor.authorize(Operation::ReadUser(&id))?;

        let mut connection = self.database_connection().transact().await?;
        let Some(user) = self.user_query().find_by_id(&mut connection, &id).await? else {
            return Ok(None);
        };
        let active = self
            .user_query()
            .count_active_loans(&mut connection, &id)
            .await?;

        Ok(Some(UserDto::new(user, active)))
    }

    async fn get_users(
        &self,
        actor: &Capability,
        dto: GetAllUserDto,
    ) -> error_stack::Result<Vec<UserDto>, KernelError> {
        actor.authorize(Operation::ListUsers)?;

        let mut connection = self.database_connection().transact().await?;
        let users = self
            .user_query()
            .find_all(&mut connection, &dto.limit, &dto.offset)
            .await?;

        let mut found = Vec::with_capacity(users.len());
        for user in users {
            let active = self
                .user_query()
                .count_active_loans(&mut connection, user.id())
                .await?;
            found.push(UserDto::new(user, active));
        }
        Ok(found)
    }
}

impl<T> GetUserService for T where T: DependOnUserQuery {}

#[async_trait::async_trait]
pub trait RegisterUserService: 'static + Sync + Send + DependOnUserModifier {
    #[tracing::instrument(skip(self))]
    async fn register_user(
        &self,
        actor: &Capability,
        dto: CreateUserDto,
    ) -> error_stack::Result<UserDto, KernelError> {
        actor.authorize(Operation::RegisterUser {
            staff: dto.is_staff,
        })?;

        let user = User::new(
            UserId::new(Uuid::new_v4()),
            UserName::new(dto.name),
            UserEmail::new(dto.email),
            UserRole::from(dto.is_staff),
            UserProfile::new(
                dto.first_name,
                dto.last_name,
                dto.phone_number,
                dto.address,
                dto.date_of_birth,
            ),
            CreatedAt::new(stored_now()),
        );

        let mut connection = self.database_connection().transact().await?;
        self.user_modifier().create(&mut connection, &user).await?;
        connection.commit().await?;

        info!("User {} registered", user.id().as_ref());
        Ok(UserDto::new(user, 0))
    }
}

impl<T> RegisterUserService for T where T: DependOnUserModifier {}

#[async_trait::async_trait]
pub trait UpdateUserService:
    'static + Sync + Send + DependOnUserQuery + DependOnUserModifier
{
    async fn update_user(
        &self,
        actor: &Capability,
        dto: UpdateUserDto,
    ) -> error_stack::Result<Option<UserDto>, KernelError> {
        let id = UserId::new(dto.id);
        actor.authorize(Operation::UpdateUser {
            target: &id,
            changes_role: dto.is_staff.is_some(),
        })?;

        let mut connection = self.database_connection().transact().await?;
        let Some(user) = self
            .user_query()
            .find_by_id_for_update(&mut connection, &id)
            .await?
        else {
            return Ok(None);
        };

        let mut user = user.into_destruct();
        let mut profile = user.profile.into_destruct();
        if let Some(email) = dto.email {
            user.email = UserEmail::new(email);
        }
        if let Some(is_staff) = dto.is_staff {
            user.role = UserRole::from(is_staff);
        }
        if let Some(first_name) = dto.first_name {
            profile.first_name = first_name;
        }
        if let Some(last_name) = dto.last_name {
            profile.last_name = last_name;
        }
        if let Some(phone_number) = dto.phone_number {
            profile.phone_number = phone_number;
        }
        if let Some(address) = dto.address {
            profile.address = address;
        }
        if let Some(date_of_birth) = dto.date_of_birth {
            profile.date_of_birth = Some(date_of_birth);
        }
        user.profile = profile.freeze();
        let user = user.freeze();

        self.user_modifier().update(&mut connection, &user).await?;
        let active = self
            .user_query()
            .count_active_loans(&mut connection, &id)
            .await?;
        connection.commit().await?;

        Ok(Some(UserDto::new(user, active)))
    }
}

impl<T> UpdateUserService for T where T: DependOnUserQuery + DependOnUserModifier {}

#[async_trait::async_trait]
pub trait DeleteUserService:
    'static + Sync + Send + DependOnUserQuery + DependOnUserModifier
{
    #[tracing::instrument(skip(self))]
    async fn delete_user(
        &self,
        actor: &Capability,
        dto: DeleteUserDto,
    ) -> error_stack::Result<(), KernelError> {
        actor.authorize(Operation::DeleteUser)?;

        let mut connection = self.database_connection().transact().await?;
        let id = UserId::new(dto.id);
        // Loan inserts take a key-share lock on the user row, so holding this lock keeps
        // a concurrent borrow from slipping in between the count and the delete.
        if self
            .user_query()
            .find_by_id_for_update(&mut connection, &id)
            .await?
            .is_none()
        {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("User {} does not exist", dto.id)));
        }

        let active = self
            .user_query()
            .count_active_loans(&mut connection, &id)
            .await?;
        if active > 0 {
            return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                "User {} still has {active} active loans",
                dto.id
            )));
        }

        self.user_modifier().delete(&mut connection, &id).await?;
        connection.commit().await?;

        info!("User {} deleted", dto.id);
        Ok(())
    }
}

impl<T> DeleteUserService for T where T: DependOnUserQuery + DependOnUserModifier {}
