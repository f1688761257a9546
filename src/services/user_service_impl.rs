//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::error;

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, UserChanges};
use crate::models::UserRole;
use crate::services::password_policy::PasswordPolicy;
use crate::services::user_service::{
    DirectoryError, RegisterRequest, UpdateRequest, UserService, UserView,
};

pub struct SeaOrmUserService {
    store: Store,
    policy: PasswordPolicy,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, policy: PasswordPolicy, security: SecurityConfig) -> Self {
        Self {
            store,
            policy,
            security,
        }
    }
}

/// Resolves 1-based client role ids, defaulting to the single base USER
/// role when none were supplied. Any unresolvable id fails the whole
/// operation; duplicates collapse to one assignment.
fn resolve_roles(ids: Option<&[i32]>) -> Result<Vec<UserRole>, DirectoryError> {
    let Some(ids) = ids else {
        return Ok(vec![UserRole::User]);
    };

    if ids.is_empty() {
        return Ok(vec![UserRole::User]);
    }

    let mut roles = Vec::with_capacity(ids.len());
    for &id in ids {
        let role = UserRole::from_client_id(id).ok_or(DirectoryError::UnknownRole(id))?;
        if !roles.contains(&role) {
            roles.push(role);
        }
    }

    Ok(roles)
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(
        &self,
        request: RegisterRequest,
        acting: &str,
    ) -> Result<UserView, DirectoryError> {
        // Duplicate checks run in a fixed order so error precedence is
        // deterministic: username, then email, then mobile.
        if self.store.user_exists_by_username(&request.username).await? {
            error!("Duplicate username on registration");
            return Err(DirectoryError::DuplicateField { field: "username" });
        }

        if self.store.user_exists_by_email(&request.email).await? {
            error!("Duplicate email on registration");
            return Err(DirectoryError::DuplicateField { field: "email" });
        }

        if self.store.user_exists_by_mobile(&request.mobile).await? {
            error!("Duplicate mobile on registration");
            return Err(DirectoryError::DuplicateField { field: "mobile" });
        }

        if !self.policy.is_valid(&request.password) {
            error!("Invalid password format on registration");
            return Err(DirectoryError::InvalidFormat(
                self.policy.message().to_string(),
            ));
        }

        // Roles must all resolve before anything is persisted; there is no
        // partially created user.
        let roles = resolve_roles(request.roles.as_deref())?;

        let new = NewUser {
            first_name: request.first_name,
            last_name: request.last_name,
            username: request.username,
            email: request.email,
            mobile: request.mobile,
            password: request.password,
            profile_pic: request.profile_pic,
            created_by: acting.to_string(),
        };

        let user = self.store.insert_user(&new, &roles, &self.security).await?;

        Ok(UserView::from(user))
    }

    async fn update(
        &self,
        request: UpdateRequest,
        acting: &str,
    ) -> Result<UserView, DirectoryError> {
        let existing = self
            .store
            .get_user_by_id(request.id)
            .await?
            .ok_or_else(|| {
                DirectoryError::NotFound(format!("User not found with id: {}", request.id))
            })?;

        if self
            .store
            .user_exists_by_email_except(existing.id, &request.email)
            .await?
        {
            error!("Duplicate email on profile update");
            return Err(DirectoryError::DuplicateField { field: "email" });
        }

        if self
            .store
            .user_exists_by_mobile_except(existing.id, &request.mobile)
            .await?
        {
            error!("Duplicate mobile on profile update");
            return Err(DirectoryError::DuplicateField { field: "mobile" });
        }

        // Absent roles keep the current assignments; an explicit list
        // replaces them.
        let roles = match request.roles.as_deref() {
            Some(ids) => resolve_roles(Some(ids))?,
            None => existing.roles.clone(),
        };

        let changes = UserChanges {
            id: existing.id,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            mobile: request.mobile,
            updated_by: acting.to_string(),
        };

        let user = self.store.update_user(&changes, &roles).await?;

        Ok(UserView::from(user))
    }

    async fn list(&self) -> Result<Vec<UserView>, DirectoryError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserView::from).collect())
    }
}
