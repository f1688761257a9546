use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{prelude::*, user_roles, users};
use crate::models::UserRole;

/// User data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub profile_pic: Option<String>,
    pub active: bool,
    pub roles: Vec<UserRole>,
    pub created_by: String,
    pub created_at: String,
    pub updated_by: String,
    pub updated_at: String,
}

impl User {
    fn from_model(model: users::Model, roles: Vec<UserRole>) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            username: model.username,
            email: model.email,
            mobile: model.mobile,
            profile_pic: model.profile_pic,
            active: model.active,
            roles,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_by: model.updated_by,
            updated_at: model.updated_at,
        }
    }
}

/// Fields accepted at registration. The password is still plain text here;
/// it is hashed inside the repository and never stored as-is.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub profile_pic: Option<String>,
    pub created_by: String,
}

/// Mutable profile fields. Username and password are deliberately absent.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub updated_by: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn roles_for(&self, user_id: i32) -> Result<Vec<UserRole>> {
        let rows = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .find_also_related(Roles)
            .all(&self.conn)
            .await
            .context("Failed to query user roles")?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, role)| role.and_then(|r| UserRole::from_name(&r.name)))
            .collect())
    }

    async fn hydrate(&self, model: users::Model) -> Result<User> {
        let roles = self.roles_for(model.id).await?;
        Ok(User::from_model(model, roles))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")?;

        match user {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        match user {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        match user {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let models = Users::find()
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(self.hydrate(model).await?);
        }
        Ok(out)
    }

    pub async fn exists_by_username(&self, username: &str) -> Result<bool> {
        let found = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to check username uniqueness")?;

        Ok(found.is_some())
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let found = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to check email uniqueness")?;

        Ok(found.is_some())
    }

    pub async fn exists_by_mobile(&self, mobile: &str) -> Result<bool> {
        let found = Users::find()
            .filter(users::Column::Mobile.eq(mobile))
            .one(&self.conn)
            .await
            .context("Failed to check mobile uniqueness")?;

        Ok(found.is_some())
    }

    /// Uniqueness check for updates; the record being updated is excluded
    /// so a user keeping their own email does not collide with themselves.
    pub async fn exists_by_email_except(&self, user_id: i32, email: &str) -> Result<bool> {
        let found = Users::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::Id.ne(user_id))
            .one(&self.conn)
            .await
            .context("Failed to check email uniqueness")?;

        Ok(found.is_some())
    }

    pub async fn exists_by_mobile_except(&self, user_id: i32, mobile: &str) -> Result<bool> {
        let found = Users::find()
            .filter(users::Column::Mobile.eq(mobile))
            .filter(users::Column::Id.ne(user_id))
            .one(&self.conn)
            .await
            .context("Failed to check mobile uniqueness")?;

        Ok(found.is_some())
    }

    /// Persists a new user and their role assignments. The pre-checks in the
    /// service are not authoritative; the unique indexes reject duplicate
    /// username/email/mobile atomically under concurrent registration.
    pub async fn insert(
        &self,
        new: &NewUser,
        role_ids: &[i32],
        security: &SecurityConfig,
    ) -> Result<User> {
        let password_hash = hash_async(&new.password, security).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            first_name: Set(new.first_name.clone()),
            last_name: Set(new.last_name.clone()),
            username: Set(new.username.clone()),
            email: Set(new.email.clone()),
            mobile: Set(new.mobile.clone()),
            password_hash: Set(password_hash),
            profile_pic: Set(new.profile_pic.clone()),
            active: Set(true),
            created_by: Set(new.created_by.clone()),
            created_at: Set(now.clone()),
            updated_by: Set(new.created_by.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await.context("Failed to insert user")?;

        self.replace_roles(model.id, role_ids).await?;

        self.hydrate(model).await
    }

    /// Applies profile changes and role reassignment. Username and password
    /// are never touched here.
    pub async fn apply_update(&self, changes: &UserChanges, role_ids: &[i32]) -> Result<User> {
        let user = Users::find_by_id(changes.id)
            .one(&self.conn)
            .await
            .context("Failed to load user for update")?
            .ok_or_else(|| anyhow::anyhow!("User {} not found", changes.id))?;

        let mut active: users::ActiveModel = user.into();
        active.first_name = Set(changes.first_name.clone());
        active.last_name = Set(changes.last_name.clone());
        active.email = Set(changes.email.clone());
        active.mobile = Set(changes.mobile.clone());
        active.updated_by = Set(changes.updated_by.clone());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await.context("Failed to update user")?;

        self.replace_roles(model.id, role_ids).await?;

        self.hydrate(model).await
    }

    async fn replace_roles(&self, user_id: i32, role_ids: &[i32]) -> Result<()> {
        UserRoles::delete_many()
            .filter(user_roles::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to clear role assignments")?;

        let assignments: Vec<user_roles::ActiveModel> = role_ids
            .iter()
            .map(|&role_id| user_roles::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(role_id),
            })
            .collect();

        if !assignments.is_empty() {
            UserRoles::insert_many(assignments)
                .exec(&self.conn)
                .await
                .context("Failed to assign roles")?;
        }

        Ok(())
    }

    /// Verify password for a user.
    /// Note: uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }
}

/// Hash a password using Argon2id with params from the security config.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Run the CPU-heavy hash on the blocking pool.
pub async fn hash_async(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();

    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}
