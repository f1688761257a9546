//! Domain service for the user directory.
//!
//! Handles registration, profile updates and the response projection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::repositories::user::User;

/// Errors specific to directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{field} already registered")]
    DuplicateField { field: &'static str },

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unknown role id: {0}")]
    UnknownRole(i32),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for DirectoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Registration fields as supplied at the boundary. Roles are 1-based
/// numeric ids; `None` means the single base USER role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    #[serde(default)]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<i32>>,
}

/// Profile update fields. Username and password are not updatable here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    #[serde(default)]
    pub roles: Option<Vec<i32>>,
}

/// Pure projection of a user record for responses. No validation happens
/// here and the password hash is never exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub profile_pic: Option<String>,
    pub active: bool,
    pub roles: Vec<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_by: String,
    pub updated_at: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            mobile: user.mobile,
            profile_pic: user.profile_pic,
            active: user.active,
            roles: user.roles.iter().map(|r| r.name().to_string()).collect(),
            created_by: user.created_by,
            created_at: user.created_at,
            updated_by: user.updated_by,
            updated_at: user.updated_at,
        }
    }
}

/// Domain service trait for the user directory.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Registers a new user. Uniqueness is checked in the fixed order
    /// username, email, mobile; then the password policy; then roles.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::DuplicateField`] on the first colliding field,
    /// [`DirectoryError::InvalidFormat`] for a policy violation,
    /// [`DirectoryError::UnknownRole`] when any role id is unresolvable.
    async fn register(
        &self,
        request: RegisterRequest,
        acting: &str,
    ) -> Result<UserView, DirectoryError>;

    /// Updates an existing profile. The record itself is excluded from the
    /// email/mobile duplicate checks.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] when the id does not exist.
    async fn update(
        &self,
        request: UpdateRequest,
        acting: &str,
    ) -> Result<UserView, DirectoryError>;

    /// Lists all user records as response views.
    async fn list(&self) -> Result<Vec<UserView>, DirectoryError>;
}
