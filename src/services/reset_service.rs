//! Domain service for the password reset-link workflow.

use serde::Serialize;
use thiserror::Error;

use crate::entities::reset_links;

/// Errors specific to the reset workflow. Link absence or expiry is only an
/// error for `reset_password`; the query operations report it as data.
#[derive(Debug, Error)]
pub enum ResetError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidFormat(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ResetError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Reset link data exposed to the boundary (the delivery channel embeds the
/// token into a link for the user).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetLinkView {
    pub token: String,
    pub valid_from: String,
    pub valid_to: String,
    pub active: bool,
}

impl From<reset_links::Model> for ResetLinkView {
    fn from(model: reset_links::Model) -> Self {
        Self {
            token: model.token,
            valid_from: model.valid_from,
            valid_to: model.valid_to,
            active: model.active,
        }
    }
}

/// Domain service trait for reset links.
#[async_trait::async_trait]
pub trait ResetService: Send + Sync {
    /// Creates or refreshes the reset link for the account behind `email`.
    /// Returns `None` for an unknown email; whether an address exists must
    /// not leak through the error type.
    async fn generate_reset_link(&self, email: &str)
    -> Result<Option<ResetLinkView>, ResetError>;

    /// A link is valid iff it exists, is still active and has not expired.
    /// An unknown token is `false`, not an error.
    async fn is_link_valid(&self, token: &str) -> Result<bool, ResetError>;

    /// Consumes a valid link: persists the new password and durably
    /// deactivates the link in the same transaction.
    ///
    /// # Errors
    ///
    /// [`ResetError::NotFound`] when the link is missing/expired/spent or
    /// its owner is gone; [`ResetError::InvalidFormat`] when the new
    /// password fails the policy.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ResetError>;
}
