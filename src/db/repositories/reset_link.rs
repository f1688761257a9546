use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::{prelude::*, reset_links, users};

pub struct ResetLinkRepository {
    conn: DatabaseConnection,
}

impl ResetLinkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_user_id(&self, user_id: i32) -> Result<Option<reset_links::Model>> {
        let link = ResetLinks::find()
            .filter(reset_links::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query reset link by user id")?;

        Ok(link)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<reset_links::Model>> {
        let link = ResetLinks::find()
            .filter(reset_links::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query reset link by token")?;

        Ok(link)
    }

    /// Creates or refreshes the single reset-link row for a user.
    /// The unique index on `user_id` backstops concurrent calls.
    pub async fn upsert_for_user(
        &self,
        user_id: i32,
        token: &str,
        valid_from: &str,
        valid_to: &str,
    ) -> Result<reset_links::Model> {
        let existing = self.find_by_user_id(user_id).await?;

        let saved = if let Some(link) = existing {
            let mut active: reset_links::ActiveModel = link.into();
            active.token = Set(token.to_string());
            active.valid_from = Set(valid_from.to_string());
            active.valid_to = Set(valid_to.to_string());
            active.active = Set(true);
            active
                .update(&self.conn)
                .await
                .context("Failed to refresh reset link")?
        } else {
            let active = reset_links::ActiveModel {
                user_id: Set(user_id),
                token: Set(token.to_string()),
                valid_from: Set(valid_from.to_string()),
                valid_to: Set(valid_to.to_string()),
                active: Set(true),
                ..Default::default()
            };
            active
                .insert(&self.conn)
                .await
                .context("Failed to create reset link")?
        };

        Ok(saved)
    }

    /// Applies the new password hash and deactivates the link in one
    /// transaction, so the link can never stay usable after the password
    /// has changed.
    pub async fn consume(
        &self,
        link_id: i32,
        user_id: i32,
        new_password_hash: &str,
        updated_by: &str,
    ) -> Result<()> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open reset transaction")?;

        let user = Users::find_by_id(user_id)
            .one(&txn)
            .await
            .context("Failed to load user for password reset")?
            .ok_or_else(|| anyhow::anyhow!("User {user_id} not found"))?;

        let now = chrono::Utc::now().to_rfc3339();

        let mut user_active: users::ActiveModel = user.into();
        user_active.password_hash = Set(new_password_hash.to_string());
        user_active.updated_by = Set(updated_by.to_string());
        user_active.updated_at = Set(now);
        user_active
            .update(&txn)
            .await
            .context("Failed to update password")?;

        let link = ResetLinks::find_by_id(link_id)
            .one(&txn)
            .await
            .context("Failed to load reset link for consumption")?
            .ok_or_else(|| anyhow::anyhow!("Reset link {link_id} not found"))?;

        let mut link_active: reset_links::ActiveModel = link.into();
        link_active.active = Set(false);
        link_active
            .update(&txn)
            .await
            .context("Failed to deactivate reset link")?;

        txn.commit()
            .await
            .context("Failed to commit reset transaction")?;

        Ok(())
    }
}

/// Generate an opaque reset token: a v4 uuid plus 16 random bytes, hex encoded.
#[must_use]
pub fn generate_reset_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();

    let suffix = bytes.iter().fold(String::with_capacity(32), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    });

    format!("{}{}", uuid::Uuid::new_v4().simple(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_opaque_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();

        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
