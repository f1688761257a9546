use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

use crate::entities::{prelude::*, user_sessions};

/// One sign-in attempt as seen at the request boundary.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub username: String,
    pub country: String,
    pub user_agent: Option<String>,
    pub origin: Option<String>,
    pub success: bool,
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Appends an audit row. Rows are never updated or deleted.
    pub async fn record(&self, attempt: &LoginAttempt) -> Result<()> {
        let active_model = user_sessions::ActiveModel {
            username: Set(attempt.username.clone()),
            country: Set(attempt.country.clone()),
            user_agent: Set(attempt.user_agent.clone()),
            origin: Set(attempt.origin.clone()),
            success: Set(attempt.success),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        UserSessions::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to record login attempt")?;

        Ok(())
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<user_sessions::Model>> {
        let rows = UserSessions::find()
            .order_by_desc(user_sessions::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query login audit")?;

        Ok(rows)
    }
}
