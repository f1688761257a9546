//! `SeaORM` implementation of the `ResetService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use crate::config::SecurityConfig;
use crate::constants::messages;
use crate::db::Store;
use crate::db::repositories::reset_link::generate_reset_token;
use crate::entities::reset_links;
use crate::services::password_policy::PasswordPolicy;
use crate::services::reset_service::{ResetError, ResetLinkView, ResetService};

pub struct SeaOrmResetService {
    store: Store,
    policy: PasswordPolicy,
    security: SecurityConfig,
    link_ttl_hours: i64,
}

impl SeaOrmResetService {
    #[must_use]
    pub const fn new(
        store: Store,
        policy: PasswordPolicy,
        security: SecurityConfig,
        link_ttl_hours: i64,
    ) -> Self {
        Self {
            store,
            policy,
            security,
            link_ttl_hours,
        }
    }
}

/// Expiry wins over the active flag: a link past `valid_to` is unusable
/// even when `active` is still set.
fn link_is_usable(link: &reset_links::Model, now: DateTime<Utc>) -> bool {
    if !link.active {
        return false;
    }

    DateTime::parse_from_rfc3339(&link.valid_to)
        .map(|valid_to| valid_to.with_timezone(&Utc) > now)
        .unwrap_or(false)
}

#[async_trait]
impl ResetService for SeaOrmResetService {
    async fn generate_reset_link(
        &self,
        email: &str,
    ) -> Result<Option<ResetLinkView>, ResetError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            // Unknown address: empty result, never an error.
            return Ok(None);
        };

        let now = Utc::now();
        let valid_to = now + Duration::hours(self.link_ttl_hours);
        let token = generate_reset_token();

        let link = self
            .store
            .upsert_reset_link(user.id, &token, &now.to_rfc3339(), &valid_to.to_rfc3339())
            .await?;

        info!("Reset link issued for user {}", user.id);

        Ok(Some(ResetLinkView::from(link)))
    }

    async fn is_link_valid(&self, token: &str) -> Result<bool, ResetError> {
        let link = self.store.find_reset_link_by_token(token).await?;

        Ok(link
            .map(|l| link_is_usable(&l, Utc::now()))
            .unwrap_or(false))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ResetError> {
        let link = self
            .store
            .find_reset_link_by_token(token)
            .await?
            .filter(|l| link_is_usable(l, Utc::now()))
            .ok_or_else(|| {
                error!("Password reset attempted with unusable token");
                ResetError::NotFound(messages::INVALID_LINK.to_string())
            })?;

        let user = self
            .store
            .get_user_by_id(link.user_id)
            .await?
            .ok_or_else(|| {
                error!("Reset link {} has no owning user", link.id);
                ResetError::NotFound(messages::INVALID_LINK.to_string())
            })?;

        if !self.policy.is_valid(new_password) {
            error!("Invalid password format on reset");
            return Err(ResetError::InvalidFormat(
                self.policy.message().to_string(),
            ));
        }

        self.store
            .consume_reset_link(link.id, user.id, new_password, &user.username, &self.security)
            .await?;

        info!("Password reset completed for user {}", user.id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(active: bool, valid_to: DateTime<Utc>) -> reset_links::Model {
        reset_links::Model {
            id: 1,
            user_id: 1,
            token: "t".to_string(),
            valid_from: (valid_to - Duration::hours(3)).to_rfc3339(),
            valid_to: valid_to.to_rfc3339(),
            active,
        }
    }

    #[test]
    fn active_link_within_window_is_usable() {
        let now = Utc::now();
        assert!(link_is_usable(&link(true, now + Duration::hours(1)), now));
    }

    #[test]
    fn expired_link_is_unusable_even_when_active() {
        let now = Utc::now();
        assert!(!link_is_usable(&link(true, now - Duration::minutes(1)), now));
    }

    #[test]
    fn inactive_link_is_unusable() {
        let now = Utc::now();
        assert!(!link_is_usable(&link(false, now + Duration::hours(1)), now));
    }

    #[test]
    fn unparseable_expiry_is_unusable() {
        let now = Utc::now();
        let mut l = link(true, now + Duration::hours(1));
        l.valid_to = "garbage".to_string();
        assert!(!link_is_usable(&l, now));
    }
}
