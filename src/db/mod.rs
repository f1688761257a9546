use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{reset_links, user_sessions};
use crate::models::UserRole;

pub mod migrator;
pub mod repositories;

pub use repositories::session::LoginAttempt;
pub use repositories::user::{NewUser, User, UserChanges};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        // An in-memory sqlite database exists per connection; more than one
        // pooled connection would each see an empty schema.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                tokio::fs::File::create(path_str).await?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn role_repo(&self) -> repositories::role::RoleRepository {
        repositories::role::RoleRepository::new(self.conn.clone())
    }

    fn reset_link_repo(&self) -> repositories::reset_link::ResetLinkRepository {
        repositories::reset_link::ResetLinkRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn user_exists_by_username(&self, username: &str) -> Result<bool> {
        self.user_repo().exists_by_username(username).await
    }

    pub async fn user_exists_by_email(&self, email: &str) -> Result<bool> {
        self.user_repo().exists_by_email(email).await
    }

    pub async fn user_exists_by_mobile(&self, mobile: &str) -> Result<bool> {
        self.user_repo().exists_by_mobile(mobile).await
    }

    pub async fn user_exists_by_email_except(&self, user_id: i32, email: &str) -> Result<bool> {
        self.user_repo().exists_by_email_except(user_id, email).await
    }

    pub async fn user_exists_by_mobile_except(&self, user_id: i32, mobile: &str) -> Result<bool> {
        self.user_repo()
            .exists_by_mobile_except(user_id, mobile)
            .await
    }

    pub async fn insert_user(
        &self,
        new: &NewUser,
        roles: &[UserRole],
        security: &SecurityConfig,
    ) -> Result<User> {
        let role_ids = self.role_repo().ids_for(roles).await?;
        self.user_repo().insert(new, &role_ids, security).await
    }

    pub async fn update_user(&self, changes: &UserChanges, roles: &[UserRole]) -> Result<User> {
        let role_ids = self.role_repo().ids_for(roles).await?;
        self.user_repo().apply_update(changes, &role_ids).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    // ========== Reset links ==========

    pub async fn find_reset_link_by_token(&self, token: &str) -> Result<Option<reset_links::Model>> {
        self.reset_link_repo().find_by_token(token).await
    }

    pub async fn upsert_reset_link(
        &self,
        user_id: i32,
        token: &str,
        valid_from: &str,
        valid_to: &str,
    ) -> Result<reset_links::Model> {
        self.reset_link_repo()
            .upsert_for_user(user_id, token, valid_from, valid_to)
            .await
    }

    /// Hashes the new password and consumes the link transactionally.
    pub async fn consume_reset_link(
        &self,
        link_id: i32,
        user_id: i32,
        new_password: &str,
        updated_by: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let new_hash = repositories::user::hash_async(new_password, security).await?;
        self.reset_link_repo()
            .consume(link_id, user_id, &new_hash, updated_by)
            .await
    }

    // ========== Login audit ==========

    pub async fn record_login_attempt(&self, attempt: &LoginAttempt) -> Result<()> {
        self.session_repo().record(attempt).await
    }

    pub async fn recent_login_attempts(&self, limit: u64) -> Result<Vec<user_sessions::Model>> {
        self.session_repo().recent(limit).await
    }
}
