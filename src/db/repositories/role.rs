use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::{prelude::*, roles};
use crate::models::UserRole;

pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<roles::Model>> {
        let role = Roles::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query role by name")?;

        Ok(role)
    }

    /// Maps resolved roles to their database ids. Every role is expected to
    /// be seeded by the initial migration; a missing row is an error.
    pub async fn ids_for(&self, roles: &[UserRole]) -> Result<Vec<i32>> {
        let mut ids = Vec::with_capacity(roles.len());

        for role in roles {
            let row = self
                .find_by_name(role.name())
                .await?
                .ok_or_else(|| anyhow::anyhow!("Role {} is not seeded", role.name()))?;
            ids.push(row.id);
        }

        Ok(ids)
    }
}
