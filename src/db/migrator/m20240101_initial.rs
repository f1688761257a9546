use crate::entities::prelude::*;
use crate::models::UserRole;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the bootstrap admin password using Argon2id.
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"ChangeMe123";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Roles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserRoles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed the fixed role enumeration. Insert order matches the 1-based
        // client ids so the autoincrement pk lines up with UserRole.
        for role in UserRole::ALL {
            let insert = sea_orm_migration::sea_query::Query::insert()
                .into_table(Roles)
                .columns([crate::entities::roles::Column::Name])
                .values_panic([role.name().into()])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        // Seed a bootstrap admin so the service is usable before any
        // registration has happened.
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::FirstName,
                crate::entities::users::Column::LastName,
                crate::entities::users::Column::Username,
                crate::entities::users::Column::Email,
                crate::entities::users::Column::Mobile,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Active,
                crate::entities::users::Column::CreatedBy,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedBy,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "Service".into(),
                "Admin".into(),
                "admin".into(),
                "admin@crescendo.local".into(),
                "0000000000".into(),
                password_hash.into(),
                true.into(),
                "system".into(),
                now.clone().into(),
                "system".into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        let assign = sea_orm_migration::sea_query::Query::insert()
            .into_table(UserRoles)
            .columns([
                crate::entities::user_roles::Column::UserId,
                crate::entities::user_roles::Column::RoleId,
            ])
            .values_panic([1.into(), UserRole::Admin.client_id().into()])
            .to_owned();

        manager.exec_stmt(assign).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserRoles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
