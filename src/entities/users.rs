use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub first_name: String,

    pub last_name: String,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub mobile: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub profile_pic: Option<String>,

    pub active: bool,

    pub created_by: String,

    pub created_at: String,

    pub updated_by: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_roles::Entity")]
    UserRoles,

    #[sea_orm(has_many = "super::reset_links::Entity")]
    ResetLinks,
}

impl Related<super::user_roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRoles.def()
    }
}

impl Related<super::reset_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResetLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
