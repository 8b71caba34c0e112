use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    /// Bcrypt hash, never serialized out of the core.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: i32,
    pub is_blocked: bool,
    /// Empty string when no reset is pending.
    pub reset_password_token: String,
    pub reset_password_token_used: bool,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id",
        on_delete = "Restrict"
    )]
    Role,
    #[sea_orm(has_many = "super::session::Entity")]
    Session,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The name embedded in token payloads alongside the id.
    pub fn display_name(&self) -> &str {
        &self.first_name
    }
}
