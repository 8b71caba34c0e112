use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::errors::InternalError;
use crate::types::db::user::{self, Entity as User};

/// Fields for a brand-new account. `created_by` is absent when the account
/// creates itself (self-registration and the very first account).
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: i32,
    pub created_by: Option<i32>,
}

/// Partial update; only `Some` fields are written.
#[derive(Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role_id: Option<i32>,
    pub is_blocked: Option<bool>,
}

/// Listing filters. `visible_role_ids` is the hard ceiling the caller's role
/// imposes; the optional filters narrow within it.
pub struct UserListFilter {
    pub visible_role_ids: Vec<i32>,
    pub role_ids: Option<Vec<i32>>,
    pub is_blocked: Option<bool>,
    pub name: Option<String>,
    pub page: u64,
    pub limit: u64,
}

pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lookup by email. Emails are stored lowercased, so the needle is
    /// lowercased here too.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, InternalError> {
        User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_user_by_email", e))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<user::Model>, InternalError> {
        User::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))
    }

    pub async fn count_all(&self) -> Result<u64, InternalError> {
        User::find()
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_users", e))
    }

    /// True when another account already owns this email.
    pub async fn email_taken_by_other(
        &self,
        email: &str,
        user_id: i32,
    ) -> Result<bool, InternalError> {
        let existing = User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .filter(user::Column::Id.ne(user_id))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("check_email_taken", e))?;
        Ok(existing.is_some())
    }

    /// Insert a new account. Self-created accounts get their own fresh id
    /// written back into `created_by`/`updated_by`.
    pub async fn insert(&self, new_user: NewUser) -> Result<user::Model, InternalError> {
        let now = Utc::now().timestamp();
        let self_created = new_user.created_by.is_none();

        let inserted = user::ActiveModel {
            email: Set(new_user.email.to_lowercase()),
            password: Set(new_user.password_hash),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            role_id: Set(new_user.role_id),
            is_blocked: Set(false),
            reset_password_token: Set(String::new()),
            reset_password_token_used: Set(false),
            created_by: Set(new_user.created_by),
            updated_by: Set(new_user.created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| InternalError::database("insert_user", e))?;

        if self_created {
            let own_id = inserted.id;
            let mut active: user::ActiveModel = inserted.into();
            active.created_by = Set(Some(own_id));
            active.updated_by = Set(Some(own_id));
            return active
                .update(&self.db)
                .await
                .map_err(|e| InternalError::database("backfill_user_audit", e));
        }

        Ok(inserted)
    }

    pub async fn update(
        &self,
        user: user::Model,
        changes: UserChanges,
        updated_by: i32,
    ) -> Result<user::Model, InternalError> {
        let mut active: user::ActiveModel = user.into();

        if let Some(email) = changes.email {
            active.email = Set(email.to_lowercase());
        }
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(role_id) = changes.role_id {
            active.role_id = Set(role_id);
        }
        if let Some(is_blocked) = changes.is_blocked {
            active.is_blocked = Set(is_blocked);
        }
        active.updated_by = Set(Some(updated_by));
        active.updated_at = Set(Utc::now().timestamp());

        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("update_user", e))
    }

    pub async fn update_password(
        &self,
        user: user::Model,
        password_hash: String,
        mark_reset_used: bool,
    ) -> Result<user::Model, InternalError> {
        let own_id = user.id;
        let mut active: user::ActiveModel = user.into();
        active.password = Set(password_hash);
        if mark_reset_used {
            active.reset_password_token_used = Set(true);
        }
        active.updated_by = Set(Some(own_id));
        active.updated_at = Set(Utc::now().timestamp());

        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("update_password", e))
    }

    /// Store a fresh reset token and re-arm it for a single use.
    pub async fn set_reset_token(
        &self,
        user: user::Model,
        token: String,
    ) -> Result<user::Model, InternalError> {
        let mut active: user::ActiveModel = user.into();
        active.reset_password_token = Set(token);
        active.reset_password_token_used = Set(false);
        active.updated_at = Set(Utc::now().timestamp());

        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("set_reset_token", e))
    }

    /// The user only if the stored reset token matches and is still unused.
    pub async fn find_for_reset(
        &self,
        user_id: i32,
        token: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        User::find()
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::ResetPasswordToken.eq(token))
            .filter(user::Column::ResetPasswordTokenUsed.eq(false))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_user_for_reset", e))
    }

    /// Paged listing within the caller's visibility ceiling. Returns the page
    /// of rows plus the total row count before paging.
    pub async fn list(
        &self,
        filter: UserListFilter,
    ) -> Result<(Vec<user::Model>, u64), InternalError> {
        let mut query = User::find().filter(
            user::Column::RoleId.is_in(filter.visible_role_ids),
        );

        if let Some(role_ids) = filter.role_ids {
            query = query.filter(user::Column::RoleId.is_in(role_ids));
        }
        if let Some(is_blocked) = filter.is_blocked {
            query = query.filter(user::Column::IsBlocked.eq(is_blocked));
        }
        if let Some(name) = filter.name {
            query = query.filter(
                Condition::any()
                    .add(user::Column::FirstName.contains(&name))
                    .add(user::Column::LastName.contains(&name)),
            );
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_user_listing", e))?;

        let page = filter.page.max(1);
        let rows = query
            .order_by_asc(user::Column::Id)
            .offset((page - 1) * filter.limit)
            .limit(filter.limit)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("list_users", e))?;

        Ok((rows, total))
    }
}
