use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::errors::InternalError;
use crate::types::db::session::{self, Entity as Session};

/// Session records keyed by user + device + IP, or by access token.
///
/// A user may hold many concurrent sessions, but the schema enforces at most
/// one per (user, ip, device) triple; `replace_for_device` is the only write
/// path that creates rows.
pub struct SessionStore {
    db: DatabaseConnection,
}

impl SessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The session that matches both the user and the presented access token.
    pub async fn find_active(
        &self,
        user_id: i32,
        access_token: &str,
    ) -> Result<Option<session::Model>, InternalError> {
        Session::find()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::AccessToken.eq(access_token))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_active_session", e))
    }

    /// Used by logout, where only the token is known.
    pub async fn find_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<session::Model>, InternalError> {
        Session::find()
            .filter(session::Column::AccessToken.eq(access_token))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_session_by_access_token", e))
    }

    pub async fn find_by_device(
        &self,
        user_id: i32,
        ip_address: &str,
        device_info: &str,
    ) -> Result<Vec<session::Model>, InternalError> {
        Session::find()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::IpAddress.eq(ip_address))
            .filter(session::Column::DeviceInfo.eq(device_info))
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("find_sessions_by_device", e))
    }

    /// Atomically replace any session for this (user, ip, device) triple with
    /// a fresh one. Delete and insert run in one transaction so there is no
    /// visible window with zero or two sessions for the device.
    pub async fn replace_for_device(
        &self,
        user_id: i32,
        ip_address: &str,
        device_info: &str,
        access_token: String,
        refresh_token: String,
    ) -> Result<session::Model, InternalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InternalError::transaction("replace_for_device", e))?;

        Session::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::IpAddress.eq(ip_address))
            .filter(session::Column::DeviceInfo.eq(device_info))
            .exec(&txn)
            .await
            .map_err(|e| InternalError::database("replace_for_device_delete", e))?;

        let now = Utc::now().timestamp();
        let fresh = session::ActiveModel {
            user_id: Set(user_id),
            access_token: Set(access_token),
            refresh_token: Set(refresh_token),
            ip_address: Set(Some(ip_address.to_string())),
            device_info: Set(Some(device_info.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = fresh
            .insert(&txn)
            .await
            .map_err(|e| InternalError::database("replace_for_device_insert", e))?;

        txn.commit()
            .await
            .map_err(|e| InternalError::transaction("replace_for_device_commit", e))?;

        Ok(inserted)
    }

    /// In-place token rotation, used on silent renewal.
    pub async fn update_tokens(
        &self,
        session: session::Model,
        access_token: String,
        refresh_token: String,
    ) -> Result<session::Model, InternalError> {
        let mut active: session::ActiveModel = session.into();
        active.access_token = Set(access_token);
        active.refresh_token = Set(refresh_token);
        active.updated_at = Set(Utc::now().timestamp());

        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("update_session_tokens", e))
    }

    pub async fn destroy(&self, session: session::Model) -> Result<(), InternalError> {
        session
            .delete(&self.db)
            .await
            .map_err(|e| InternalError::database("destroy_session", e))?;
        Ok(())
    }
}
