use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::api::{authorize, BearerAuth};
use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::services::password_policy::{validate_email, validate_password};
use crate::services::permissions::privileged_viewer;
use crate::services::user_service::{CreateUserInput, ListUsersInput, UpdateUserInput};
use crate::types::db::user;
use crate::types::dto::user::{
    CreateUserApiResponse, CreateUserRequest, SignupApiResponse, UpdateUserRequest, UserApiResponse,
    UserBody, UserListApiResponse, UserListBody, UserPage, UserView,
};
use crate::types::internal::Role;

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// User account API: registration, listing, inspection, updates
pub struct UserApi {
    data: Arc<AppData>,
}

impl UserApi {
    pub fn new(data: Arc<AppData>) -> Self {
        Self { data }
    }
}

#[derive(Tags)]
enum UserTags {
    /// User account endpoints
    Users,
}

/// Project a user record for a viewer. Privileged viewers (Admin and up) get
/// role, block flag, and audit columns; everyone else gets the reduced shape
/// of just email and names. The database id is reserved for SuperAdmins.
fn project(user: &user::Model, viewer: Role) -> UserView {
    let privileged = privileged_viewer(viewer);
    UserView {
        id: (viewer == Role::SuperAdmin).then_some(user.id),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role: if privileged {
            Role::from_id(user.role_id).map(|r| r.name().to_string())
        } else {
            None
        },
        is_blocked: privileged.then_some(user.is_blocked),
        created_by: if privileged { user.created_by } else { None },
        updated_by: if privileged { user.updated_by } else { None },
        created_at: privileged.then_some(user.created_at),
        updated_at: privileged.then_some(user.updated_at),
    }
}

fn validate_create(body: &CreateUserRequest) -> Result<(), ApiError> {
    validate_email(&body.email).map_err(ApiError::validation)?;
    validate_password(&body.password).map_err(ApiError::validation)?;
    if body.first_name.trim().is_empty() || body.last_name.trim().is_empty() {
        return Err(ApiError::validation("First and last name are required"));
    }
    if let Some(role_id) = body.role_id {
        if Role::from_id(role_id).is_none() {
            return Err(ApiError::validation("Unknown role id"));
        }
    }
    Ok(())
}

fn user_body(message: &str, view: UserView) -> Json<UserBody> {
    Json(UserBody {
        success: true,
        message: message.to_string(),
        body: view,
    })
}

#[OpenApi]
impl UserApi {
    /// Self-registration; no authentication required
    ///
    /// The first account ever created becomes SuperAdmin; afterwards this
    /// shape always produces a Guest, whatever role was asked for.
    #[oai(path = "/signin", method = "post", tag = "UserTags::Users")]
    async fn signup(&self, body: Json<CreateUserRequest>) -> Result<SignupApiResponse, ApiError> {
        if self.data.config.maintenance_mode {
            return Err(ApiError::maintenance());
        }
        validate_create(&body)?;

        let created = self
            .data
            .user_service
            .create_user(
                None,
                CreateUserInput {
                    email: body.0.email,
                    password: body.0.password,
                    first_name: body.0.first_name,
                    last_name: body.0.last_name,
                    role_id: body.0.role_id,
                },
            )
            .await?;

        // A fresh account sees itself through its own role.
        let viewer = Role::from_id(created.role_id).unwrap_or(Role::Guest);
        Ok(SignupApiResponse::Created(user_body(
            "Account created",
            project(&created, viewer),
        )))
    }

    /// Create an account on behalf of someone else
    ///
    /// Admins may only create Guests; SuperAdmins may create any role.
    #[oai(path = "/users", method = "post", tag = "UserTags::Users")]
    async fn create_user(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<CreateUserRequest>,
    ) -> Result<CreateUserApiResponse, ApiError> {
        let authed = authorize(&self.data, req, &auth, Role::Guest).await?;
        validate_create(&body)?;

        let created = self
            .data
            .user_service
            .create_user(
                Some((authed.user.id, authed.role)),
                CreateUserInput {
                    email: body.0.email,
                    password: body.0.password,
                    first_name: body.0.first_name,
                    last_name: body.0.last_name,
                    role_id: body.0.role_id,
                },
            )
            .await?;

        let view = project(&created, authed.role);
        Ok(CreateUserApiResponse::Created(
            user_body("Account created", view),
            authed.new_access_token.clone(),
            authed.new_refresh_token.clone(),
            authed.permissions_header(),
        ))
    }

    /// List users visible to the caller, with paging and optional filters
    #[oai(path = "/users", method = "get", tag = "UserTags::Users")]
    #[allow(clippy::too_many_arguments)]
    async fn list_users(
        &self,
        req: &Request,
        auth: BearerAuth,
        page: Query<Option<u64>>,
        limit: Query<Option<u64>>,
        name: Query<Option<String>>,
        role_id: Query<Option<i32>>,
        is_blocked: Query<Option<bool>>,
    ) -> Result<UserListApiResponse, ApiError> {
        let authed = authorize(&self.data, req, &auth, Role::Guest).await?;

        let page = page.0.unwrap_or(1).max(1);
        let limit = limit.0.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        if let Some(role_id) = role_id.0 {
            if Role::from_id(role_id).is_none() {
                return Err(ApiError::validation("Unknown role id"));
            }
        }

        let (rows, total) = self
            .data
            .user_service
            .list_users(
                authed.role,
                ListUsersInput {
                    role_ids: role_id.0.map(|id| vec![id]),
                    is_blocked: is_blocked.0,
                    name: name.0,
                    page,
                    limit,
                },
            )
            .await?;

        let users = rows.iter().map(|u| project(u, authed.role)).collect();

        Ok(UserListApiResponse::Ok(
            Json(UserListBody {
                success: true,
                message: "Users retrieved".to_string(),
                body: UserPage {
                    users,
                    total,
                    page,
                    limit,
                    total_pages: total.div_ceil(limit),
                },
            }),
            authed.new_access_token.clone(),
            authed.new_refresh_token.clone(),
            authed.permissions_header(),
        ))
    }

    /// The caller's own account
    #[oai(path = "/users/me", method = "get", tag = "UserTags::Users")]
    async fn me(&self, req: &Request, auth: BearerAuth) -> Result<UserApiResponse, ApiError> {
        let authed = authorize(&self.data, req, &auth, Role::Guest).await?;

        let view = project(&authed.user, authed.role);
        Ok(UserApiResponse::Ok(
            user_body("User retrieved", view),
            authed.new_access_token.clone(),
            authed.new_refresh_token.clone(),
            authed.permissions_header(),
        ))
    }

    /// Fetch one user by id, if the role matrix allows the caller to see it
    #[oai(path = "/users/:id", method = "get", tag = "UserTags::Users")]
    async fn get_user(
        &self,
        req: &Request,
        auth: BearerAuth,
        id: Path<i32>,
    ) -> Result<UserApiResponse, ApiError> {
        let authed = authorize(&self.data, req, &auth, Role::Guest).await?;

        let target = self
            .data
            .user_service
            .get_user(authed.user.id, authed.role, id.0)
            .await?;

        let view = project(&target, authed.role);
        Ok(UserApiResponse::Ok(
            user_body("User retrieved", view),
            authed.new_access_token.clone(),
            authed.new_refresh_token.clone(),
            authed.permissions_header(),
        ))
    }

    /// Partially update a user; absent fields are left untouched
    #[oai(path = "/users/:id", method = "patch", tag = "UserTags::Users")]
    async fn update_user(
        &self,
        req: &Request,
        auth: BearerAuth,
        id: Path<i32>,
        body: Json<UpdateUserRequest>,
    ) -> Result<UserApiResponse, ApiError> {
        let authed = authorize(&self.data, req, &auth, Role::Guest).await?;

        if let Some(email) = &body.email {
            validate_email(email).map_err(ApiError::validation)?;
        }
        if let Some(role_id) = body.role_id {
            if Role::from_id(role_id).is_none() {
                return Err(ApiError::validation("Unknown role id"));
            }
        }

        let updated = self
            .data
            .user_service
            .update_user(
                authed.user.id,
                authed.role,
                id.0,
                UpdateUserInput {
                    email: body.0.email,
                    first_name: body.0.first_name,
                    last_name: body.0.last_name,
                    role_id: body.0.role_id,
                    is_blocked: body.0.is_blocked,
                },
            )
            .await?;

        let view = project(&updated, authed.role);
        Ok(UserApiResponse::Ok(
            user_body("User updated", view),
            authed.new_access_token.clone(),
            authed.new_refresh_token.clone(),
            authed.permissions_header(),
        ))
    }
}
