use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

/// Request model for account creation (self-registration and privileged creation)
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Email address; must be unique across accounts
    pub email: String,

    /// Plaintext password; hashed before storage
    pub password: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Requested role id; ignored or restricted depending on who is asking
    pub role_id: Option<i32>,
}

/// Request model for a partial user update; absent fields are left untouched
#[derive(Object, Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// New role id; privileged callers only
    pub role_id: Option<i32>,

    /// Block or unblock the account; privileged callers only
    pub is_blocked: Option<bool>,
}

/// A user as seen by the caller. Privileged viewers get the full record;
/// everyone else gets a reduced projection with the `Option` fields absent.
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserView {
    /// Database id; SuperAdmin viewers only
    pub id: Option<i32>,

    pub email: String,

    pub first_name: String,

    pub last_name: String,

    /// Role name; privileged viewers only
    pub role: Option<String>,

    /// Block flag; privileged viewers only
    pub is_blocked: Option<bool>,

    /// Id of the creating account; privileged viewers only
    pub created_by: Option<i32>,

    /// Id of the last updating account; privileged viewers only
    pub updated_by: Option<i32>,

    /// Creation time (Unix seconds); privileged viewers only
    pub created_at: Option<i64>,

    /// Last update time (Unix seconds); privileged viewers only
    pub updated_at: Option<i64>,
}

/// Envelope for a single user
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserBody {
    /// Whether the operation succeeded
    pub success: bool,

    /// Human-readable outcome message
    pub message: String,

    /// The user record projection
    pub body: UserView,
}

/// One page of a user listing
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<UserView>,

    /// Total matching rows before paging
    pub total: u64,

    pub page: u64,

    pub limit: u64,

    pub total_pages: u64,
}

/// Envelope for a user listing
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserListBody {
    /// Whether the operation succeeded
    pub success: bool,

    /// Human-readable outcome message
    pub message: String,

    /// The page of users
    pub body: UserPage,
}

/// API response for self-registration (no authenticated caller)
#[derive(ApiResponse)]
pub enum SignupApiResponse {
    /// Account created
    #[oai(status = 201)]
    Created(Json<UserBody>),
}

/// API response for privileged user creation. Carries the silent-renewal
/// headers the authentication guard may have produced.
#[derive(ApiResponse)]
pub enum CreateUserApiResponse {
    /// Account created
    #[oai(status = 201)]
    Created(
        Json<UserBody>,
        /// Replacement access token, present when the guard renewed the pair
        #[oai(header = "x-new-token")]
        Option<String>,
        /// Replacement refresh token, present when the guard renewed the pair
        #[oai(header = "x-new-refresh-token")]
        Option<String>,
        /// Numeric role id of the authenticated caller
        #[oai(header = "x-user-permissions")]
        String,
    ),
}

/// API response for fetching a single user
#[derive(ApiResponse)]
pub enum UserApiResponse {
    /// User found
    #[oai(status = 200)]
    Ok(
        Json<UserBody>,
        /// Replacement access token, present when the guard renewed the pair
        #[oai(header = "x-new-token")]
        Option<String>,
        /// Replacement refresh token, present when the guard renewed the pair
        #[oai(header = "x-new-refresh-token")]
        Option<String>,
        /// Numeric role id of the authenticated caller
        #[oai(header = "x-user-permissions")]
        String,
    ),
}

/// API response for the user listing
#[derive(ApiResponse)]
pub enum UserListApiResponse {
    /// Listing produced
    #[oai(status = 200)]
    Ok(
        Json<UserListBody>,
        /// Replacement access token, present when the guard renewed the pair
        #[oai(header = "x-new-token")]
        Option<String>,
        /// Replacement refresh token, present when the guard renewed the pair
        #[oai(header = "x-new-refresh-token")]
        Option<String>,
        /// Numeric role id of the authenticated caller
        #[oai(header = "x-user-permissions")]
        String,
    ),
}
