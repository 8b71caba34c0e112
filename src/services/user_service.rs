use std::sync::Arc;

use crate::errors::{CoreError, InternalError};
use crate::services::permissions::{
    self, registration_schema, Operation, RegistrationSchema,
};
use crate::stores::user_store::{NewUser, UserChanges, UserListFilter};
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::internal::Role;

/// Validated fields for account creation; shape and policy checks happen at
/// the API boundary before this is built.
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<i32>,
}

/// Requested field changes for an update. `None` leaves a field untouched.
#[derive(Default)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role_id: Option<i32>,
    pub is_blocked: Option<bool>,
}

/// Listing parameters after the API layer has applied paging defaults.
pub struct ListUsersInput {
    pub role_ids: Option<Vec<i32>>,
    pub is_blocked: Option<bool>,
    pub name: Option<String>,
    pub page: u64,
    pub limit: u64,
}

/// User CRUD behind the role-permission matrix. Every operation re-resolves
/// roles from the database rows involved; nothing here trusts a token.
pub struct UserService {
    users: Arc<UserStore>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(users: Arc<UserStore>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    /// Create an account under the registration shape the situation dictates:
    /// first-ever account, self-registration, or privileged creation.
    pub async fn create_user(
        &self,
        caller: Option<(i32, Role)>,
        input: CreateUserInput,
    ) -> Result<user::Model, CoreError> {
        let total_users = self.users.count_all().await?;
        let schema = registration_schema(caller.map(|(_, role)| role), total_users)?;

        let requested_role = match input.role_id {
            None => None,
            Some(id) => Some(Role::from_id(id).ok_or(CoreError::NotFound("role"))?),
        };
        let role = schema.effective_role(requested_role)?;

        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(CoreError::Conflict);
        }

        let password_hash = bcrypt::hash(&input.password, self.bcrypt_cost)
            .map_err(|e| InternalError::crypto("hash_password", e.to_string()))?;

        // Self-created accounts have no creator yet; the store backfills
        // their own id once it is known.
        let created_by = match schema {
            RegistrationSchema::FirstUser | RegistrationSchema::SelfRegistration => None,
            RegistrationSchema::AdminCreation | RegistrationSchema::SuperAdminCreation => {
                caller.map(|(id, _)| id)
            }
        };

        let created = self
            .users
            .insert(NewUser {
                email: input.email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                role_id: role.id(),
                created_by,
            })
            .await?;

        Ok(created)
    }

    /// Paged listing within the caller's visibility. Guests may not list.
    pub async fn list_users(
        &self,
        caller_role: Role,
        input: ListUsersInput,
    ) -> Result<(Vec<user::Model>, u64), CoreError> {
        let visible_role_ids = permissions::visible_role_ids(caller_role);
        if visible_role_ids.is_empty() {
            return Err(CoreError::Unauthorized);
        }

        let (rows, total) = self
            .users
            .list(UserListFilter {
                visible_role_ids,
                role_ids: input.role_ids,
                is_blocked: input.is_blocked,
                name: input.name,
                page: input.page,
                limit: input.limit,
            })
            .await?;

        Ok((rows, total))
    }

    /// Fetch one user, gated by the view row of the matrix.
    pub async fn get_user(
        &self,
        caller_id: i32,
        caller_role: Role,
        target_id: i32,
    ) -> Result<user::Model, CoreError> {
        let target = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or(CoreError::NotFound("user"))?;
        let target_role = Role::from_id(target.role_id).ok_or(CoreError::NotFound("role"))?;

        if !permissions::permits(caller_role, caller_id, target_role, target.id, Operation::View) {
            return Err(CoreError::Unauthorized);
        }

        Ok(target)
    }

    /// Apply a partial update. Basic fields (email, names) and privileged
    /// fields (role, block flag) are gated by separate matrix rows, and the
    /// target's email uniqueness is re-checked when it changes.
    pub async fn update_user(
        &self,
        caller_id: i32,
        caller_role: Role,
        target_id: i32,
        input: UpdateUserInput,
    ) -> Result<user::Model, CoreError> {
        let target = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or(CoreError::NotFound("user"))?;
        let target_role = Role::from_id(target.role_id).ok_or(CoreError::NotFound("role"))?;

        let wants_basic =
            input.email.is_some() || input.first_name.is_some() || input.last_name.is_some();
        let wants_privileged = input.role_id.is_some() || input.is_blocked.is_some();

        if !wants_basic && !wants_privileged {
            return Ok(target);
        }

        if wants_basic
            && !permissions::permits(
                caller_role,
                caller_id,
                target_role,
                target.id,
                Operation::UpdateBasic,
            )
        {
            return Err(CoreError::Unauthorized);
        }

        if wants_privileged
            && !permissions::permits(
                caller_role,
                caller_id,
                target_role,
                target.id,
                Operation::UpdatePrivileged,
            )
        {
            return Err(CoreError::Unauthorized);
        }

        if let Some(role_id) = input.role_id {
            let new_role = Role::from_id(role_id).ok_or(CoreError::NotFound("role"))?;
            // Only a SuperAdmin may mint another SuperAdmin.
            if new_role == Role::SuperAdmin && caller_role != Role::SuperAdmin {
                return Err(CoreError::Unauthorized);
            }
        }

        if let Some(email) = &input.email {
            if self.users.email_taken_by_other(email, target.id).await? {
                return Err(CoreError::Conflict);
            }
        }

        let updated = self
            .users
            .update(
                target,
                UserChanges {
                    email: input.email,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    role_id: input.role_id,
                    is_blocked: input.is_blocked,
                },
                caller_id,
            )
            .await?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    const TEST_COST: u32 = 4;

    async fn setup() -> (UserService, Arc<UserStore>) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let users = Arc::new(UserStore::new(db));
        let service = UserService::new(users.clone(), TEST_COST);
        (service, users)
    }

    fn input(email: &str, role_id: Option<i32>) -> CreateUserInput {
        CreateUserInput {
            email: email.to_string(),
            password: "Abcd1234".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role_id,
        }
    }

    #[tokio::test]
    async fn the_first_account_becomes_superadmin() {
        let (service, _users) = setup().await;

        // Guest was requested; the bootstrap rule overrides it.
        let first = service
            .create_user(None, input("a@x.com", Some(3)))
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(first.role_id, Role::SuperAdmin.id());
        assert_eq!(first.created_by, Some(1));
    }

    #[tokio::test]
    async fn self_registration_on_a_populated_system_is_guest_only() {
        let (service, _users) = setup().await;
        service.create_user(None, input("first@x.com", None)).await.unwrap();

        let second = service
            .create_user(None, input("second@x.com", Some(1)))
            .await
            .unwrap();

        assert_eq!(second.role_id, Role::Guest.id());
        assert_eq!(second.created_by, Some(second.id));
    }

    #[tokio::test]
    async fn admin_creates_guests_but_not_admins() {
        let (service, _users) = setup().await;
        let root = service.create_user(None, input("root@x.com", None)).await.unwrap();
        let admin = service
            .create_user(Some((root.id, Role::SuperAdmin)), input("admin@x.com", Some(2)))
            .await
            .unwrap();
        assert_eq!(admin.role_id, Role::Admin.id());

        let guest = service
            .create_user(Some((admin.id, Role::Admin)), input("guest@x.com", None))
            .await
            .unwrap();
        assert_eq!(guest.role_id, Role::Guest.id());
        assert_eq!(guest.created_by, Some(admin.id));

        assert!(matches!(
            service
                .create_user(Some((admin.id, Role::Admin)), input("peer@x.com", Some(2)))
                .await,
            Err(CoreError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn guests_may_not_create_accounts() {
        let (service, _users) = setup().await;
        service.create_user(None, input("root@x.com", None)).await.unwrap();
        let guest = service.create_user(None, input("guest@x.com", None)).await.unwrap();

        assert!(matches!(
            service
                .create_user(Some((guest.id, Role::Guest)), input("new@x.com", None))
                .await,
            Err(CoreError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn duplicate_emails_conflict() {
        let (service, _users) = setup().await;
        service.create_user(None, input("dup@x.com", None)).await.unwrap();

        assert!(matches!(
            service.create_user(None, input("DUP@x.com", None)).await,
            Err(CoreError::Conflict)
        ));
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() {
        let (service, _users) = setup().await;
        let root = service.create_user(None, input("root@x.com", None)).await.unwrap();
        service
            .create_user(Some((root.id, Role::SuperAdmin)), input("admin@x.com", Some(2)))
            .await
            .unwrap();
        service
            .create_user(Some((root.id, Role::SuperAdmin)), input("guest@x.com", Some(3)))
            .await
            .unwrap();

        let list_input = || ListUsersInput {
            role_ids: None,
            is_blocked: None,
            name: None,
            page: 1,
            limit: 10,
        };

        let (all, total) = service
            .list_users(Role::SuperAdmin, list_input())
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);

        let (scoped, total) = service.list_users(Role::Admin, list_input()).await.unwrap();
        assert_eq!(total, 2);
        assert!(scoped.iter().all(|u| u.role_id != Role::SuperAdmin.id()));

        assert!(matches!(
            service.list_users(Role::Guest, list_input()).await,
            Err(CoreError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn view_gating_follows_the_matrix() {
        let (service, _users) = setup().await;
        let root = service.create_user(None, input("root@x.com", None)).await.unwrap();
        let guest = service
            .create_user(Some((root.id, Role::SuperAdmin)), input("guest@x.com", Some(3)))
            .await
            .unwrap();

        // Admin may not view a SuperAdmin target.
        assert!(matches!(
            service.get_user(99, Role::Admin, root.id).await,
            Err(CoreError::Unauthorized)
        ));

        // Guest sees itself and nothing else.
        assert!(service.get_user(guest.id, Role::Guest, guest.id).await.is_ok());
        assert!(matches!(
            service.get_user(guest.id, Role::Guest, root.id).await,
            Err(CoreError::Unauthorized)
        ));

        assert!(matches!(
            service.get_user(root.id, Role::SuperAdmin, 9999).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn admin_cannot_promote_anyone_to_superadmin() {
        let (service, users) = setup().await;
        let root = service.create_user(None, input("root@x.com", None)).await.unwrap();
        let admin = service
            .create_user(Some((root.id, Role::SuperAdmin)), input("admin@x.com", Some(2)))
            .await
            .unwrap();
        let guest = service
            .create_user(Some((root.id, Role::SuperAdmin)), input("guest@x.com", Some(3)))
            .await
            .unwrap();

        let attempt = service
            .update_user(
                admin.id,
                Role::Admin,
                guest.id,
                UpdateUserInput {
                    role_id: Some(1),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(attempt, Err(CoreError::Unauthorized)));

        let stored = users.find_by_id(guest.id).await.unwrap().unwrap();
        assert_eq!(stored.role_id, Role::Guest.id());
    }

    #[tokio::test]
    async fn admin_peer_updates_stop_at_privileged_fields() {
        let (service, _users) = setup().await;
        let root = service.create_user(None, input("root@x.com", None)).await.unwrap();
        let a = service
            .create_user(Some((root.id, Role::SuperAdmin)), input("a@x.com", Some(2)))
            .await
            .unwrap();
        let b = service
            .create_user(Some((root.id, Role::SuperAdmin)), input("b@x.com", Some(2)))
            .await
            .unwrap();

        let renamed = service
            .update_user(
                a.id,
                Role::Admin,
                b.id,
                UpdateUserInput {
                    first_name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.first_name, "Renamed");
        assert_eq!(renamed.updated_by, Some(a.id));

        assert!(matches!(
            service
                .update_user(
                    a.id,
                    Role::Admin,
                    b.id,
                    UpdateUserInput {
                        is_blocked: Some(true),
                        ..Default::default()
                    },
                )
                .await,
            Err(CoreError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn guest_updates_its_own_basic_fields_only() {
        let (service, _users) = setup().await;
        service.create_user(None, input("root@x.com", None)).await.unwrap();
        let guest = service.create_user(None, input("guest@x.com", None)).await.unwrap();

        let renamed = service
            .update_user(
                guest.id,
                Role::Guest,
                guest.id,
                UpdateUserInput {
                    last_name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.last_name, "Renamed");

        assert!(matches!(
            service
                .update_user(
                    guest.id,
                    Role::Guest,
                    guest.id,
                    UpdateUserInput {
                        role_id: Some(2),
                        ..Default::default()
                    },
                )
                .await,
            Err(CoreError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn update_rechecks_email_uniqueness() {
        let (service, _users) = setup().await;
        let root = service.create_user(None, input("root@x.com", None)).await.unwrap();
        let guest = service
            .create_user(Some((root.id, Role::SuperAdmin)), input("guest@x.com", Some(3)))
            .await
            .unwrap();

        assert!(matches!(
            service
                .update_user(
                    root.id,
                    Role::SuperAdmin,
                    guest.id,
                    UpdateUserInput {
                        email: Some("root@x.com".to_string()),
                        ..Default::default()
                    },
                )
                .await,
            Err(CoreError::Conflict)
        ));

        // Re-submitting one's own email is not a conflict.
        assert!(service
            .update_user(
                root.id,
                Role::SuperAdmin,
                guest.id,
                UpdateUserInput {
                    email: Some("guest@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .is_ok());
    }
}
