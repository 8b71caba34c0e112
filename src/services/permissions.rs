use crate::errors::CoreError;
use crate::types::internal::Role;

/// User-CRUD operations gated by the role matrix. Updates are split in two:
/// basic fields (email, names) and privileged fields (role, block flag) have
/// different rows in the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    View,
    UpdateBasic,
    UpdatePrivileged,
}

/// How far an allowance reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Never,
    SelfOnly,
    Any,
}

/// The permission matrix, one row per (requester role, target role,
/// operation). Kept as an explicit table so the whole policy is readable in
/// one place and testable row by row.
#[rustfmt::skip]
const MATRIX: &[(Role, Role, Operation, Access)] = &[
    // SuperAdmin is unrestricted.
    (Role::SuperAdmin, Role::SuperAdmin, Operation::View,             Access::Any),
    (Role::SuperAdmin, Role::Admin,      Operation::View,             Access::Any),
    (Role::SuperAdmin, Role::Guest,      Operation::View,             Access::Any),
    (Role::SuperAdmin, Role::SuperAdmin, Operation::UpdateBasic,      Access::Any),
    (Role::SuperAdmin, Role::Admin,      Operation::UpdateBasic,      Access::Any),
    (Role::SuperAdmin, Role::Guest,      Operation::UpdateBasic,      Access::Any),
    (Role::SuperAdmin, Role::SuperAdmin, Operation::UpdatePrivileged, Access::Any),
    (Role::SuperAdmin, Role::Admin,      Operation::UpdatePrivileged, Access::Any),
    (Role::SuperAdmin, Role::Guest,      Operation::UpdatePrivileged, Access::Any),

    // Admin never touches a SuperAdmin, edits peers' basic fields only,
    // and holds full rein over Guests.
    (Role::Admin,      Role::SuperAdmin, Operation::View,             Access::Never),
    (Role::Admin,      Role::Admin,      Operation::View,             Access::Any),
    (Role::Admin,      Role::Guest,      Operation::View,             Access::Any),
    (Role::Admin,      Role::SuperAdmin, Operation::UpdateBasic,      Access::Never),
    (Role::Admin,      Role::Admin,      Operation::UpdateBasic,      Access::Any),
    (Role::Admin,      Role::Guest,      Operation::UpdateBasic,      Access::Any),
    (Role::Admin,      Role::SuperAdmin, Operation::UpdatePrivileged, Access::Never),
    (Role::Admin,      Role::Admin,      Operation::UpdatePrivileged, Access::SelfOnly),
    (Role::Admin,      Role::Guest,      Operation::UpdatePrivileged, Access::Any),

    // Guest sees and edits only itself, and never the privileged fields.
    (Role::Guest,      Role::Guest,      Operation::View,             Access::SelfOnly),
    (Role::Guest,      Role::Guest,      Operation::UpdateBasic,      Access::SelfOnly),
    (Role::Guest,      Role::Guest,      Operation::UpdatePrivileged, Access::Never),
];

/// Reach of `requester` over a target of role `target` for `op`. Pairs with
/// no row (a Guest targeting anyone but a Guest) fall through to `Never`.
pub fn access(requester: Role, target: Role, op: Operation) -> Access {
    MATRIX
        .iter()
        .find(|(req, tgt, row_op, _)| *req == requester && *tgt == target && *row_op == op)
        .map(|(_, _, _, access)| *access)
        .unwrap_or(Access::Never)
}

/// Whether this concrete request passes the matrix.
pub fn permits(
    requester: Role,
    requester_id: i32,
    target: Role,
    target_id: i32,
    op: Operation,
) -> bool {
    match access(requester, target, op) {
        Access::Never => false,
        Access::SelfOnly => requester_id == target_id,
        Access::Any => true,
    }
}

/// Role ids a requester may see in listings. Empty means the requester may
/// not list at all.
pub fn visible_role_ids(requester: Role) -> Vec<i32> {
    match requester {
        Role::SuperAdmin => vec![1, 2, 3],
        Role::Admin => vec![2, 3],
        Role::Guest => vec![],
    }
}

/// Whether viewers of this role get the full record projection (id, role
/// name, block flag, audit fields) instead of the reduced one.
pub fn privileged_viewer(requester: Role) -> bool {
    requester.satisfies(Role::Admin)
}

/// The finite set of account-creation shapes. Which one applies is a pure
/// function of who is asking and how many accounts exist; there is no
/// caller-controlled way to pick a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationSchema {
    /// Empty system; whatever role was requested, the account becomes
    /// SuperAdmin.
    FirstUser,
    /// Unauthenticated caller on a non-empty system; role is forced to Guest.
    SelfRegistration,
    /// Admin caller; only Guest accounts may be created.
    AdminCreation,
    /// SuperAdmin caller; any role may be created.
    SuperAdminCreation,
}

/// Resolve the creation shape, or deny outright (Guests may never create).
pub fn registration_schema(
    caller_role: Option<Role>,
    total_users: u64,
) -> Result<RegistrationSchema, CoreError> {
    if total_users == 0 {
        return Ok(RegistrationSchema::FirstUser);
    }
    match caller_role {
        None => Ok(RegistrationSchema::SelfRegistration),
        Some(Role::Guest) => Err(CoreError::Unauthorized),
        Some(Role::Admin) => Ok(RegistrationSchema::AdminCreation),
        Some(Role::SuperAdmin) => Ok(RegistrationSchema::SuperAdminCreation),
    }
}

impl RegistrationSchema {
    /// The role the new account actually gets, given the requested role.
    /// `Err` means the requested role is out of reach for this shape.
    pub fn effective_role(self, requested: Option<Role>) -> Result<Role, CoreError> {
        match self {
            RegistrationSchema::FirstUser => Ok(Role::SuperAdmin),
            RegistrationSchema::SelfRegistration => Ok(Role::Guest),
            RegistrationSchema::AdminCreation => match requested {
                None | Some(Role::Guest) => Ok(Role::Guest),
                Some(_) => Err(CoreError::Unauthorized),
            },
            RegistrationSchema::SuperAdminCreation => Ok(requested.unwrap_or(Role::Guest)),
        }
    }
}
