use std::fmt;

/// The three-tier role hierarchy. Smaller id = more privilege.
///
/// Role is always resolved from the user record at request time, never from a
/// token payload, so a downgraded user cannot keep acting on a stale token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    SuperAdmin = 1,
    Admin = 2,
    Guest = 3,
}

impl Role {
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Role::SuperAdmin),
            2 => Some(Role::Admin),
            3 => Some(Role::Guest),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
            Role::Guest => "Guest",
        }
    }

    /// Whether this role meets a route's minimum-role requirement.
    /// A SuperAdmin satisfies an Admin-level route, not the other way around.
    pub fn satisfies(self, required: Role) -> bool {
        self <= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
