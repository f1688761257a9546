//! Fixed role enumeration and the client-facing numeric id mapping.

use serde::Serialize;

/// Roles a user can hold. Clients refer to roles by a 1-based numeric id;
/// that mapping lives here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub const ALL: &'static [Self] = &[Self::User, Self::Admin];

    /// Resolves a 1-based client id to a role. Out-of-range ids are a
    /// defined error for callers, not a panic or silent default.
    #[must_use]
    pub const fn from_client_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::User),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub const fn client_id(self) -> i32 {
        match self {
            Self::User => 1,
            Self::Admin => 2,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Admin => "ROLE_ADMIN",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.name() == name)
    }
}
