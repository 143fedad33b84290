use serde::{Deserialize, Serialize};

/// Role carried in the `usertype` claim.
///
/// On the wire the role is a string flag where exactly `"1"` marks an
/// administrator. Any other value, including the empty string, is a
/// standard user.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub const ADMIN_CODE: &'static str = "1";
    pub const USER_CODE: &'static str = "0";

    /// The `usertype` string for this role.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            UserRole::Admin => Self::ADMIN_CODE,
            UserRole::User => Self::USER_CODE,
        }
    }

    #[must_use]
    pub fn is_admin(self) -> bool {
        self == UserRole::Admin
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
        }
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        if s == Self::ADMIN_CODE {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        UserRole::from(s.as_str())
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.code().to_string()
    }
}

/// The externally owned user a token is issued for.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub usertype: UserRole,
}
