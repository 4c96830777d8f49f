//! Account + role schema for database and permission checks

use chrono::Utc;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use uuid::Uuid;

/// Coarse access level for an account. Every account has exactly one.
/// Stored in the database as an integer column.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
#[derive(sqlx::Type)]
#[repr(i32)]
#[derive(PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User = 0,
    Manager = 1,
    Admin = 2
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
            Role::Admin => "admin"
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permission strings granted to each role. Each set is enumerated on its
/// own: granting a permission to one role never implies it for another
pub fn permissions_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::User => &[
            "create_post", "purchase_post", "favorite_post",
            "rate_post", "comment_post"
        ],
        Role::Manager => &[
            "create_post", "purchase_post", "favorite_post",
            "rate_post", "comment_post",
            "approve_post", "suspend_user"
        ],
        // TODO: admin lacks approve_post while manager has it, so only
        // managers can approve listings. Needs a product decision before
        // adding it here
        Role::Admin => &[
            "create_post", "purchase_post", "favorite_post",
            "rate_post", "comment_post",
            "suspend_user", "change_role", "delete_user", "delete_any_post"
        ]
    }
}

/// Same lookup from an untrusted role name. Unknown names resolve to the
/// empty set, which every permission check treats as a denial.
pub fn permissions_for_name(role: &str) -> &'static [&'static str] {
    match Role::parse(role) {
        Some(role) => permissions_for(role),
        None => &[]
    }
}

/// An account as stored, minus the password hash. The hash never leaves
/// the handler layer.
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub pfp_url: String,
    pub role: Role,
    pub suspended: bool,
    pub created: chrono::DateTime<Utc>,
    pub settings: Value
}

/// The shape returned to API callers
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub pfp_url: String,
    pub role: Role,
    pub suspended: bool
}

impl From<&Account> for AccountView {
    fn from(a: &Account) -> AccountView {
        AccountView {
            id: a.id,
            name: a.name.clone(),
            email: a.email.clone(),
            bio: a.bio.clone(),
            pfp_url: a.pfp_url.clone(),
            role: a.role,
            suspended: a.suspended
        }
    }
}
