//! Identity, role profile and permission model.
//!
//! # Responsibility
//! - Define the coarse `Role` carried by every identity's profile.
//! - Define the fine-grained book `Permission` set and the default
//!   role -> permission policy.
//! - Validate identity fields (username, email) before persistence.
//!
//! # Invariants
//! - Each identity owns exactly one `UserProfile`; its role defaults to
//!   `Role::Member`.
//! - Permission codenames are stable strings shared with the schema.

use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type IdentityId = Uuid;
pub type ProfileId = Uuid;
pub type GroupId = Uuid;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]{1,150}$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Coarse role used for dashboard routing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Librarian,
    #[default]
    Member,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Librarian, Role::Member];

    /// Stable string stored in `user_profiles.role`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Librarian => "librarian",
            Self::Member => "member",
        }
    }

    /// User-facing label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Librarian => "Librarian",
            Self::Member => "Member",
        }
    }

    /// Name of the permission group bound to this role.
    pub fn group_name(self) -> &'static str {
        match self {
            Self::Admin => "Admins",
            Self::Librarian => "Librarians",
            Self::Member => "Members",
        }
    }

    /// Default permission policy for the role's group.
    pub fn policy_permissions(self) -> &'static [Permission] {
        match self {
            Self::Admin => &Permission::ALL,
            Self::Librarian => &[
                Permission::AddBook,
                Permission::ChangeBook,
                Permission::ViewBook,
            ],
            Self::Member => &[Permission::ViewBook],
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "librarian" => Ok(Self::Librarian),
            "member" => Ok(Self::Member),
            _ => Err(ValidationError::UnknownRole(value.to_string())),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fine-grained book permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "can_add_book")]
    AddBook,
    #[serde(rename = "can_change_book")]
    ChangeBook,
    #[serde(rename = "can_delete_book")]
    DeleteBook,
    #[serde(rename = "can_view_book")]
    ViewBook,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::AddBook,
        Permission::ChangeBook,
        Permission::DeleteBook,
        Permission::ViewBook,
    ];

    /// Stable codename stored in the `permissions` table.
    pub fn codename(self) -> &'static str {
        match self {
            Self::AddBook => "can_add_book",
            Self::ChangeBook => "can_change_book",
            Self::DeleteBook => "can_delete_book",
            Self::ViewBook => "can_view_book",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AddBook => "Can add book",
            Self::ChangeBook => "Can change book",
            Self::DeleteBook => "Can delete book",
            Self::ViewBook => "Can view book",
        }
    }

    /// Parses a codename; the `can_` prefix is optional.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim();
        let bare = normalized.strip_prefix("can_").unwrap_or(normalized);
        match bare {
            "add_book" => Ok(Self::AddBook),
            "change_book" => Ok(Self::ChangeBook),
            "delete_book" => Ok(Self::DeleteBook),
            "view_book" => Ok(Self::ViewBook),
            _ => Err(ValidationError::UnknownPermission(value.to_string())),
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.codename())
    }
}

/// Authenticated principal known to the store.
///
/// Credentials live with the external identity provider; only the fields the
/// access layer needs are kept here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uuid: IdentityId,
    pub username: String,
    pub email: Option<String>,
    pub is_staff: bool,
    /// Superusers hold every permission regardless of grants.
    pub is_superuser: bool,
    /// Epoch milliseconds, assigned by the store.
    pub created_at: i64,
}

impl Identity {
    pub fn new(username: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            username: username.into(),
            email,
            is_staff: false,
            is_superuser: false,
            created_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !USERNAME_RE.is_match(&self.username) {
            return Err(ValidationError::InvalidUsername(self.username.clone()));
        }
        if let Some(email) = self.email.as_deref() {
            if !EMAIL_RE.is_match(email) {
                return Err(ValidationError::InvalidEmail(email.to_string()));
            }
        }
        Ok(())
    }
}

/// Role profile paired one-to-one with an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uuid: ProfileId,
    pub identity_uuid: IdentityId,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_librarian(&self) -> bool {
        self.role == Role::Librarian
    }

    pub fn is_member(&self) -> bool {
        self.role == Role::Member
    }
}

/// Named permission group. Role groups carry the role they serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: GroupId,
    pub name: String,
    pub role: Option<Role>,
}
