//! Roles and the capabilities they grant.
//!
//! Capability checks are plain functions over closed enums so they can be
//! tested without HTTP or storage.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Back-office role carried by every user and every access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Staff,
}

/// Something a role may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewDashboard,
    ManagePackages,
    ManageDrivers,
    ManageMerchants,
    ManageSettings,
    ManageUsers,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::ViewDashboard,
        Capability::ManagePackages,
        Capability::ManageDrivers,
        Capability::ManageMerchants,
        Capability::ManageSettings,
        Capability::ManageUsers,
    ];
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::Staff];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
        }
    }

    /// Whether this role grants `capability`.
    pub fn can(self, capability: Capability) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::Admin => capability != Capability::ManageUsers,
            Role::Staff => {
                matches!(capability, Capability::ViewDashboard | Capability::ManagePackages)
            }
        }
    }

    /// Every capability this role grants, in declaration order.
    pub fn capabilities(self) -> Vec<Capability> {
        Capability::ALL.into_iter().filter(|c| self.can(*c)).collect()
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "STAFF" => Ok(Role::Staff),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// Error returned when role parsing fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);
