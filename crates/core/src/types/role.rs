//! Roles and the permissions they grant.
//!
//! Views never compare role strings directly; they declare the [`Permission`]
//! they need and ask the role whether it grants it.

use serde::{Deserialize, Serialize};

/// Role stored on a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Store administrator: manages products, orders and user roles.
    Admin,
    /// Regular shopper.
    #[default]
    Customer,
}

/// Capability a view requires before it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Any signed-in user.
    Authenticated,
    /// Back-office access: catalogue, order status and role management.
    ManageStore,
}

impl Role {
    /// Whether this role grants `permission`.
    #[must_use]
    pub const fn grants(self, permission: Permission) -> bool {
        match permission {
            Permission::Authenticated => true,
            Permission::ManageStore => matches!(self, Self::Admin),
        }
    }

    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_grants_everything() {
        assert!(Role::Admin.grants(Permission::Authenticated));
        assert!(Role::Admin.grants(Permission::ManageStore));
    }

    #[test]
    fn test_customer_cannot_manage_store() {
        assert!(Role::Customer.grants(Permission::Authenticated));
        assert!(!Role::Customer.grants(Permission::ManageStore));
    }

    #[test]
    fn test_default_is_customer() {
        assert_eq!(Role::default(), Role::Customer);
    }

    #[test]
    fn test_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Customer).unwrap(), "\"customer\"");
    }
}
