use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// The fixed set of roles offered by the role selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Admin,
    Manager,
}

impl UserType {
    pub const ALL: [UserType; 2] = [UserType::Admin, UserType::Manager];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
        }
    }

    /// Value sent as the `role` variable of the directory query.
    pub fn query_variable(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
        }
    }

    /// Case-insensitive comparison against a role string from the wire.
    pub fn matches(&self, role: &str) -> bool {
        role.trim().eq_ignore_ascii_case(self.label())
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UserType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}
