//! Acting identities
//!
//! Every engine operation is performed by an `Actor`: the authenticated user id
//! plus the role granted by the auth collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of the acting identity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Craftsman,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Craftsman => "craftsman",
            Role::Admin => "admin",
        }
    }

    /// Parse a role claim. Unknown roles yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "customer" => Some(Role::Client),
            "craftsman" | "artisan" => Some(Role::Craftsman),
            "admin" | "staff" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The identity performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

#[cfg(test)]
impl Actor {
    pub fn client(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Client,
        }
    }

    pub fn craftsman(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Craftsman,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }
}
