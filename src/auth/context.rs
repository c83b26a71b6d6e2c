use super::Claims;
use uuid::Uuid;

use crate::domain::{Actor, Role};

/// Verified caller identity
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// From the `sub` claim; doubles as the client or craftsman id
    pub user_id: Uuid,
    pub email: Option<String>,
    /// None when the token carries no marketplace role yet
    pub role: Option<Role>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role: claims.marketplace_role(),
        })
    }

    pub fn actor(&self) -> Option<Actor> {
        self.role.map(|role| Actor {
            id: self.user_id,
            role,
        })
    }
}
