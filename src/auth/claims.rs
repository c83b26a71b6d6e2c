use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub aud: String,

    pub iss: String,

    pub iat: i64,

    pub exp: i64,

    #[serde(default)]
    pub nbf: Option<i64>,

    #[serde(default)]
    pub email: Option<String>,

    /// Top-level role claim, often a database role such as `authenticated`
    #[serde(default)]
    pub role: Option<String>,

    /// Provider-controlled metadata; carries the marketplace role
    #[serde(default)]
    pub app_metadata: Option<AppMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppMetadata {
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub provider: Option<String>,
}

impl Claims {
    /// Marketplace role: `app_metadata.role`, else the top-level `role` claim
    pub fn marketplace_role(&self) -> Option<Role> {
        self.app_metadata
            .as_ref()
            .and_then(|m| m.role.as_deref())
            .and_then(Role::parse)
            .or_else(|| self.role.as_deref().and_then(Role::parse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(top: Option<&str>, meta: Option<&str>) -> Claims {
        Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            aud: "authenticated".to_string(),
            iss: "https://auth.example.com".to_string(),
            iat: 0,
            exp: 0,
            nbf: None,
            email: None,
            role: top.map(str::to_string),
            app_metadata: Some(AppMetadata {
                role: meta.map(str::to_string),
                provider: None,
            }),
        }
    }

    #[test]
    fn app_metadata_role_wins() {
        let c = claims(Some("authenticated"), Some("craftsman"));
        assert_eq!(c.marketplace_role(), Some(Role::Craftsman));
    }

    #[test]
    fn falls_back_to_top_level_role() {
        assert_eq!(claims(Some("admin"), None).marketplace_role(), Some(Role::Admin));
        assert_eq!(claims(Some("authenticated"), None).marketplace_role(), None);
    }
}
