use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::AuthContext;
use crate::app::AppState;
use crate::domain::{Actor, Role};
use crate::error::ErrorResponse;

/// Extractor that requires a valid bearer token. The caller may not have a
/// marketplace role yet; use [`RequireActor`] or a role extractor for that.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl std::ops::Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
    /// Authenticated, but without a marketplace role
    NoRole,
    /// Authenticated with a role that may not use this route
    WrongRole(Role),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing authorization token".to_string(),
            ),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid authorization format".to_string(),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid or expired token".to_string(),
            ),
            AuthError::NoRole => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "No marketplace role granted".to_string(),
            ),
            AuthError::WrongRole(role) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                format!("Not available to {} accounts", role),
            ),
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message,
            details: None,
            request_id: None,
        };

        (status, Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = state.jwks_cache.verify_token(token).await.map_err(|e| {
            tracing::warn!(error = %e, "JWT verification failed");
            AuthError::InvalidToken
        })?;

        let context = AuthContext::from_claims(&claims).map_err(|e| {
            tracing::warn!(error = %e, "Failed to build auth context");
            AuthError::InvalidToken
        })?;

        Ok(RequireAuth(context))
    }
}

/// Extractor for any authenticated user holding a marketplace role
#[derive(Debug, Clone, Copy)]
pub struct RequireActor(pub Actor);

impl std::ops::Deref for RequireActor {
    type Target = Actor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireActor {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth = RequireAuth::from_request_parts(parts, state).await?;
        auth.actor().map(RequireActor).ok_or_else(|| {
            tracing::warn!(user_id = %auth.user_id, "Token carries no marketplace role");
            AuthError::NoRole
        })
    }
}

/// Extractor that requires the admin role
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Actor);

impl std::ops::Deref for RequireAdmin {
    type Target = Actor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireActor(actor) = RequireActor::from_request_parts(parts, state).await?;
        if actor.role != Role::Admin {
            tracing::warn!(user_id = %actor.id, role = %actor.role, "Non-admin attempted admin route");
            return Err(AuthError::WrongRole(actor.role));
        }
        Ok(RequireAdmin(actor))
    }
}

/// Extractor that requires the craftsman role
#[derive(Debug, Clone, Copy)]
pub struct RequireCraftsman(pub Actor);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireCraftsman {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireActor(actor) = RequireActor::from_request_parts(parts, state).await?;
        if actor.role != Role::Craftsman {
            return Err(AuthError::WrongRole(actor.role));
        }
        Ok(RequireCraftsman(actor))
    }
}

/// Extractor that requires the client role
#[derive(Debug, Clone, Copy)]
pub struct RequireClient(pub Actor);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireClient {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireActor(actor) = RequireActor::from_request_parts(parts, state).await?;
        if actor.role != Role::Client {
            return Err(AuthError::WrongRole(actor.role));
        }
        Ok(RequireClient(actor))
    }
}
