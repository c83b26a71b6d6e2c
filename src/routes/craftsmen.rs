//! Craftsman profile and public directory routes
//!
//! The public directory is read through Redis. Anything that can change who
//! appears in it (approval decisions, activity toggles, profile edits) drops
//! every cached listing via [`invalidate_directory`].

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireCraftsman;
use crate::domain::{CraftsmanPublic, RegisterCraftsmanRequest, UpdateCraftsmanRequest};
use crate::error::ApiError;
use crate::services::cache::keys;

#[derive(Debug, Deserialize, Default)]
pub struct DirectoryParams {
    pub service: Option<String>,
}

/// Drop cached directory listings. A Redis failure is logged and ignored so
/// the committed change still succeeds; entries expire on their TTL.
pub(crate) async fn invalidate_directory(state: &AppState) {
    if let Err(e) = state.cache.delete_pattern(&keys::directory_pattern()).await {
        tracing::warn!(error = %e, "Failed to invalidate craftsman directory cache");
    }
}

/// POST /craftsmen/me
pub async fn register_craftsman(
    State(state): State<Arc<AppState>>,
    RequireCraftsman(actor): RequireCraftsman,
    Json(req): Json<RegisterCraftsmanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let craftsman = state.marketplace.register_craftsman(actor.id, req).await?;
    Ok(Created(craftsman))
}

/// GET /craftsmen/me
pub async fn get_own_profile(
    State(state): State<Arc<AppState>>,
    RequireCraftsman(actor): RequireCraftsman,
) -> Result<impl IntoResponse, ApiError> {
    let craftsman = state.marketplace.craftsman_profile(actor.id).await?;
    Ok(DataResponse::new(craftsman))
}

/// PUT /craftsmen/me
pub async fn update_own_profile(
    State(state): State<Arc<AppState>>,
    RequireCraftsman(actor): RequireCraftsman,
    Json(req): Json<UpdateCraftsmanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let craftsman = state
        .marketplace
        .update_craftsman_profile(actor.id, req)
        .await?;
    invalidate_directory(&state).await;
    Ok(DataResponse::new(craftsman))
}

/// GET /craftsmen
///
/// Public listing of approved, active craftsmen, optionally filtered by service.
pub async fn list_approved(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DirectoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let service = params
        .service
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let key = keys::craftsman_directory(service.as_deref());

    if let Some(cached) = state.cache.get::<Vec<CraftsmanPublic>>(&key).await {
        return Ok(DataResponse::new(cached));
    }

    let craftsmen = state.marketplace.approved_craftsmen(service).await?;

    if let Err(e) = state.cache.set(&key, &craftsmen).await {
        tracing::warn!(error = %e, key = %key, "Failed to cache craftsman directory");
    }

    Ok(DataResponse::new(craftsmen))
}

/// GET /craftsmen/:craftsman_id/reviews
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(craftsman_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = state.marketplace.craftsman_reviews(craftsman_id).await?;
    Ok(DataResponse::new(reviews))
}
