//! Client profile routes

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireClient;
use crate::domain::RegisterClientRequest;
use crate::error::ApiError;

/// POST /clients/me
pub async fn register_client(
    State(state): State<Arc<AppState>>,
    RequireClient(actor): RequireClient,
    Json(req): Json<RegisterClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = state.marketplace.register_client(actor.id, req).await?;
    Ok(Created(client))
}

/// GET /clients/me
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    RequireClient(actor): RequireClient,
) -> Result<impl IntoResponse, ApiError> {
    let client = state.marketplace.client_profile(actor.id).await?;
    Ok(DataResponse::new(client))
}
