use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::api::{DataResponse, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireActor;
use crate::error::ApiError;

/// GET /notifications
///
/// Newest first. Admins read the shared inbox of recipient-less events.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    actor: RequireActor,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .marketplace
        .notifications_for(&actor, pagination.window())
        .await?;
    Ok(DataResponse::new(notifications))
}
