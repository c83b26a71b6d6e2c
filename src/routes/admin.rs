//! Admin console routes: craftsman vetting and operational dashboards

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::{CraftsmanQuery, RejectCraftsmanRequest};
use crate::error::ApiError;
use crate::routes::craftsmen::invalidate_directory;

#[derive(Debug, Deserialize, Default)]
pub struct CraftsmenParams {
    pub approved: Option<bool>,
    pub active: Option<bool>,
    pub service: Option<String>,
}

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.marketplace.dashboard_stats().await?;
    Ok(DataResponse::new(stats))
}

/// GET /admin/craftsmen
pub async fn list_craftsmen(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Query(params): Query<CraftsmenParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = CraftsmanQuery {
        approved: params.approved,
        active: params.active,
        service: params.service.filter(|s| !s.trim().is_empty()),
    };
    let craftsmen = state.marketplace.list_craftsmen(&query).await?;
    Ok(DataResponse::new(craftsmen))
}

/// GET /admin/craftsmen/pending
///
/// Approval queue, rejected profiles included until they are resubmitted.
pub async fn pending_craftsmen(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let craftsmen = state.marketplace.pending_craftsmen().await?;
    Ok(DataResponse::new(craftsmen))
}

/// GET /admin/craftsmen/:craftsman_id/evaluation
///
/// Lists the fields still blocking approval.
pub async fn evaluate_craftsman(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Path(craftsman_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let evaluation = state.marketplace.evaluate_craftsman(craftsman_id).await?;
    Ok(DataResponse::new(evaluation))
}

/// POST /admin/craftsmen/:craftsman_id/approve
pub async fn approve_craftsman(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(craftsman_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let craftsman = state.marketplace.approve_craftsman(craftsman_id).await?;
    invalidate_directory(&state).await;

    tracing::info!(admin_id = %admin.id, craftsman_id = %craftsman_id, "Craftsman approved");
    Ok(DataResponse::new(craftsman))
}

/// POST /admin/craftsmen/:craftsman_id/reject
pub async fn reject_craftsman(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(craftsman_id): Path<Uuid>,
    Json(req): Json<RejectCraftsmanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let craftsman = state
        .marketplace
        .reject_craftsman(craftsman_id, &req.reason)
        .await?;
    invalidate_directory(&state).await;

    tracing::info!(admin_id = %admin.id, craftsman_id = %craftsman_id, "Craftsman rejected");
    Ok(DataResponse::new(craftsman))
}

/// POST /admin/craftsmen/:craftsman_id/toggle-active
pub async fn toggle_craftsman_active(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Path(craftsman_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let craftsman = state
        .marketplace
        .toggle_craftsman_active(craftsman_id)
        .await?;
    invalidate_directory(&state).await;
    Ok(DataResponse::new(craftsman))
}

/// GET /admin/jobs/unassigned
pub async fn unassigned_jobs(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (jobs, total) = state
        .marketplace
        .unassigned_jobs(pagination.window())
        .await?;
    Ok(Paginated::new(jobs, &pagination, total))
}

/// GET /admin/jobs/ready-for-payment
pub async fn jobs_ready_for_payment(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (jobs, total) = state
        .marketplace
        .jobs_ready_for_payment(pagination.window())
        .await?;
    Ok(Paginated::new(jobs, &pagination, total))
}
