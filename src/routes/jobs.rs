//! Job request routes
//!
//! Every action endpoint is a thin wrapper around one `Marketplace` call; the
//! engine owns validation, authorization and the version check. Handlers take
//! any role so a wrong-role caller gets the engine's `UNAUTHORIZED_TRANSITION`.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{Created, DataResponse, Paginated, PaginationParams};
use crate::auth::RequireActor;
use crate::domain::{
    AssignJobRequest, CompleteJobRequest, CreateJobRequest, JobRequest, JobStatus,
    PaymentRecord, ReasonRequest, SubmitQuoteRequest, SubmitReviewRequest,
};
use crate::engine::Marketplace;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct StatusFilter {
    /// Comma-separated; any casing or separator style is accepted
    pub status: Option<String>,
}

impl StatusFilter {
    fn statuses(&self) -> Result<Vec<JobStatus>, ApiError> {
        let Some(raw) = self.status.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<JobStatus>()
                    .map_err(|e| ApiError::bad_request(e.to_string()))
            })
            .collect()
    }
}

/// Job state together with its payment record
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub job: JobRequest,
    pub payment: PaymentRecord,
}

fn reason(body: Option<Json<ReasonRequest>>) -> Option<String> {
    body.and_then(|Json(req)| req.reason)
}

/// POST /jobs
pub async fn create_job(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market.create_job(&actor, req).await?;
    Ok(Created(job))
}

/// GET /jobs
///
/// Clients see their own jobs, craftsmen their queue, admins everything.
pub async fn list_jobs(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<StatusFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let statuses = filter.statuses()?;
    let (jobs, total) = market
        .jobs_for(&actor, statuses, pagination.window())
        .await?;
    Ok(Paginated::new(jobs, &pagination, total))
}

/// GET /jobs/:job_id
pub async fn get_job(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market.job_for(&actor, job_id).await?;
    Ok(DataResponse::new(job))
}

/// GET /jobs/:job_id/payment
pub async fn get_payment(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = market.payment_for(&actor, job_id).await?;
    Ok(DataResponse::new(payment))
}

// ============================================================================
// Admin actions
// ============================================================================

/// POST /jobs/:job_id/assign
pub async fn assign_job(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
    Json(req): Json<AssignJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market
        .assign_job(&actor, job_id, req.craftsman_id)
        .await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/dispatch-payment
pub async fn dispatch_payment(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (job, payment) = market.dispatch_payment(&actor, job_id).await?;
    Ok(DataResponse::new(SettlementResponse { job, payment }))
}

// ============================================================================
// Craftsman actions
// ============================================================================

/// POST /jobs/:job_id/accept
pub async fn accept_job(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market.accept_job(&actor, job_id).await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/reject
pub async fn reject_job(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market
        .reject_job(&actor, job_id, reason(body))
        .await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/submit-quote
pub async fn submit_quote(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
    Json(req): Json<SubmitQuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market
        .submit_quote(&actor, job_id, req.quote_details)
        .await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/start
pub async fn start_job(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market.start_job(&actor, job_id).await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/complete
pub async fn complete_job(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
    Json(req): Json<CompleteJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market.complete_job(&actor, job_id, req).await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/confirm-payment
///
/// Safe to retry: a second confirmation returns the settled state unchanged.
pub async fn confirm_payment(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (job, payment) = market
        .confirm_payment_received(&actor, job_id)
        .await?;
    Ok(DataResponse::new(SettlementResponse { job, payment }))
}

// ============================================================================
// Client actions
// ============================================================================

/// POST /jobs/:job_id/approve-quote
pub async fn approve_quote(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market.approve_quote(&actor, job_id).await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/reject-quote
pub async fn reject_quote(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market
        .reject_quote(&actor, job_id, reason(body))
        .await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/cancel
pub async fn cancel_job(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let job = market.cancel_job(&actor, job_id).await?;
    Ok(DataResponse::new(job))
}

/// POST /jobs/:job_id/reviews
pub async fn submit_review(
    State(market): State<Marketplace>,
    actor: RequireActor,
    Path(job_id): Path<Uuid>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review = market.submit_review(&actor, job_id, req).await?;
    Ok(Created(review))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::{body::to_bytes, http::StatusCode};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use crate::domain::{Actor, RegisterClientRequest};
    use crate::engine::JobPolicy;
    use crate::store::MemoryStore;

    fn filter(raw: &str) -> StatusFilter {
        StatusFilter {
            status: Some(raw.to_string()),
        }
    }

    #[test]
    fn status_filter_accepts_casing_variants() {
        let statuses = filter("pending, QUOTE_SUBMITTED,PaymentPending").statuses().unwrap();
        assert_eq!(
            statuses,
            vec![
                JobStatus::Pending,
                JobStatus::QuoteSubmitted,
                JobStatus::PaymentPending
            ]
        );
    }

    #[test]
    fn status_filter_rejects_unknown_status() {
        assert!(matches!(
            filter("Pending,Archived").statuses(),
            Err(ApiError::BadRequest(_))
        ));
        assert!(StatusFilter::default().statuses().unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_role_transition_reports_engine_code() {
        let market = Marketplace::new(Arc::new(MemoryStore::new()), JobPolicy::default());
        let client = Actor::client(Uuid::new_v4());
        market
            .register_client(
                client.id,
                RegisterClientRequest {
                    full_name: "Wanjiru Kamau".to_string(),
                    phone: None,
                    email: None,
                },
            )
            .await
            .unwrap();
        let job = market
            .create_job(
                &client,
                CreateJobRequest {
                    service: "carpentry".to_string(),
                    budget: Decimal::from(2500),
                    schedule: Utc::now() + Duration::days(1),
                    location: Some("Kilimani".to_string()),
                    address: None,
                    description: "Hang two kitchen cabinets".to_string(),
                    is_urgent: false,
                    preferred_craftsman_id: None,
                },
            )
            .await
            .unwrap();

        let Err(err) = start_job(State(market), RequireActor(client), Path(job.id)).await else {
            panic!("client must not start a job");
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "UNAUTHORIZED_TRANSITION");
    }
}
