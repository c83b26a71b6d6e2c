pub mod admin;
pub mod clients;
pub mod craftsmen;
pub mod health;
pub mod jobs;
pub mod me;
pub mod notifications;
pub mod quotes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/craftsmen", get(craftsmen::list_approved))
        .route(
            "/craftsmen/:craftsman_id/reviews",
            get(craftsmen::list_reviews),
        )
        // Identity and profiles
        .route("/me", get(me::get_me))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/clients/me",
            post(clients::register_client).get(clients::get_client),
        )
        .route(
            "/craftsmen/me",
            post(craftsmen::register_craftsman)
                .get(craftsmen::get_own_profile)
                .put(craftsmen::update_own_profile),
        )
        // Jobs
        .route("/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route("/jobs/:job_id", get(jobs::get_job))
        .route("/jobs/:job_id/assign", post(jobs::assign_job))
        .route("/jobs/:job_id/accept", post(jobs::accept_job))
        .route("/jobs/:job_id/reject", post(jobs::reject_job))
        .route("/jobs/:job_id/submit-quote", post(jobs::submit_quote))
        .route("/jobs/:job_id/approve-quote", post(jobs::approve_quote))
        .route("/jobs/:job_id/reject-quote", post(jobs::reject_quote))
        .route("/jobs/:job_id/start", post(jobs::start_job))
        .route("/jobs/:job_id/complete", post(jobs::complete_job))
        .route(
            "/jobs/:job_id/dispatch-payment",
            post(jobs::dispatch_payment),
        )
        .route("/jobs/:job_id/confirm-payment", post(jobs::confirm_payment))
        .route("/jobs/:job_id/cancel", post(jobs::cancel_job))
        .route("/jobs/:job_id/reviews", post(jobs::submit_review))
        .route("/jobs/:job_id/payment", get(jobs::get_payment))
        .route("/quotes/preview", post(quotes::preview_quote))
        // Admin
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/craftsmen", get(admin::list_craftsmen))
        .route("/admin/craftsmen/pending", get(admin::pending_craftsmen))
        .route(
            "/admin/craftsmen/:craftsman_id/evaluation",
            get(admin::evaluate_craftsman),
        )
        .route(
            "/admin/craftsmen/:craftsman_id/approve",
            post(admin::approve_craftsman),
        )
        .route(
            "/admin/craftsmen/:craftsman_id/reject",
            post(admin::reject_craftsman),
        )
        .route(
            "/admin/craftsmen/:craftsman_id/toggle-active",
            post(admin::toggle_craftsman_active),
        )
        .route("/admin/jobs/unassigned", get(admin::unassigned_jobs))
        .route(
            "/admin/jobs/ready-for-payment",
            get(admin::jobs_ready_for_payment),
        )
}
