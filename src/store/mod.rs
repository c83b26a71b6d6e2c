//! Persistence behind the marketplace engine
//!
//! The engine computes every change as a pure value; stores only load and
//! commit. A job commit carries the version the change was computed against
//! and is rejected when another commit got there first.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Client, Craftsman, CraftsmanQuery, DashboardStats, JobEvent, JobQuery, JobRequest,
    Notification, PaymentRecord, Review,
};
use crate::engine::EngineResult;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Limit/offset window for list queries
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    #[cfg(test)]
    pub fn all() -> Self {
        Self {
            limit: u32::MAX,
            offset: 0,
        }
    }
}

/// One atomic job change: the new job state, an optional payment record
/// written alongside it and the event that must be delivered.
#[derive(Debug, Clone)]
pub struct JobCommit {
    pub job: JobRequest,
    pub expected_version: i64,
    pub payment: Option<PaymentRecord>,
    pub event: JobEvent,
}

#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    async fn insert_client(&self, client: &Client) -> EngineResult<Client>;

    async fn client(&self, id: Uuid) -> EngineResult<Option<Client>>;

    async fn insert_craftsman(&self, craftsman: &Craftsman) -> EngineResult<Craftsman>;

    /// Overwrite a craftsman profile loaded at `craftsman.version`, recording
    /// `event` in the same unit. Fails with `StaleProfile` when another write
    /// landed first; returns the profile with its new version.
    async fn update_craftsman(
        &self,
        craftsman: &Craftsman,
        event: Option<&JobEvent>,
    ) -> EngineResult<Craftsman>;

    async fn craftsman(&self, id: Uuid) -> EngineResult<Option<Craftsman>>;

    async fn list_craftsmen(&self, query: &CraftsmanQuery) -> EngineResult<Vec<Craftsman>>;

    async fn insert_job(&self, job: &JobRequest, event: &JobEvent) -> EngineResult<JobRequest>;

    async fn job(&self, id: Uuid) -> EngineResult<Option<JobRequest>>;

    /// Matching jobs, newest first, with the total match count
    async fn list_jobs(&self, query: &JobQuery, page: Page)
        -> EngineResult<(Vec<JobRequest>, u64)>;

    /// Persist a transition. Fails with `ConcurrentModification` when the stored
    /// version is not `expected_version`; returns the job with its new version.
    async fn commit_job(&self, commit: JobCommit) -> EngineResult<JobRequest>;

    async fn payment_for_job(&self, job_id: Uuid) -> EngineResult<Option<PaymentRecord>>;

    /// Fails with `DuplicateReview` when the client already reviewed the job
    async fn insert_review(&self, review: &Review, event: &JobEvent) -> EngineResult<Review>;

    async fn review_for(&self, client_id: Uuid, job_id: Uuid) -> EngineResult<Option<Review>>;

    async fn reviews_for_craftsman(&self, craftsman_id: Uuid) -> EngineResult<Vec<Review>>;

    /// Outbox rows for a user; `None` reads the admin inbox
    async fn notifications(&self, user_id: Option<Uuid>, page: Page)
        -> EngineResult<Vec<Notification>>;

    async fn dashboard_stats(&self) -> EngineResult<DashboardStats>;
}

/// Outbox row for an event
pub(crate) fn notification_from(event: &JobEvent, now: chrono::DateTime<chrono::Utc>) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        user_id: event.recipient_id,
        job_id: event.job_id,
        notification_type: event.notification_type.to_string(),
        title: event.title.clone(),
        message: event.message.clone(),
        data: event.data.clone(),
        created_at: now,
    }
}
