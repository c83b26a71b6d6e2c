//! In-process store backing the engine tests
//!
//! A single `RwLock` guards all tables, so a commit is atomic with respect to
//! every other operation on the same store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{notification_from, JobCommit, MarketplaceStore, Page};
use crate::domain::{
    Client, Craftsman, CraftsmanQuery, DashboardStats, JobEvent, JobQuery, JobRequest, JobStatus,
    Notification, PaymentRecord, Review, StatusCount,
};
use crate::engine::{EngineError, EngineResult};

#[derive(Default)]
struct Tables {
    clients: HashMap<Uuid, Client>,
    craftsmen: HashMap<Uuid, Craftsman>,
    jobs: HashMap<Uuid, JobRequest>,
    payments: HashMap<Uuid, PaymentRecord>,
    reviews: Vec<Review>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn record(&mut self, event: &JobEvent) {
        self.notifications.push(notification_from(event, Utc::now()));
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn window<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl MarketplaceStore for MemoryStore {
    async fn insert_client(&self, client: &Client) -> EngineResult<Client> {
        let mut t = self.tables.write();
        if t.clients.contains_key(&client.id) {
            return Err(EngineError::validation("client profile already exists"));
        }
        t.clients.insert(client.id, client.clone());
        Ok(client.clone())
    }

    async fn client(&self, id: Uuid) -> EngineResult<Option<Client>> {
        Ok(self.tables.read().clients.get(&id).cloned())
    }

    async fn insert_craftsman(&self, craftsman: &Craftsman) -> EngineResult<Craftsman> {
        let mut t = self.tables.write();
        if t.craftsmen.contains_key(&craftsman.id) {
            return Err(EngineError::validation("craftsman profile already exists"));
        }
        t.craftsmen.insert(craftsman.id, craftsman.clone());
        Ok(craftsman.clone())
    }

    async fn update_craftsman(
        &self,
        craftsman: &Craftsman,
        event: Option<&JobEvent>,
    ) -> EngineResult<Craftsman> {
        let mut t = self.tables.write();
        let Some(stored) = t.craftsmen.get_mut(&craftsman.id) else {
            return Err(EngineError::not_found("craftsman"));
        };
        if stored.version != craftsman.version {
            return Err(EngineError::StaleProfile {
                craftsman_id: craftsman.id,
            });
        }

        let mut updated = craftsman.clone();
        updated.version += 1;
        *stored = updated.clone();
        if let Some(event) = event {
            t.record(event);
        }
        Ok(updated)
    }

    async fn craftsman(&self, id: Uuid) -> EngineResult<Option<Craftsman>> {
        Ok(self.tables.read().craftsmen.get(&id).cloned())
    }

    async fn list_craftsmen(&self, query: &CraftsmanQuery) -> EngineResult<Vec<Craftsman>> {
        let t = self.tables.read();
        let mut found: Vec<Craftsman> = t
            .craftsmen
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert_job(&self, job: &JobRequest, event: &JobEvent) -> EngineResult<JobRequest> {
        let mut t = self.tables.write();
        t.jobs.insert(job.id, job.clone());
        t.record(event);
        Ok(job.clone())
    }

    async fn job(&self, id: Uuid) -> EngineResult<Option<JobRequest>> {
        Ok(self.tables.read().jobs.get(&id).cloned())
    }

    async fn list_jobs(
        &self,
        query: &JobQuery,
        page: Page,
    ) -> EngineResult<(Vec<JobRequest>, u64)> {
        let t = self.tables.read();
        let mut found: Vec<JobRequest> =
            t.jobs.values().filter(|j| query.matches(j)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = found.len() as u64;
        Ok((window(found, page), total))
    }

    async fn commit_job(&self, commit: JobCommit) -> EngineResult<JobRequest> {
        let mut t = self.tables.write();
        let job_id = commit.job.id;

        let Some(stored) = t.jobs.get(&job_id) else {
            return Err(EngineError::not_found("job"));
        };
        if stored.version != commit.expected_version {
            return Err(EngineError::ConcurrentModification { job_id });
        }

        let mut job = commit.job;
        job.version = commit.expected_version + 1;
        t.jobs.insert(job_id, job.clone());
        if let Some(payment) = commit.payment {
            t.payments.insert(job_id, payment);
        }
        t.record(&commit.event);

        Ok(job)
    }

    async fn payment_for_job(&self, job_id: Uuid) -> EngineResult<Option<PaymentRecord>> {
        Ok(self.tables.read().payments.get(&job_id).cloned())
    }

    async fn insert_review(&self, review: &Review, event: &JobEvent) -> EngineResult<Review> {
        let mut t = self.tables.write();
        let duplicate = t
            .reviews
            .iter()
            .any(|r| r.client_id == review.client_id && r.job_id == review.job_id);
        if duplicate {
            return Err(EngineError::DuplicateReview {
                job_id: review.job_id,
            });
        }
        t.reviews.push(review.clone());
        t.record(event);
        Ok(review.clone())
    }

    async fn review_for(&self, client_id: Uuid, job_id: Uuid) -> EngineResult<Option<Review>> {
        Ok(self
            .tables
            .read()
            .reviews
            .iter()
            .find(|r| r.client_id == client_id && r.job_id == job_id)
            .cloned())
    }

    async fn reviews_for_craftsman(&self, craftsman_id: Uuid) -> EngineResult<Vec<Review>> {
        let t = self.tables.read();
        let mut found: Vec<Review> = t
            .reviews
            .iter()
            .filter(|r| r.craftsman_id == craftsman_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn notifications(
        &self,
        user_id: Option<Uuid>,
        page: Page,
    ) -> EngineResult<Vec<Notification>> {
        let t = self.tables.read();
        let found: Vec<Notification> = t
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        Ok(window(found, page))
    }

    async fn dashboard_stats(&self) -> EngineResult<DashboardStats> {
        let t = self.tables.read();

        let jobs_by_status = JobStatus::ALL
            .iter()
            .filter_map(|status| {
                let count = t.jobs.values().filter(|j| j.status == *status).count() as i64;
                (count > 0).then(|| StatusCount {
                    status: status.to_string(),
                    count,
                })
            })
            .collect();

        let count_craftsmen =
            |f: fn(&Craftsman) -> bool| t.craftsmen.values().filter(|c| f(c)).count() as i64;

        Ok(DashboardStats {
            jobs_by_status,
            pending_craftsmen: count_craftsmen(|c| !c.is_approved),
            approved_craftsmen: count_craftsmen(|c| c.is_approved),
            active_craftsmen: count_craftsmen(Craftsman::is_available),
            jobs_ready_for_payment: t
                .jobs
                .values()
                .filter(|j| j.status == JobStatus::Completed)
                .count() as i64,
            settled_company_fees: t
                .payments
                .values()
                .filter(|p| p.is_settled())
                .map(|p| p.company_cut)
                .sum::<Decimal>(),
        })
    }
}
