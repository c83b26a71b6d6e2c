//! PostgreSQL store
//!
//! Each job commit runs in one transaction: a version-guarded `UPDATE`, the
//! optional payment upsert and the outbox insert.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{JobCommit, MarketplaceStore, Page};
use crate::domain::{
    Client, Craftsman, CraftsmanQuery, DashboardStats, JobEvent, JobQuery, JobRequest, JobStatus,
    Notification, PaymentRecord, Quote, Review, ServiceOffering, StatusCount,
};
use crate::engine::{EngineError, EngineResult};
use crate::services::notifications::record_event;

const JOB_COLUMNS: &str = "id, client_id, craftsman_id, service, budget, schedule, location, \
     address, description, is_urgent, status, quote_details, proof_images, start_time, end_time, \
     version, created_at, updated_at";

const CRAFTSMAN_COLUMNS: &str = "id, full_name, phone, profession, description, location, \
     primary_service, services, service_images, service_image, profile, is_approved, is_active, \
     rejection_reason, version, created_at, updated_at";

const REVIEW_COLUMNS: &str =
    "id, job_id, client_id, craftsman_id, reviewer, rating, comment, location, created_at";

const PAYMENT_COLUMNS: &str = "id, job_id, craftsman_id, total, company_cut, net, dispatched_at, \
     settled_at, confirmed_by_craftsman";

/// Database row for job request
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    client_id: Uuid,
    craftsman_id: Option<Uuid>,
    service: String,
    budget: Decimal,
    schedule: DateTime<Utc>,
    location: Option<String>,
    address: Option<String>,
    description: String,
    is_urgent: bool,
    status: String,
    quote_details: Option<Json<Quote>>,
    proof_images: Json<Vec<String>>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for JobRequest {
    type Error = EngineError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status: JobStatus = row
            .status
            .parse()
            .with_context(|| format!("job {} has unreadable status", row.id))?;

        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            craftsman_id: row.craftsman_id,
            service: row.service,
            budget: row.budget,
            schedule: row.schedule,
            location: row.location,
            address: row.address,
            description: row.description,
            is_urgent: row.is_urgent,
            status,
            quote_details: row.quote_details.map(|q| q.0),
            proof_images: row.proof_images.0,
            start_time: row.start_time,
            end_time: row.end_time,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for craftsman
#[derive(Debug, sqlx::FromRow)]
struct CraftsmanRow {
    id: Uuid,
    full_name: String,
    phone: Option<String>,
    profession: Option<String>,
    description: Option<String>,
    location: Option<String>,
    primary_service: Option<String>,
    services: Json<Vec<ServiceOffering>>,
    service_images: Json<Vec<String>>,
    service_image: Option<String>,
    profile: Option<String>,
    is_approved: bool,
    is_active: bool,
    rejection_reason: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CraftsmanRow> for Craftsman {
    fn from(row: CraftsmanRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            phone: row.phone,
            profession: row.profession,
            description: row.description,
            location: row.location,
            primary_service: row.primary_service,
            services: row.services.0,
            service_images: row.service_images.0,
            service_image: row.service_image,
            profile: row.profile,
            is_approved: row.is_approved,
            is_active: row.is_active,
            rejection_reason: row.rejection_reason,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    full_name: String,
    phone: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            phone: row.phone,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    job_id: Uuid,
    craftsman_id: Uuid,
    total: Decimal,
    company_cut: Decimal,
    net: Decimal,
    dispatched_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
    confirmed_by_craftsman: bool,
}

impl From<PaymentRow> for PaymentRecord {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            job_id: row.job_id,
            craftsman_id: row.craftsman_id,
            total: row.total,
            company_cut: row.company_cut,
            net: row.net,
            dispatched_at: row.dispatched_at,
            settled_at: row.settled_at,
            confirmed_by_craftsman: row.confirmed_by_craftsman,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    job_id: Uuid,
    client_id: Uuid,
    craftsman_id: Uuid,
    reviewer: String,
    rating: i16,
    comment: String,
    location: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            job_id: row.job_id,
            client_id: row.client_id,
            craftsman_id: row.craftsman_id,
            reviewer: row.reviewer,
            rating: row.rating,
            comment: row.comment,
            location: row.location,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Option<Uuid>,
    job_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    notification_type: String,
    title: String,
    message: Option<String>,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            job_id: row.job_id,
            notification_type: row.notification_type,
            title: row.title,
            message: row.message,
            data: row.data,
            created_at: row.created_at,
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarketplaceStore for PgStore {
    async fn insert_client(&self, client: &Client) -> EngineResult<Client> {
        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            INSERT INTO clients (id, full_name, phone, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, full_name, phone, email, created_at
            "#,
        )
        .bind(client.id)
        .bind(&client.full_name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(client.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                EngineError::validation("client profile already exists")
            } else {
                e.into()
            }
        })?;

        Ok(row.into())
    }

    async fn client(&self, id: Uuid) -> EngineResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT id, full_name, phone, email, created_at FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_craftsman(&self, craftsman: &Craftsman) -> EngineResult<Craftsman> {
        let sql = format!(
            r#"
            INSERT INTO craftsmen ({CRAFTSMAN_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {CRAFTSMAN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, CraftsmanRow>(&sql)
            .bind(craftsman.id)
            .bind(&craftsman.full_name)
            .bind(&craftsman.phone)
            .bind(&craftsman.profession)
            .bind(&craftsman.description)
            .bind(&craftsman.location)
            .bind(&craftsman.primary_service)
            .bind(Json(&craftsman.services))
            .bind(Json(&craftsman.service_images))
            .bind(&craftsman.service_image)
            .bind(&craftsman.profile)
            .bind(craftsman.is_approved)
            .bind(craftsman.is_active)
            .bind(&craftsman.rejection_reason)
            .bind(craftsman.version)
            .bind(craftsman.created_at)
            .bind(craftsman.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::validation("craftsman profile already exists")
                } else {
                    e.into()
                }
            })?;

        Ok(row.into())
    }

    async fn update_craftsman(
        &self,
        craftsman: &Craftsman,
        event: Option<&JobEvent>,
    ) -> EngineResult<Craftsman> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE craftsmen
            SET full_name = $2, phone = $3, profession = $4, description = $5, location = $6,
                primary_service = $7, services = $8, service_images = $9, service_image = $10,
                profile = $11, is_approved = $12, is_active = $13, rejection_reason = $14,
                updated_at = $15, version = version + 1
            WHERE id = $1 AND version = $16
            RETURNING {CRAFTSMAN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, CraftsmanRow>(&sql)
            .bind(craftsman.id)
            .bind(&craftsman.full_name)
            .bind(&craftsman.phone)
            .bind(&craftsman.profession)
            .bind(&craftsman.description)
            .bind(&craftsman.location)
            .bind(&craftsman.primary_service)
            .bind(Json(&craftsman.services))
            .bind(Json(&craftsman.service_images))
            .bind(&craftsman.service_image)
            .bind(&craftsman.profile)
            .bind(craftsman.is_approved)
            .bind(craftsman.is_active)
            .bind(&craftsman.rejection_reason)
            .bind(craftsman.updated_at)
            .bind(craftsman.version)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT version FROM craftsmen WHERE id = $1")
                    .bind(craftsman.id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match exists {
                Some(_) => EngineError::StaleProfile {
                    craftsman_id: craftsman.id,
                },
                None => EngineError::not_found("craftsman"),
            });
        };

        if let Some(event) = event {
            record_event(&mut tx, event).await?;
        }
        tx.commit().await?;

        Ok(row.into())
    }

    async fn craftsman(&self, id: Uuid) -> EngineResult<Option<Craftsman>> {
        let sql = format!("SELECT {CRAFTSMAN_COLUMNS} FROM craftsmen WHERE id = $1");
        let row = sqlx::query_as::<_, CraftsmanRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn list_craftsmen(&self, query: &CraftsmanQuery) -> EngineResult<Vec<Craftsman>> {
        let sql = format!(
            r#"
            SELECT {CRAFTSMAN_COLUMNS} FROM craftsmen
            WHERE ($1::boolean IS NULL OR is_approved = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, CraftsmanRow>(&sql)
            .bind(query.approved)
            .bind(query.active)
            .fetch_all(&self.pool)
            .await?;

        // Service matching spans three legacy representations, so it runs here
        Ok(rows
            .into_iter()
            .map(Craftsman::from)
            .filter(|c| query.matches(c))
            .collect())
    }

    async fn insert_job(&self, job: &JobRequest, event: &JobEvent) -> EngineResult<JobRequest> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO job_requests ({JOB_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {JOB_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(job.id)
            .bind(job.client_id)
            .bind(job.craftsman_id)
            .bind(&job.service)
            .bind(job.budget)
            .bind(job.schedule)
            .bind(&job.location)
            .bind(&job.address)
            .bind(&job.description)
            .bind(job.is_urgent)
            .bind(job.status.as_str())
            .bind(job.quote_details.as_ref().map(Json))
            .bind(Json(&job.proof_images))
            .bind(job.start_time)
            .bind(job.end_time)
            .bind(job.version)
            .bind(job.created_at)
            .bind(job.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        record_event(&mut tx, event).await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn job(&self, id: Uuid) -> EngineResult<Option<JobRequest>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM job_requests WHERE id = $1");
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(JobRequest::try_from).transpose()
    }

    async fn list_jobs(
        &self,
        query: &JobQuery,
        page: Page,
    ) -> EngineResult<(Vec<JobRequest>, u64)> {
        let statuses: Vec<&str> = query.statuses.iter().map(JobStatus::as_str).collect();
        let filter = r#"
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR craftsman_id = $2)
              AND (cardinality($3::text[]) = 0 OR status = ANY($3))
              AND (NOT $4 OR status = 'Pending')
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM job_requests {filter}"))
            .bind(query.client_id)
            .bind(query.craftsman_id)
            .bind(&statuses)
            .bind(query.unassigned_only)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM job_requests {filter} \
             ORDER BY created_at DESC LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(query.client_id)
            .bind(query.craftsman_id)
            .bind(&statuses)
            .bind(query.unassigned_only)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await?;

        let jobs = rows
            .into_iter()
            .map(JobRequest::try_from)
            .collect::<EngineResult<Vec<_>>>()?;

        Ok((jobs, total.max(0) as u64))
    }

    async fn commit_job(&self, commit: JobCommit) -> EngineResult<JobRequest> {
        let JobCommit {
            job,
            expected_version,
            payment,
            event,
        } = commit;

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE job_requests
            SET craftsman_id = $3, status = $4, quote_details = $5, proof_images = $6,
                start_time = $7, end_time = $8, updated_at = $9, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {JOB_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, JobRow>(&sql)
            .bind(job.id)
            .bind(expected_version)
            .bind(job.craftsman_id)
            .bind(job.status.as_str())
            .bind(job.quote_details.as_ref().map(Json))
            .bind(Json(&job.proof_images))
            .bind(job.start_time)
            .bind(job.end_time)
            .bind(job.updated_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = updated else {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT version FROM job_requests WHERE id = $1")
                    .bind(job.id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match exists {
                Some(_) => EngineError::ConcurrentModification { job_id: job.id },
                None => EngineError::not_found("job"),
            });
        };

        if let Some(p) = payment {
            sqlx::query(
                r#"
                INSERT INTO payment_records
                    (id, job_id, craftsman_id, total, company_cut, net, dispatched_at, settled_at, confirmed_by_craftsman)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (job_id) DO UPDATE
                SET total = EXCLUDED.total,
                    company_cut = EXCLUDED.company_cut,
                    net = EXCLUDED.net,
                    settled_at = EXCLUDED.settled_at,
                    confirmed_by_craftsman = EXCLUDED.confirmed_by_craftsman
                "#,
            )
            .bind(p.id)
            .bind(p.job_id)
            .bind(p.craftsman_id)
            .bind(p.total)
            .bind(p.company_cut)
            .bind(p.net)
            .bind(p.dispatched_at)
            .bind(p.settled_at)
            .bind(p.confirmed_by_craftsman)
            .execute(&mut *tx)
            .await?;
        }

        record_event(&mut tx, &event).await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn payment_for_job(&self, job_id: Uuid) -> EngineResult<Option<PaymentRecord>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payment_records WHERE job_id = $1");
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_review(&self, review: &Review, event: &JobEvent) -> EngineResult<Review> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO reviews ({REVIEW_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(review.id)
            .bind(review.job_id)
            .bind(review.client_id)
            .bind(review.craftsman_id)
            .bind(&review.reviewer)
            .bind(review.rating)
            .bind(&review.comment)
            .bind(&review.location)
            .bind(review.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::DuplicateReview {
                        job_id: review.job_id,
                    }
                } else {
                    e.into()
                }
            })?;

        record_event(&mut tx, event).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn review_for(&self, client_id: Uuid, job_id: Uuid) -> EngineResult<Option<Review>> {
        let sql =
            format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE client_id = $1 AND job_id = $2");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(client_id)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn reviews_for_craftsman(&self, craftsman_id: Uuid) -> EngineResult<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE craftsman_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(craftsman_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn notifications(
        &self,
        user_id: Option<Uuid>,
        page: Page,
    ) -> EngineResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, job_id, type, title, message, data, created_at
            FROM notifications
            WHERE user_id IS NOT DISTINCT FROM $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn dashboard_stats(&self) -> EngineResult<DashboardStats> {
        let counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM job_requests GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let jobs_by_status = JobStatus::ALL
            .iter()
            .filter_map(|status| {
                let count: i64 = counts
                    .iter()
                    .filter(|(s, _)| s == status.as_str())
                    .map(|(_, c)| *c)
                    .sum();
                (count > 0).then(|| StatusCount {
                    status: status.to_string(),
                    count,
                })
            })
            .collect();

        let (pending_craftsmen, approved_craftsmen, active_craftsmen): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE NOT is_approved),
                    COUNT(*) FILTER (WHERE is_approved),
                    COUNT(*) FILTER (WHERE is_approved AND is_active)
                FROM craftsmen
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let settled_company_fees: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(company_cut) FROM payment_records WHERE settled_at IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let jobs_ready_for_payment: i64 = counts
            .iter()
            .filter(|(s, _)| s == JobStatus::Completed.as_str())
            .map(|(_, c)| *c)
            .sum();

        Ok(DashboardStats {
            jobs_by_status,
            pending_craftsmen,
            approved_craftsmen,
            active_craftsmen,
            jobs_ready_for_payment,
            settled_company_fees: settled_company_fees.unwrap_or(Decimal::ZERO),
        })
    }
}
