//! Marketplace orchestration
//!
//! Each job operation loads the job, computes the transition with the state
//! machine, and commits it against the version it was computed from. Nothing
//! is written when any step fails.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::state_machine::Transition;
use super::{approval, assignment, quote, reviews, settlement};
use super::{EngineError, EngineResult, JobAction, JobPolicy, JobStateMachine};
use crate::domain::{
    Actor, ApprovalEvaluation, Client, CompleteJobRequest, Craftsman, CraftsmanPublic,
    CraftsmanQuery, CraftsmanReviews, CreateJobRequest, DashboardStats, JobEvent, JobQuery,
    JobRequest, JobStatus, Notification, NotificationType, PaymentRecord, QuoteInput,
    QuoteSummary, RegisterClientRequest, RegisterCraftsmanRequest, Review, Role,
    SubmitReviewRequest, UpdateCraftsmanRequest,
};
use crate::store::{JobCommit, MarketplaceStore, Page};

#[derive(Clone)]
pub struct Marketplace {
    store: Arc<dyn MarketplaceStore>,
    pub(super) machine: JobStateMachine,
}

impl Marketplace {
    pub fn new(store: Arc<dyn MarketplaceStore>, policy: JobPolicy) -> Self {
        Self {
            store,
            machine: JobStateMachine::new(policy),
        }
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    async fn load_job(&self, job_id: Uuid) -> EngineResult<JobRequest> {
        self.store
            .job(job_id)
            .await?
            .ok_or_else(|| EngineError::not_found("job"))
    }

    async fn load_craftsman(&self, craftsman_id: Uuid) -> EngineResult<Craftsman> {
        self.store
            .craftsman(craftsman_id)
            .await?
            .ok_or_else(|| EngineError::not_found("craftsman"))
    }

    async fn commit(
        &self,
        actor: &Actor,
        transition: Transition,
        expected_version: i64,
        payment: Option<PaymentRecord>,
    ) -> EngineResult<JobRequest> {
        let Transition {
            job,
            from,
            action,
            event,
        } = transition;
        let to = job.status;

        let job = self
            .store
            .commit_job(JobCommit {
                job,
                expected_version,
                payment,
                event,
            })
            .await?;

        tracing::info!(
            job_id = %job.id,
            action = %action,
            from = %from,
            to = %to,
            actor_id = %actor.id,
            version = job.version,
            "Job transition committed"
        );

        Ok(job)
    }

    async fn transition(
        &self,
        actor: &Actor,
        job_id: Uuid,
        action: JobAction,
    ) -> EngineResult<JobRequest> {
        let job = self.load_job(job_id).await?;
        let transition = self.machine.apply(&job, actor, action, Utc::now())?;
        self.commit(actor, transition, job.version, None).await
    }

    // =========================================================================
    // Client operations
    // =========================================================================

    pub async fn register_client(
        &self,
        user_id: Uuid,
        input: RegisterClientRequest,
    ) -> EngineResult<Client> {
        let full_name = input.full_name.trim();
        if full_name.is_empty() {
            return Err(EngineError::invalid_field("full_name", "full name is required"));
        }

        let client = Client {
            id: user_id,
            full_name: full_name.to_string(),
            phone: input.phone,
            email: input.email,
            created_at: Utc::now(),
        };
        self.store.insert_client(&client).await
    }

    pub async fn client_profile(&self, user_id: Uuid) -> EngineResult<Client> {
        self.store
            .client(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("client profile"))
    }

    pub async fn create_job(
        &self,
        client: &Actor,
        input: CreateJobRequest,
    ) -> EngineResult<JobRequest> {
        let (job, event) = self.machine.create(client, input, Utc::now())?;

        if let Some(craftsman_id) = job.craftsman_id {
            let craftsman = self.load_craftsman(craftsman_id).await?;
            assignment::check_eligibility(&craftsman, &job.service)?;
        }
        self.client_profile(client.id).await?;

        let job = self.store.insert_job(&job, &event).await?;
        tracing::info!(
            job_id = %job.id,
            action = "create",
            to = %job.status,
            actor_id = %client.id,
            service = %job.service,
            "Job created"
        );
        Ok(job)
    }

    pub async fn cancel_job(&self, client: &Actor, job_id: Uuid) -> EngineResult<JobRequest> {
        self.transition(client, job_id, JobAction::Cancel).await
    }

    pub async fn approve_quote(&self, client: &Actor, job_id: Uuid) -> EngineResult<JobRequest> {
        self.transition(client, job_id, JobAction::ApproveQuote).await
    }

    pub async fn reject_quote(
        &self,
        client: &Actor,
        job_id: Uuid,
        reason: Option<String>,
    ) -> EngineResult<JobRequest> {
        self.transition(client, job_id, JobAction::RejectQuote { reason })
            .await
    }

    pub async fn submit_review(
        &self,
        client: &Actor,
        job_id: Uuid,
        input: SubmitReviewRequest,
    ) -> EngineResult<Review> {
        let job = self.load_job(job_id).await?;
        let reviewer = match self.store.client(client.id).await? {
            Some(profile) => profile.full_name,
            None => String::new(),
        };
        let existing = self.store.review_for(client.id, job_id).await?;

        let review = reviews::submit(
            client,
            &reviewer,
            &job,
            existing.as_ref(),
            input,
            Utc::now(),
        )?;

        let event = JobEvent::new(
            Some(job.id),
            NotificationType::ReviewReceived,
            Some(review.craftsman_id),
            "You received a new review",
        )
        .with_data(serde_json::json!({ "rating": review.rating }));

        let review = self.store.insert_review(&review, &event).await?;
        tracing::info!(
            job_id = %job.id,
            craftsman_id = %review.craftsman_id,
            rating = review.rating,
            "Review recorded"
        );
        Ok(review)
    }

    // =========================================================================
    // Craftsman operations
    // =========================================================================

    pub async fn register_craftsman(
        &self,
        user_id: Uuid,
        input: RegisterCraftsmanRequest,
    ) -> EngineResult<Craftsman> {
        let full_name = input.full_name.trim();
        if full_name.is_empty() {
            return Err(EngineError::invalid_field("full_name", "full name is required"));
        }

        let now = Utc::now();
        let craftsman = Craftsman {
            id: user_id,
            full_name: full_name.to_string(),
            phone: input.phone,
            profession: input.profession,
            description: input.description,
            location: input.location,
            primary_service: input.primary_service,
            services: input.services,
            service_images: input.service_images,
            service_image: input.service_image,
            profile: input.profile,
            is_approved: false,
            is_active: true,
            rejection_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_craftsman(&craftsman).await
    }

    pub async fn craftsman_profile(&self, user_id: Uuid) -> EngineResult<Craftsman> {
        self.load_craftsman(user_id).await
    }

    /// Apply a profile edit. Resubmitting clears previous rejection feedback.
    pub async fn update_craftsman_profile(
        &self,
        craftsman_id: Uuid,
        input: UpdateCraftsmanRequest,
    ) -> EngineResult<Craftsman> {
        let mut craftsman = self.load_craftsman(craftsman_id).await?;
        input.apply(&mut craftsman);
        if craftsman.full_name.trim().is_empty() {
            return Err(EngineError::invalid_field("full_name", "full name is required"));
        }
        approval::check_edit(&craftsman)?;

        craftsman.rejection_reason = None;
        craftsman.updated_at = Utc::now();
        self.store.update_craftsman(&craftsman, None).await
    }

    pub async fn accept_job(&self, craftsman: &Actor, job_id: Uuid) -> EngineResult<JobRequest> {
        self.transition(craftsman, job_id, JobAction::Accept).await
    }

    pub async fn reject_job(
        &self,
        craftsman: &Actor,
        job_id: Uuid,
        reason: Option<String>,
    ) -> EngineResult<JobRequest> {
        self.transition(craftsman, job_id, JobAction::Reject { reason })
            .await
    }

    pub async fn submit_quote(
        &self,
        craftsman: &Actor,
        job_id: Uuid,
        input: QuoteInput,
    ) -> EngineResult<JobRequest> {
        self.transition(craftsman, job_id, JobAction::SubmitQuote(input))
            .await
    }

    pub async fn start_job(&self, craftsman: &Actor, job_id: Uuid) -> EngineResult<JobRequest> {
        self.transition(craftsman, job_id, JobAction::Start).await
    }

    pub async fn complete_job(
        &self,
        craftsman: &Actor,
        job_id: Uuid,
        input: CompleteJobRequest,
    ) -> EngineResult<JobRequest> {
        let action = JobAction::Complete {
            proof_images: input.proof_images,
            declared_uploads: input.declared_uploads,
        };
        self.transition(craftsman, job_id, action).await
    }

    /// Record that the craftsman received payment. Repeating the confirmation
    /// on a settled job returns the stored state without writing.
    pub async fn confirm_payment_received(
        &self,
        craftsman: &Actor,
        job_id: Uuid,
    ) -> EngineResult<(JobRequest, PaymentRecord)> {
        let job = self.load_job(job_id).await?;
        let record = self.store.payment_for_job(job_id).await?;

        if let Some(record) = &record {
            let own_job = craftsman.role == Role::Craftsman && job.craftsman_id == Some(craftsman.id);
            if own_job && job.status == JobStatus::Paid && record.is_settled() {
                return Ok((job, record.clone()));
            }
        }

        let now = Utc::now();
        let transition = self
            .machine
            .apply(&job, craftsman, JobAction::ConfirmReceived, now)?;
        let record = record.ok_or_else(|| EngineError::not_found("payment record"))?;
        let settled = settlement::confirm(&record, now);

        let job = self
            .commit(craftsman, transition, job.version, Some(settled.clone()))
            .await?;
        Ok((job, settled))
    }

    pub async fn craftsman_queue(
        &self,
        craftsman: &Actor,
        statuses: Vec<JobStatus>,
        page: Page,
    ) -> EngineResult<(Vec<JobRequest>, u64)> {
        let query = JobQuery {
            statuses,
            ..JobQuery::for_craftsman(craftsman.id)
        };
        self.store.list_jobs(&query, page).await
    }

    pub async fn client_jobs(
        &self,
        client: &Actor,
        statuses: Vec<JobStatus>,
        page: Page,
    ) -> EngineResult<(Vec<JobRequest>, u64)> {
        let query = JobQuery {
            statuses,
            ..JobQuery::for_client(client.id)
        };
        self.store.list_jobs(&query, page).await
    }

    /// Jobs the actor may see: own requests, own queue, or everything for admins
    pub async fn jobs_for(
        &self,
        actor: &Actor,
        statuses: Vec<JobStatus>,
        page: Page,
    ) -> EngineResult<(Vec<JobRequest>, u64)> {
        match actor.role {
            Role::Client => self.client_jobs(actor, statuses, page).await,
            Role::Craftsman => self.craftsman_queue(actor, statuses, page).await,
            Role::Admin => {
                let query = JobQuery {
                    statuses,
                    ..Default::default()
                };
                self.all_jobs(&query, page).await
            }
        }
    }

    /// A single job, hidden from actors that are not party to it
    pub async fn job_for(&self, actor: &Actor, job_id: Uuid) -> EngineResult<JobRequest> {
        let job = self.load_job(job_id).await?;
        let visible = match actor.role {
            Role::Admin => true,
            Role::Client => job.client_id == actor.id,
            Role::Craftsman => job.craftsman_id == Some(actor.id),
        };

        if visible {
            Ok(job)
        } else {
            Err(EngineError::not_found("job"))
        }
    }

    pub async fn payment_for(&self, actor: &Actor, job_id: Uuid) -> EngineResult<PaymentRecord> {
        let job = self.job_for(actor, job_id).await?;
        self.store
            .payment_for_job(job.id)
            .await?
            .ok_or_else(|| EngineError::not_found("payment record"))
    }

    pub async fn notifications_for(
        &self,
        actor: &Actor,
        page: Page,
    ) -> EngineResult<Vec<Notification>> {
        let inbox = (actor.role != Role::Admin).then_some(actor.id);
        self.store.notifications(inbox, page).await
    }

    // =========================================================================
    // Admin operations
    // =========================================================================

    pub async fn evaluate_craftsman(&self, craftsman_id: Uuid) -> EngineResult<ApprovalEvaluation> {
        let craftsman = self.load_craftsman(craftsman_id).await?;
        let missing = approval::evaluate(&craftsman);

        Ok(ApprovalEvaluation {
            craftsman_id,
            approvable: missing.is_empty(),
            missing,
        })
    }

    pub async fn approve_craftsman(&self, craftsman_id: Uuid) -> EngineResult<Craftsman> {
        let mut craftsman = self.load_craftsman(craftsman_id).await?;
        approval::approve(&mut craftsman, Utc::now())?;

        let event = JobEvent::new(
            None,
            NotificationType::ProfileApproved,
            Some(craftsman.id),
            "Your profile has been approved",
        );
        let craftsman = self.store.update_craftsman(&craftsman, Some(&event)).await?;
        tracing::info!(craftsman_id = %craftsman.id, "Craftsman approved");
        Ok(craftsman)
    }

    pub async fn reject_craftsman(
        &self,
        craftsman_id: Uuid,
        reason: &str,
    ) -> EngineResult<Craftsman> {
        let mut craftsman = self.load_craftsman(craftsman_id).await?;
        approval::reject(&mut craftsman, reason, Utc::now())?;

        let event = JobEvent::new(
            None,
            NotificationType::ProfileRejected,
            Some(craftsman.id),
            "Your profile needs changes",
        )
        .with_message(reason.trim());
        let craftsman = self.store.update_craftsman(&craftsman, Some(&event)).await?;
        tracing::info!(craftsman_id = %craftsman.id, "Craftsman rejected");
        Ok(craftsman)
    }

    pub async fn toggle_craftsman_active(&self, craftsman_id: Uuid) -> EngineResult<Craftsman> {
        let mut craftsman = self.load_craftsman(craftsman_id).await?;
        let active = approval::toggle_active(&mut craftsman, Utc::now())?;

        let craftsman = self.store.update_craftsman(&craftsman, None).await?;
        tracing::info!(craftsman_id = %craftsman.id, active, "Craftsman activity toggled");
        Ok(craftsman)
    }

    pub async fn assign_job(
        &self,
        admin: &Actor,
        job_id: Uuid,
        craftsman_id: Uuid,
    ) -> EngineResult<JobRequest> {
        let job = self.load_job(job_id).await?;
        let craftsman = self.load_craftsman(craftsman_id).await?;

        let transition = assignment::assign(&self.machine, &job, &craftsman, admin, Utc::now())?;
        self.commit(admin, transition, job.version, None).await
    }

    /// Dispatch payment and create the settlement record in one commit
    pub async fn dispatch_payment(
        &self,
        admin: &Actor,
        job_id: Uuid,
    ) -> EngineResult<(JobRequest, PaymentRecord)> {
        let job = self.load_job(job_id).await?;
        let existing = self.store.payment_for_job(job_id).await?;
        let now = Utc::now();

        let record = settlement::settle(&job, existing.as_ref(), now)?;
        let transition = self
            .machine
            .apply(&job, admin, JobAction::DispatchPayment, now)?;

        let job = self
            .commit(admin, transition, job.version, Some(record.clone()))
            .await?;
        tracing::info!(
            job_id = %job.id,
            total = %record.total,
            company_cut = %record.company_cut,
            net = %record.net,
            "Payment dispatched"
        );
        Ok((job, record))
    }

    pub async fn list_craftsmen(&self, query: &CraftsmanQuery) -> EngineResult<Vec<Craftsman>> {
        self.store.list_craftsmen(query).await
    }

    pub async fn pending_craftsmen(&self) -> EngineResult<Vec<Craftsman>> {
        let query = CraftsmanQuery {
            approved: Some(false),
            ..Default::default()
        };
        self.store.list_craftsmen(&query).await
    }

    pub async fn unassigned_jobs(&self, page: Page) -> EngineResult<(Vec<JobRequest>, u64)> {
        let query = JobQuery {
            unassigned_only: true,
            ..Default::default()
        };
        self.store.list_jobs(&query, page).await
    }

    pub async fn jobs_ready_for_payment(&self, page: Page) -> EngineResult<(Vec<JobRequest>, u64)> {
        let query = JobQuery::default().with_status(JobStatus::Completed);
        self.store.list_jobs(&query, page).await
    }

    pub async fn all_jobs(
        &self,
        query: &JobQuery,
        page: Page,
    ) -> EngineResult<(Vec<JobRequest>, u64)> {
        self.store.list_jobs(query, page).await
    }

    pub async fn dashboard_stats(&self) -> EngineResult<DashboardStats> {
        self.store.dashboard_stats().await
    }

    // =========================================================================
    // Public reads
    // =========================================================================

    /// Approved and active craftsmen, optionally offering `service`
    pub async fn approved_craftsmen(
        &self,
        service: Option<String>,
    ) -> EngineResult<Vec<CraftsmanPublic>> {
        let service = service.filter(|s| !s.trim().is_empty());
        let found = self
            .store
            .list_craftsmen(&CraftsmanQuery::available(service))
            .await?;
        Ok(found.into_iter().map(CraftsmanPublic::from).collect())
    }

    pub async fn craftsman_reviews(&self, craftsman_id: Uuid) -> EngineResult<CraftsmanReviews> {
        self.load_craftsman(craftsman_id).await?;
        let reviews = self.store.reviews_for_craftsman(craftsman_id).await?;

        let average_rating = (!reviews.is_empty()).then(|| {
            let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
            (Decimal::from(sum) / Decimal::from(reviews.len() as u64)).round_dp(2)
        });

        Ok(CraftsmanReviews {
            craftsman_id,
            average_rating,
            count: reviews.len(),
            reviews,
        })
    }

    /// Totals a submission with these items would produce, rounded for display
    pub fn quote_preview(&self, input: &QuoteInput) -> EngineResult<QuoteSummary> {
        quote::validate_items(&input.items)?;
        Ok(quote::summarize(&input.items))
    }
}
