//! Job request state machine
//!
//! A single dispatch table keyed by action decides who may act, from which
//! statuses, and where the job lands. `apply` never mutates its input: it
//! returns the next job state, which the caller commits as one unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::assignment::EligibleCraftsman;
use super::quote;
use super::{EngineError, EngineResult, JobPolicy};
use crate::domain::{
    Actor, CreateJobRequest, JobEvent, JobRequest, JobStatus, NotificationType, QuoteInput, Role,
};

/// Action names, as used in errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Create,
    Assign,
    Accept,
    Reject,
    SubmitQuote,
    ApproveQuote,
    RejectQuote,
    Start,
    Complete,
    DispatchPayment,
    ConfirmReceived,
    Cancel,
    SubmitReview,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Assign => "assign",
            ActionKind::Accept => "accept",
            ActionKind::Reject => "reject",
            ActionKind::SubmitQuote => "submit-quote",
            ActionKind::ApproveQuote => "approve-quote",
            ActionKind::RejectQuote => "reject-quote",
            ActionKind::Start => "start",
            ActionKind::Complete => "complete",
            ActionKind::DispatchPayment => "dispatch-payment",
            ActionKind::ConfirmReceived => "confirm-received",
            ActionKind::Cancel => "cancel",
            ActionKind::SubmitReview => "submit-review",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A requested transition with its payload
#[derive(Debug, Clone)]
pub enum JobAction {
    Assign(EligibleCraftsman),
    Accept,
    Reject { reason: Option<String> },
    SubmitQuote(QuoteInput),
    ApproveQuote,
    RejectQuote { reason: Option<String> },
    Start,
    Complete {
        proof_images: Vec<String>,
        declared_uploads: Option<usize>,
    },
    DispatchPayment,
    ConfirmReceived,
    Cancel,
}

impl JobAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            JobAction::Assign(_) => ActionKind::Assign,
            JobAction::Accept => ActionKind::Accept,
            JobAction::Reject { .. } => ActionKind::Reject,
            JobAction::SubmitQuote(_) => ActionKind::SubmitQuote,
            JobAction::ApproveQuote => ActionKind::ApproveQuote,
            JobAction::RejectQuote { .. } => ActionKind::RejectQuote,
            JobAction::Start => ActionKind::Start,
            JobAction::Complete { .. } => ActionKind::Complete,
            JobAction::DispatchPayment => ActionKind::DispatchPayment,
            JobAction::ConfirmReceived => ActionKind::ConfirmReceived,
            JobAction::Cancel => ActionKind::Cancel,
        }
    }
}

/// Who may perform an action on a given job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Admin,
    AssignedCraftsman,
    OwningClient,
}

impl Party {
    fn role(&self) -> Role {
        match self {
            Party::Admin => Role::Admin,
            Party::AssignedCraftsman => Role::Craftsman,
            Party::OwningClient => Role::Client,
        }
    }

    fn admits(&self, job: &JobRequest, actor: &Actor) -> bool {
        match self {
            Party::Admin => true,
            Party::AssignedCraftsman => job.craftsman_id == Some(actor.id),
            Party::OwningClient => job.client_id == actor.id,
        }
    }
}

struct Rule {
    party: Party,
    from: &'static [JobStatus],
    to: JobStatus,
}

use JobStatus::*;

fn rule(action: ActionKind) -> Option<Rule> {
    let (party, from, to): (Party, &'static [JobStatus], JobStatus) = match action {
        ActionKind::Assign => (Party::Admin, &[Pending], Assigned),
        ActionKind::Accept => (Party::AssignedCraftsman, &[Assigned], Accepted),
        ActionKind::Reject => (Party::AssignedCraftsman, &[Pending, Assigned], Rejected),
        ActionKind::SubmitQuote => (Party::AssignedCraftsman, &[Accepted], QuoteSubmitted),
        ActionKind::ApproveQuote => (Party::OwningClient, &[QuoteSubmitted], QuoteApproved),
        ActionKind::RejectQuote => (Party::OwningClient, &[QuoteSubmitted], Accepted),
        ActionKind::Start => (Party::AssignedCraftsman, &[QuoteApproved], InProgress),
        ActionKind::Complete => (Party::AssignedCraftsman, &[InProgress], Completed),
        ActionKind::DispatchPayment => (Party::Admin, &[Completed], PaymentPending),
        ActionKind::ConfirmReceived => (Party::AssignedCraftsman, &[PaymentPending], Paid),
        ActionKind::Cancel => (Party::OwningClient, &[Pending, Assigned, Accepted], Cancelled),
        ActionKind::Create | ActionKind::SubmitReview => return None,
    };
    Some(Rule { party, from, to })
}

/// Result of a legal transition, ready to commit
#[derive(Debug, Clone)]
pub struct Transition {
    pub job: JobRequest,
    pub from: JobStatus,
    pub action: ActionKind,
    pub event: JobEvent,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JobStateMachine {
    policy: JobPolicy,
}

impl JobStateMachine {
    pub fn new(policy: JobPolicy) -> Self {
        Self { policy }
    }

    /// Build a new `Pending` job owned by `client`
    pub fn create(
        &self,
        client: &Actor,
        input: CreateJobRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<(JobRequest, JobEvent)> {
        if client.role != Role::Client {
            return Err(EngineError::unauthorized(client.role, ActionKind::Create));
        }
        if input.service.trim().is_empty() {
            return Err(EngineError::invalid_field("service", "service is required"));
        }
        if input.budget < Decimal::ZERO {
            return Err(EngineError::invalid_field(
                "budget",
                "budget cannot be negative",
            ));
        }
        if input.schedule <= now {
            return Err(EngineError::invalid_field(
                "schedule",
                "schedule must be in the future",
            ));
        }

        let job = JobRequest {
            id: Uuid::new_v4(),
            client_id: client.id,
            craftsman_id: input.preferred_craftsman_id,
            service: input.service.trim().to_string(),
            budget: input.budget,
            schedule: input.schedule,
            location: input.location,
            address: input.address,
            description: input.description,
            is_urgent: input.is_urgent,
            status: Pending,
            quote_details: None,
            proof_images: Vec::new(),
            start_time: None,
            end_time: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let event = JobEvent::new(
            Some(job.id),
            NotificationType::JobCreated,
            job.craftsman_id,
            format!("New {} request", job.service),
        )
        .with_data(serde_json::json!({ "urgent": job.is_urgent }));

        Ok((job, event))
    }

    /// Check permissions and preconditions, then compute the next job state
    pub fn apply(
        &self,
        job: &JobRequest,
        actor: &Actor,
        action: JobAction,
        now: DateTime<Utc>,
    ) -> EngineResult<Transition> {
        let kind = action.kind();
        let Some(rule) = rule(kind) else {
            return Err(EngineError::InvalidTransition {
                from: job.status,
                action: kind,
            });
        };

        if actor.role != rule.party.role() || !rule.party.admits(job, actor) {
            return Err(EngineError::unauthorized(actor.role, kind));
        }
        if !rule.from.contains(&job.status) {
            return Err(EngineError::InvalidTransition {
                from: job.status,
                action: kind,
            });
        }

        let mut next = job.clone();
        let mut reason = None;

        match action {
            JobAction::Assign(target) => {
                next.craftsman_id = Some(target.id());
            }
            JobAction::SubmitQuote(input) => {
                next.quote_details = Some(quote::build_quote(input, now)?);
            }
            JobAction::RejectQuote { reason: r } => {
                next.quote_details = None;
                reason = r;
            }
            JobAction::Reject { reason: r } => {
                reason = r;
            }
            JobAction::Start => {
                next.start_time = Some(now);
            }
            JobAction::Complete {
                proof_images,
                declared_uploads,
            } => {
                self.check_proofs(&proof_images, declared_uploads)?;
                next.proof_images = proof_images;
                next.end_time = Some(now);
            }
            JobAction::Accept
            | JobAction::ApproveQuote
            | JobAction::DispatchPayment
            | JobAction::ConfirmReceived
            | JobAction::Cancel => {}
        }

        next.status = rule.to;
        next.updated_at = now;
        debug_assert!(invariants_hold(&next));

        let event = event_for(kind, &next, reason);

        Ok(Transition {
            job: next,
            from: job.status,
            action: kind,
            event,
        })
    }

    fn check_proofs(&self, proofs: &[String], declared: Option<usize>) -> EngineResult<()> {
        if let Some(declared) = declared {
            if declared != proofs.len() {
                return Err(EngineError::invalid_field(
                    "proof_images",
                    format!(
                        "{} of {} proof uploads succeeded; retry the failed uploads",
                        proofs.len(),
                        declared
                    ),
                ));
            }
        }
        if proofs.iter().any(|p| p.trim().is_empty()) {
            return Err(EngineError::invalid_field(
                "proof_images",
                "proof image references cannot be empty",
            ));
        }
        if proofs.len() < self.policy.min_proof_images {
            return Err(EngineError::invalid_field(
                "proof_images",
                format!(
                    "at least {} proof images are required, got {}",
                    self.policy.min_proof_images,
                    proofs.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Structural invariants every committed job satisfies
pub fn invariants_hold(job: &JobRequest) -> bool {
    (!job.status.requires_craftsman() || job.craftsman_id.is_some())
        && (job.status != Assigned || job.craftsman_id.is_some())
        && (!job.status.requires_quote() || job.quote_details.is_some())
}

fn event_for(kind: ActionKind, job: &JobRequest, reason: Option<String>) -> JobEvent {
    let to_client = Some(job.client_id);
    let to_craftsman = job.craftsman_id;

    let (notification_type, recipient, title) = match kind {
        ActionKind::Assign => (
            NotificationType::JobAssigned,
            to_craftsman,
            format!("You have been assigned a {} job", job.service),
        ),
        ActionKind::Accept => (
            NotificationType::JobAccepted,
            to_client,
            "Your job was accepted".to_string(),
        ),
        ActionKind::Reject => (
            NotificationType::JobRejected,
            to_client,
            "Your job was declined".to_string(),
        ),
        ActionKind::SubmitQuote => (
            NotificationType::QuoteSubmitted,
            to_client,
            "A quote is ready for review".to_string(),
        ),
        ActionKind::ApproveQuote => (
            NotificationType::QuoteApproved,
            to_craftsman,
            "Your quote was approved".to_string(),
        ),
        ActionKind::RejectQuote => (
            NotificationType::QuoteRejected,
            to_craftsman,
            "Your quote was rejected".to_string(),
        ),
        ActionKind::Start => (
            NotificationType::JobStarted,
            to_client,
            "Work on your job has started".to_string(),
        ),
        ActionKind::Complete => (
            NotificationType::JobCompleted,
            to_client,
            "Your job is complete".to_string(),
        ),
        ActionKind::DispatchPayment => (
            NotificationType::PaymentDispatched,
            to_craftsman,
            "Payment has been sent".to_string(),
        ),
        ActionKind::ConfirmReceived => (
            NotificationType::PaymentConfirmed,
            to_client,
            "Payment was received by the craftsman".to_string(),
        ),
        ActionKind::Cancel => (
            NotificationType::JobCancelled,
            to_craftsman,
            "A job was cancelled".to_string(),
        ),
        ActionKind::Create | ActionKind::SubmitReview => (
            NotificationType::JobCreated,
            None,
            format!("Job {}", job.id),
        ),
    };

    let event = JobEvent::new(Some(job.id), notification_type, recipient, title).with_data(
        serde_json::json!({
            "job_id": job.id,
            "status": job.status,
            "service": job.service,
        }),
    );

    match reason {
        Some(r) if !r.trim().is_empty() => event.with_message(r),
        _ => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Quote, QuoteItem};
    use chrono::Duration;

    fn sample_job(status: JobStatus) -> (JobRequest, Uuid, Uuid) {
        let client = Uuid::new_v4();
        let craftsman = Uuid::new_v4();
        let now = Utc::now();
        let quote = Quote {
            items: vec![QuoteItem {
                description: "labour".to_string(),
                quantity: Decimal::ONE,
                unit_price: Decimal::from(1000),
            }],
            work_type: None,
            duration: None,
            payment_terms: None,
            notes: None,
            subtotal: Decimal::from(1000),
            company_fee: Decimal::from(100),
            total: Decimal::from(1100),
            submitted_at: now,
        };

        let job = JobRequest {
            id: Uuid::new_v4(),
            client_id: client,
            craftsman_id: (status != Pending).then_some(craftsman),
            service: "Plumbing".to_string(),
            budget: Decimal::from(5000),
            schedule: now + Duration::days(2),
            location: Some("Nairobi".to_string()),
            address: None,
            description: "Leaking sink".to_string(),
            is_urgent: false,
            status,
            quote_details: status.requires_quote().then_some(quote),
            proof_images: Vec::new(),
            start_time: None,
            end_time: None,
            version: 3,
            created_at: now,
            updated_at: now,
        };
        (job, client, craftsman)
    }

    fn proofs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("proofs/{}.jpg", i)).collect()
    }

    #[test]
    fn complete_from_accepted_is_invalid_and_leaves_job_untouched() {
        let machine = JobStateMachine::default();
        let (job, _, craftsman) = sample_job(Accepted);
        let before = job.clone();

        let err = machine
            .apply(
                &job,
                &Actor::craftsman(craftsman),
                JobAction::Complete {
                    proof_images: proofs(3),
                    declared_uploads: None,
                },
                Utc::now(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: Accepted,
                action: ActionKind::Complete
            }
        ));
        assert_eq!(job, before);
    }

    #[test]
    fn proof_gate_requires_three_images() {
        let machine = JobStateMachine::default();
        let (job, _, craftsman) = sample_job(InProgress);
        let actor = Actor::craftsman(craftsman);

        let err = machine
            .apply(
                &job,
                &actor,
                JobAction::Complete {
                    proof_images: proofs(2),
                    declared_uploads: None,
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));

        let t = machine
            .apply(
                &job,
                &actor,
                JobAction::Complete {
                    proof_images: proofs(3),
                    declared_uploads: Some(3),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(t.job.status, Completed);
        assert_eq!(t.job.proof_images.len(), 3);
        assert!(t.job.end_time.is_some());
    }

    #[test]
    fn partial_upload_blocks_completion() {
        let machine = JobStateMachine::default();
        let (job, _, craftsman) = sample_job(InProgress);

        let err = machine
            .apply(
                &job,
                &Actor::craftsman(craftsman),
                JobAction::Complete {
                    proof_images: proofs(3),
                    declared_uploads: Some(4),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[test]
    fn client_cannot_start_in_any_status() {
        let machine = JobStateMachine::default();
        for status in JobStatus::ALL {
            let (job, client, _) = sample_job(status);
            let err = machine
                .apply(&job, &Actor::client(client), JobAction::Start, Utc::now())
                .unwrap_err();
            assert!(
                matches!(err, EngineError::UnauthorizedTransition { role: Role::Client, .. }),
                "status {status}"
            );
        }
    }

    #[test]
    fn only_assigned_craftsman_may_accept() {
        let machine = JobStateMachine::default();
        let (job, _, craftsman) = sample_job(Assigned);

        let stranger = Actor::craftsman(Uuid::new_v4());
        assert!(matches!(
            machine.apply(&job, &stranger, JobAction::Accept, Utc::now()),
            Err(EngineError::UnauthorizedTransition { .. })
        ));

        let t = machine
            .apply(&job, &Actor::craftsman(craftsman), JobAction::Accept, Utc::now())
            .unwrap();
        assert_eq!(t.job.status, Accepted);
        assert_eq!(t.event.recipient_id, Some(job.client_id));
    }

    #[test]
    fn reject_quote_returns_to_accepted_and_discards_quote() {
        let machine = JobStateMachine::default();
        let (job, client, _) = sample_job(QuoteSubmitted);

        let t = machine
            .apply(
                &job,
                &Actor::client(client),
                JobAction::RejectQuote {
                    reason: Some("Too expensive".to_string()),
                },
                Utc::now(),
            )
            .unwrap();

        assert_eq!(t.job.status, Accepted);
        assert!(t.job.quote_details.is_none());
        assert_eq!(t.event.message.as_deref(), Some("Too expensive"));
    }

    #[test]
    fn start_sets_start_time() {
        let machine = JobStateMachine::default();
        let (job, _, craftsman) = sample_job(QuoteApproved);
        let now = Utc::now();

        let t = machine
            .apply(&job, &Actor::craftsman(craftsman), JobAction::Start, now)
            .unwrap();
        assert_eq!(t.job.status, InProgress);
        assert_eq!(t.job.start_time, Some(now));
    }

    #[test]
    fn cancel_only_before_quote() {
        let machine = JobStateMachine::default();
        for status in [Pending, Assigned, Accepted] {
            let (job, client, _) = sample_job(status);
            let t = machine
                .apply(&job, &Actor::client(client), JobAction::Cancel, Utc::now())
                .unwrap();
            assert_eq!(t.job.status, Cancelled);
        }

        let (job, client, _) = sample_job(InProgress);
        assert!(matches!(
            machine.apply(&job, &Actor::client(client), JobAction::Cancel, Utc::now()),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn terminal_states_accept_no_actions() {
        let machine = JobStateMachine::default();
        for status in [Paid, Rejected, Cancelled] {
            let (job, client, _) = sample_job(status);
            assert!(matches!(
                machine.apply(&job, &Actor::client(client), JobAction::Cancel, Utc::now()),
                Err(EngineError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn submit_quote_validates_items() {
        let machine = JobStateMachine::default();
        let (job, _, craftsman) = sample_job(Accepted);

        let bad = QuoteInput {
            items: vec![QuoteItem {
                description: "pipes".to_string(),
                quantity: Decimal::from(-1),
                unit_price: Decimal::from(100),
            }],
            ..Default::default()
        };
        assert!(matches!(
            machine.apply(
                &job,
                &Actor::craftsman(craftsman),
                JobAction::SubmitQuote(bad),
                Utc::now()
            ),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn create_rejects_past_schedule_and_negative_budget() {
        let machine = JobStateMachine::default();
        let client = Actor::client(Uuid::new_v4());
        let now = Utc::now();
        let input = |budget: i64, schedule| CreateJobRequest {
            service: "Painting".to_string(),
            budget: Decimal::from(budget),
            schedule,
            location: None,
            address: None,
            description: "Two bedrooms".to_string(),
            is_urgent: false,
            preferred_craftsman_id: None,
        };

        assert!(machine
            .create(&client, input(100, now - Duration::hours(1)), now)
            .is_err());
        assert!(machine
            .create(&client, input(-1, now + Duration::hours(1)), now)
            .is_err());

        let (job, _) = machine
            .create(&client, input(0, now + Duration::hours(1)), now)
            .unwrap();
        assert_eq!(job.status, Pending);

        let admin = Actor::admin(Uuid::new_v4());
        assert!(matches!(
            machine.create(&admin, input(0, now + Duration::hours(1)), now),
            Err(EngineError::UnauthorizedTransition { .. })
        ));
    }
}
