//! Matching pending jobs to eligible craftsmen

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::state_machine::{JobAction, JobStateMachine, Transition};
use super::{EngineError, EngineResult};
use crate::domain::{Actor, Craftsman, JobRequest};

/// A craftsman id that passed the eligibility check for one service.
///
/// Only `check_eligibility` can build one, so an `Assign` action always names a
/// craftsman that was approved, active and offering the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibleCraftsman(Uuid);

impl EligibleCraftsman {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

pub fn check_eligibility(craftsman: &Craftsman, service: &str) -> EngineResult<EligibleCraftsman> {
    let reason = if !craftsman.is_approved {
        "not approved"
    } else if !craftsman.is_active {
        "not active"
    } else if !craftsman.offers(service) {
        "does not offer the requested service"
    } else {
        return Ok(EligibleCraftsman(craftsman.id));
    };

    Err(EngineError::NotEligible {
        craftsman_id: craftsman.id,
        reason: reason.to_string(),
    })
}

/// Check eligibility, then run the `assign` transition
pub fn assign(
    machine: &JobStateMachine,
    job: &JobRequest,
    craftsman: &Craftsman,
    admin: &Actor,
    now: DateTime<Utc>,
) -> EngineResult<Transition> {
    let target = check_eligibility(craftsman, &job.service)?;
    machine.apply(job, admin, JobAction::Assign(target), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobStatus, ServiceOffering};
    use crate::engine::approval::tests::complete_profile;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn pending_job(service: &str) -> JobRequest {
        let now = Utc::now();
        JobRequest {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            craftsman_id: None,
            service: service.to_string(),
            budget: Decimal::from(3000),
            schedule: now + Duration::days(1),
            location: Some("Mombasa".to_string()),
            address: None,
            description: "Fix wiring".to_string(),
            is_urgent: true,
            status: JobStatus::Pending,
            quote_details: None,
            proof_images: Vec::new(),
            start_time: None,
            end_time: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn approved(services: &[&str]) -> Craftsman {
        let mut c = complete_profile();
        c.is_approved = true;
        c.primary_service = Some(services[0].to_string());
        c.services = services
            .iter()
            .map(|s| ServiceOffering {
                name: s.to_string(),
                image: Some("img.jpg".to_string()),
            })
            .collect();
        c
    }

    #[test]
    fn assigns_matching_craftsman() {
        let job = pending_job("electrical");
        let craftsman = approved(&["Plumbing", "Electrical"]);
        let admin = Actor::admin(Uuid::new_v4());

        let t = assign(&JobStateMachine::default(), &job, &craftsman, &admin, Utc::now()).unwrap();
        assert_eq!(t.job.status, JobStatus::Assigned);
        assert_eq!(t.job.craftsman_id, Some(craftsman.id));
        assert_eq!(t.event.recipient_id, Some(craftsman.id));
    }

    #[test]
    fn rejects_ineligible_targets() {
        let job = pending_job("Roofing");
        let admin = Actor::admin(Uuid::new_v4());
        let machine = JobStateMachine::default();

        let wrong_service = approved(&["Plumbing"]);
        let mut inactive = approved(&["Roofing"]);
        inactive.is_active = false;
        let mut unapproved = approved(&["Roofing"]);
        unapproved.is_approved = false;

        for c in [wrong_service, inactive, unapproved] {
            let err = assign(&machine, &job, &c, &admin, Utc::now()).unwrap_err();
            assert!(matches!(err, EngineError::NotEligible { .. }));
        }
    }

    #[test]
    fn non_admin_cannot_assign() {
        let job = pending_job("Roofing");
        let craftsman = approved(&["Roofing"]);
        let client = Actor::client(job.client_id);

        let err = assign(&JobStateMachine::default(), &job, &craftsman, &client, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::UnauthorizedTransition { .. }));
    }
}
