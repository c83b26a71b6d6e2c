//! Review ledger rules
//!
//! Ratings arrive on the canonical 1-10 scale; five-star surfaces double their
//! value before calling in.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::state_machine::ActionKind;
use super::{EngineError, EngineResult};
use crate::domain::{
    Actor, JobRequest, Review, Role, SubmitReviewRequest, MAX_RATING, MIN_RATING,
};

/// Validate and build a review of the job's craftsman
pub fn submit(
    client: &Actor,
    reviewer: &str,
    job: &JobRequest,
    existing: Option<&Review>,
    input: SubmitReviewRequest,
    now: DateTime<Utc>,
) -> EngineResult<Review> {
    if client.role != Role::Client || job.client_id != client.id {
        return Err(EngineError::unauthorized(client.role, ActionKind::SubmitReview));
    }
    if !job.status.is_review_eligible() {
        return Err(EngineError::InvalidTransition {
            from: job.status,
            action: ActionKind::SubmitReview,
        });
    }
    let Some(craftsman_id) = job.craftsman_id else {
        return Err(EngineError::invalid_field(
            "craftsman",
            "job has no craftsman to review",
        ));
    };
    let location = match job.location.as_deref().map(str::trim) {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => {
            return Err(EngineError::invalid_field(
                "location",
                "job has no location to attribute the review to",
            ))
        }
    };
    if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
        return Err(EngineError::invalid_field(
            "rating",
            format!("rating must be between {} and {}", MIN_RATING, MAX_RATING),
        ));
    }
    if existing.is_some() {
        return Err(EngineError::DuplicateReview { job_id: job.id });
    }

    Ok(Review {
        id: Uuid::new_v4(),
        job_id: job.id,
        client_id: client.id,
        craftsman_id,
        reviewer: reviewer.to_string(),
        rating: input.rating,
        comment: input.comment.trim().to_string(),
        location,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn job(status: JobStatus) -> JobRequest {
        let now = Utc::now();
        JobRequest {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            craftsman_id: Some(Uuid::new_v4()),
            service: "Tiling".to_string(),
            budget: Decimal::from(2000),
            schedule: now + Duration::days(3),
            location: Some("Nakuru".to_string()),
            address: None,
            description: "Bathroom floor".to_string(),
            is_urgent: false,
            status,
            quote_details: None,
            proof_images: Vec::new(),
            start_time: None,
            end_time: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn rating(r: i16) -> SubmitReviewRequest {
        SubmitReviewRequest {
            rating: r,
            comment: "Neat work".to_string(),
        }
    }

    #[test]
    fn completed_and_paid_jobs_are_reviewable() {
        for status in [JobStatus::Completed, JobStatus::Paid] {
            let job = job(status);
            let client = Actor::client(job.client_id);
            let review = submit(&client, "Amina", &job, None, rating(9), Utc::now()).unwrap();
            assert_eq!(review.rating, 9);
            assert_eq!(review.location, "Nakuru");
        }
    }

    #[test]
    fn in_progress_job_is_not_reviewable() {
        let job = job(JobStatus::InProgress);
        let client = Actor::client(job.client_id);
        assert!(matches!(
            submit(&client, "Amina", &job, None, rating(9), Utc::now()),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn rating_bounds_enforced() {
        let job = job(JobStatus::Completed);
        let client = Actor::client(job.client_id);
        for r in [0, 11, -3] {
            assert!(matches!(
                submit(&client, "Amina", &job, None, rating(r), Utc::now()),
                Err(EngineError::Validation { .. })
            ));
        }
    }

    #[test]
    fn only_owning_client_reviews() {
        let job = job(JobStatus::Completed);
        let other = Actor::client(Uuid::new_v4());
        assert!(matches!(
            submit(&other, "Someone", &job, None, rating(5), Utc::now()),
            Err(EngineError::UnauthorizedTransition { .. })
        ));
    }

    #[test]
    fn second_review_is_duplicate() {
        let job = job(JobStatus::Paid);
        let client = Actor::client(job.client_id);
        let first = submit(&client, "Amina", &job, None, rating(8), Utc::now()).unwrap();
        assert!(matches!(
            submit(&client, "Amina", &job, Some(&first), rating(2), Utc::now()),
            Err(EngineError::DuplicateReview { .. })
        ));
    }

    #[test]
    fn review_needs_location() {
        let mut job = job(JobStatus::Completed);
        job.location = Some(" ".to_string());
        let client = Actor::client(job.client_id);
        assert!(submit(&client, "Amina", &job, None, rating(7), Utc::now()).is_err());
    }
}
