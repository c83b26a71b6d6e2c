//! Payment settlement bookkeeping
//!
//! The company cut is computed with the same fee function as quotes, applied
//! to the job's settlement basis.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::quote::company_fee_on;
use super::state_machine::ActionKind;
use super::{EngineError, EngineResult};
use crate::domain::{JobRequest, JobStatus, PaymentRecord};

/// Quote total when an itemized quote exists, otherwise the client's budget
pub fn settlement_basis(job: &JobRequest) -> Decimal {
    job.quote_details
        .as_ref()
        .map(|q| q.total)
        .unwrap_or(job.budget)
}

/// Compute the company/craftsman split for a completed job
pub fn settle(
    job: &JobRequest,
    existing: Option<&PaymentRecord>,
    now: DateTime<Utc>,
) -> EngineResult<PaymentRecord> {
    if let Some(record) = existing.filter(|r| r.is_settled()) {
        return Err(EngineError::AlreadySettled {
            job_id: record.job_id,
        });
    }

    let settleable = matches!(
        job.status,
        JobStatus::Completed | JobStatus::PaymentPending | JobStatus::Paid
    );
    let Some(craftsman_id) = job.craftsman_id.filter(|_| settleable) else {
        return Err(EngineError::InvalidTransition {
            from: job.status,
            action: ActionKind::DispatchPayment,
        });
    };

    let total = settlement_basis(job);
    let company_cut = company_fee_on(total);

    Ok(PaymentRecord {
        id: existing.map(|r| r.id).unwrap_or_else(Uuid::new_v4),
        job_id: job.id,
        craftsman_id,
        total,
        company_cut,
        net: total - company_cut,
        dispatched_at: now,
        settled_at: None,
        confirmed_by_craftsman: false,
    })
}

/// Mark the payment as received. Confirming a settled record changes nothing.
pub fn confirm(record: &PaymentRecord, now: DateTime<Utc>) -> PaymentRecord {
    if record.is_settled() {
        return record.clone();
    }

    PaymentRecord {
        settled_at: Some(now),
        confirmed_by_craftsman: true,
        ..record.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Quote, QuoteItem};
    use chrono::Duration;

    fn completed_job(quote_total: Option<i64>) -> JobRequest {
        let now = Utc::now();
        JobRequest {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            craftsman_id: Some(Uuid::new_v4()),
            service: "Carpentry".to_string(),
            budget: Decimal::from(5000),
            schedule: now + Duration::days(1),
            location: Some("Kisumu".to_string()),
            address: None,
            description: "Wardrobe".to_string(),
            is_urgent: false,
            status: JobStatus::Completed,
            quote_details: quote_total.map(|t| Quote {
                items: vec![QuoteItem {
                    description: "wardrobe".to_string(),
                    quantity: Decimal::ONE,
                    unit_price: Decimal::from(t),
                }],
                work_type: None,
                duration: None,
                payment_terms: None,
                notes: None,
                subtotal: Decimal::from(t),
                company_fee: Decimal::ZERO,
                total: Decimal::from(t),
                submitted_at: now,
            }),
            proof_images: Vec::new(),
            start_time: None,
            end_time: None,
            version: 5,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn splits_quote_total() {
        let record = settle(&completed_job(Some(4400)), None, Utc::now()).unwrap();
        assert_eq!(record.total, Decimal::from(4400));
        assert_eq!(record.company_cut, Decimal::from(440));
        assert_eq!(record.net, Decimal::from(3960));
        assert!(record.settled_at.is_none());
    }

    #[test]
    fn falls_back_to_budget_without_quote() {
        let record = settle(&completed_job(None), None, Utc::now()).unwrap();
        assert_eq!(record.total, Decimal::from(5000));
        assert_eq!(record.company_cut, Decimal::from(500));
        assert_eq!(record.net, Decimal::from(4500));
    }

    #[test]
    fn refuses_unfinished_jobs() {
        let mut job = completed_job(Some(1000));
        job.status = JobStatus::InProgress;
        assert!(matches!(
            settle(&job, None, Utc::now()),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn refuses_already_settled() {
        let job = completed_job(Some(1000));
        let record = confirm(&settle(&job, None, Utc::now()).unwrap(), Utc::now());
        assert!(matches!(
            settle(&job, Some(&record), Utc::now()),
            Err(EngineError::AlreadySettled { .. })
        ));
    }

    #[test]
    fn confirm_is_idempotent() {
        let job = completed_job(Some(4400));
        let record = settle(&job, None, Utc::now()).unwrap();

        let first = confirm(&record, Utc::now());
        let second = confirm(&first, Utc::now() + Duration::minutes(5));

        assert_eq!(first.settled_at, second.settled_at);
        assert_eq!(first.net, second.net);
        assert_eq!(first.company_cut, second.company_cut);
        assert!(second.confirmed_by_craftsman);
    }
}
