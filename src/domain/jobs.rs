//! Job request domain types
//!
//! A job request is a client's request for work, tracked through the lifecycle
//! enforced by `engine::state_machine`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::quotes::{Quote, QuoteInput};

/// Job request status.
///
/// Serialized as the canonical PascalCase name. Parsing accepts the casing and
/// spacing variants found in older clients (`"in progress"`, `"in_progress"`,
/// `"InProgress"`, ...), so every boundary normalizes to one representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Assigned,
    Accepted,
    QuoteSubmitted,
    QuoteApproved,
    InProgress,
    Completed,
    PaymentPending,
    Paid,
    Rejected,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 11] = [
        JobStatus::Pending,
        JobStatus::Assigned,
        JobStatus::Accepted,
        JobStatus::QuoteSubmitted,
        JobStatus::QuoteApproved,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::PaymentPending,
        JobStatus::Paid,
        JobStatus::Rejected,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Assigned => "Assigned",
            JobStatus::Accepted => "Accepted",
            JobStatus::QuoteSubmitted => "QuoteSubmitted",
            JobStatus::QuoteApproved => "QuoteApproved",
            JobStatus::InProgress => "InProgress",
            JobStatus::Completed => "Completed",
            JobStatus::PaymentPending => "PaymentPending",
            JobStatus::Paid => "Paid",
            JobStatus::Rejected => "Rejected",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    /// Statuses a client may review from
    pub fn is_review_eligible(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Paid)
    }

    /// Statuses that require an assigned craftsman
    pub fn requires_craftsman(&self) -> bool {
        !matches!(
            self,
            JobStatus::Pending | JobStatus::Rejected | JobStatus::Cancelled
        )
    }

    /// Statuses that require an embedded quote
    pub fn requires_quote(&self) -> bool {
        matches!(
            self,
            JobStatus::QuoteSubmitted
                | JobStatus::QuoteApproved
                | JobStatus::InProgress
                | JobStatus::Completed
                | JobStatus::PaymentPending
                | JobStatus::Paid
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let status = match key.as_str() {
            "pending" => JobStatus::Pending,
            "assigned" => JobStatus::Assigned,
            "accepted" => JobStatus::Accepted,
            "quotesubmitted" | "quotesent" => JobStatus::QuoteSubmitted,
            "quoteapproved" => JobStatus::QuoteApproved,
            "inprogress" | "started" => JobStatus::InProgress,
            "completed" | "complete" => JobStatus::Completed,
            "paymentpending" => JobStatus::PaymentPending,
            "paid" => JobStatus::Paid,
            "rejected" => JobStatus::Rejected,
            "cancelled" | "canceled" => JobStatus::Cancelled,
            _ => return Err(UnknownStatus(s.to_string())),
        };
        Ok(status)
    }
}

impl TryFrom<String> for JobStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Job request entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRequest {
    pub id: Uuid,
    pub client_id: Uuid,
    pub craftsman_id: Option<Uuid>,
    pub service: String,
    pub budget: Decimal,
    pub schedule: DateTime<Utc>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub description: String,
    pub is_urgent: bool,
    pub status: JobStatus,
    pub quote_details: Option<Quote>,
    pub proof_images: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter, bumped on every commit
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a job request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub service: String,
    pub budget: Decimal,
    pub schedule: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub description: String,
    #[serde(default, alias = "isUrgent")]
    pub is_urgent: bool,
    /// Craftsman picked from their public profile, if any
    #[serde(default, alias = "craftsman")]
    pub preferred_craftsman_id: Option<Uuid>,
}

/// Request DTO for admin assignment
#[derive(Debug, Clone, Deserialize)]
pub struct AssignJobRequest {
    #[serde(alias = "craftsman")]
    pub craftsman_id: Uuid,
}

/// Request DTO carrying an optional reason (job or quote rejection)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request DTO for submitting a quote
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuoteRequest {
    #[serde(alias = "quoteDetails")]
    pub quote_details: QuoteInput,
}

/// Request DTO for completing a job.
///
/// `declared_uploads` is how many proof uploads the craftsman started; when it
/// does not match the references received, some upload failed and the job must
/// not move.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteJobRequest {
    #[serde(alias = "proofImages")]
    pub proof_images: Vec<String>,
    #[serde(default)]
    pub declared_uploads: Option<usize>,
}

/// Filter for job list projections
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub client_id: Option<Uuid>,
    pub craftsman_id: Option<Uuid>,
    pub statuses: Vec<JobStatus>,
    pub unassigned_only: bool,
}

impl JobQuery {
    pub fn for_client(client_id: Uuid) -> Self {
        Self {
            client_id: Some(client_id),
            ..Default::default()
        }
    }

    pub fn for_craftsman(craftsman_id: Uuid) -> Self {
        Self {
            craftsman_id: Some(craftsman_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.statuses.push(status);
        self
    }

    #[cfg(test)]
    pub fn matches(&self, job: &JobRequest) -> bool {
        if let Some(client_id) = self.client_id {
            if job.client_id != client_id {
                return false;
            }
        }
        if let Some(craftsman_id) = self.craftsman_id {
            if job.craftsman_id != Some(craftsman_id) {
                return false;
            }
        }
        if self.unassigned_only && job.status != JobStatus::Pending {
            return false;
        }
        self.statuses.is_empty() || self.statuses.contains(&job.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_status_variants() {
        for raw in ["in progress", "InProgress", "in_progress", "IN-PROGRESS"] {
            assert_eq!(raw.parse::<JobStatus>().unwrap(), JobStatus::InProgress);
        }
        assert_eq!("completed".parse::<JobStatus>().unwrap(), JobStatus::Completed);
        assert_eq!("Canceled".parse::<JobStatus>().unwrap(), JobStatus::Cancelled);
        assert!("archived".parse::<JobStatus>().is_err());
    }

    #[test]
    fn serializes_canonical_name() {
        let json = serde_json::to_string(&JobStatus::PaymentPending).unwrap();
        assert_eq!(json, "\"PaymentPending\"");

        let parsed: JobStatus = serde_json::from_str("\"quote_submitted\"").unwrap();
        assert_eq!(parsed, JobStatus::QuoteSubmitted);
    }

    #[test]
    fn canonical_names_round_trip_through_parse() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }
}
