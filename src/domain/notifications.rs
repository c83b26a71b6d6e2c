//! Notification domain types
//!
//! Every committed job transition emits one `JobEvent`. The event is written to
//! the notification outbox together with the job; delivery happens elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    JobCreated,
    JobAssigned,
    JobAccepted,
    JobRejected,
    QuoteSubmitted,
    QuoteApproved,
    QuoteRejected,
    JobStarted,
    JobCompleted,
    PaymentDispatched,
    PaymentConfirmed,
    JobCancelled,
    ReviewReceived,
    ProfileApproved,
    ProfileRejected,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// Event that must be notified after a committed change
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobEvent {
    pub job_id: Option<Uuid>,
    pub notification_type: NotificationType,
    /// `None` routes the event to the admin inbox
    pub recipient_id: Option<Uuid>,
    pub title: String,
    pub message: Option<String>,
    pub data: serde_json::Value,
}

impl JobEvent {
    pub fn new(
        job_id: Option<Uuid>,
        notification_type: NotificationType,
        recipient_id: Option<Uuid>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            notification_type,
            recipient_id,
            title: title.into(),
            message: None,
            data: serde_json::json!({}),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Notification entity (persisted outbox row)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub notification_type: String,
    pub title: String,
    pub message: Option<String>,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
