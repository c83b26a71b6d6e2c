//! Payment settlement domain types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settlement bookkeeping for a job, created on dispatch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub craftsman_id: Uuid,
    pub total: Decimal,
    pub company_cut: Decimal,
    pub net: Decimal,
    pub dispatched_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub confirmed_by_craftsman: bool,
}

impl PaymentRecord {
    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }
}
