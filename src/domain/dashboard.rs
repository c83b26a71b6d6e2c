//! Admin dashboard projections

use rust_decimal::Decimal;
use serde::Serialize;

/// Aggregate numbers for the admin dashboard
#[derive(Debug, Clone, Serialize, Default)]
pub struct DashboardStats {
    pub jobs_by_status: Vec<StatusCount>,
    pub pending_craftsmen: i64,
    pub approved_craftsmen: i64,
    pub active_craftsmen: i64,
    pub jobs_ready_for_payment: i64,
    pub settled_company_fees: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}
