//! Quote domain types
//!
//! A quote is an itemized price proposal a craftsman submits for a job.
//! Derived totals are always computed by the engine, never read from input.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Single priced line of a quote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteItem {
    pub description: String,
    pub quantity: Decimal,
    #[serde(alias = "unitPrice", alias = "price")]
    pub unit_price: Decimal,
}

impl QuoteItem {
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// Request DTO for submitting (or previewing) a quote.
///
/// Unknown fields such as client-computed `total` are ignored.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct QuoteInput {
    pub items: Vec<QuoteItem>,
    #[serde(default, alias = "workType")]
    pub work_type: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default, alias = "paymentTerms")]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Derived quote amounts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuoteTotals {
    /// Full precision, rounded only for display
    pub subtotal: Decimal,
    pub company_fee: Decimal,
    pub total: Decimal,
}

/// Quote embedded in a job request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub items: Vec<QuoteItem>,
    pub work_type: Option<String>,
    pub duration: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub subtotal: Decimal,
    pub company_fee: Decimal,
    pub total: Decimal,
    pub submitted_at: DateTime<Utc>,
}

/// Quote summary shown to the client, rounded to whole currency units
#[derive(Debug, Clone, Serialize)]
pub struct QuoteSummary {
    pub items: Vec<QuoteItem>,
    pub subtotal: Decimal,
    pub company_fee: Decimal,
    pub total: Decimal,
}
