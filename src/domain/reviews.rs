//! Review domain types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest rating on the canonical scale
pub const MIN_RATING: i16 = 1;
/// Highest rating on the canonical scale. Five-star surfaces multiply by two.
pub const MAX_RATING: i16 = 10;

/// Review entity, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub job_id: Uuid,
    pub client_id: Uuid,
    pub craftsman_id: Uuid,
    pub reviewer: String,
    pub rating: i16,
    pub comment: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for submitting a review
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReviewRequest {
    /// Canonical 1-10 rating
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

/// Reviews for one craftsman with their average
#[derive(Debug, Clone, Serialize)]
pub struct CraftsmanReviews {
    pub craftsman_id: Uuid,
    pub average_rating: Option<Decimal>,
    pub count: usize,
    pub reviews: Vec<Review>,
}
