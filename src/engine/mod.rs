//! Job-request lifecycle engine
//!
//! The single authority for job status, quote arithmetic, payment settlement,
//! craftsman approval and review eligibility. Every operation either commits a
//! complete change or returns a typed `EngineError` with nothing written.

pub mod approval;
pub mod assignment;
pub mod quote;
pub mod reviews;
pub mod service;
pub mod settlement;
pub mod state_machine;


use thiserror::Error;
use uuid::Uuid;

use crate::domain::{JobStatus, MissingField, Role};

pub use service::Marketplace;
pub use state_machine::{ActionKind, JobAction, JobStateMachine};

/// Minimum number of proof artifacts before a job may be completed
pub const DEFAULT_MIN_PROOF_IMAGES: usize = 3;

/// Tunable engine rules
#[derive(Debug, Clone, Copy)]
pub struct JobPolicy {
    pub min_proof_images: usize,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            min_proof_images: DEFAULT_MIN_PROOF_IMAGES,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<String>,
    },

    #[error("cannot {action} a job in status {from}")]
    InvalidTransition { from: JobStatus, action: ActionKind },

    #[error("{role} is not allowed to {action} this job")]
    UnauthorizedTransition { role: Role, action: ActionKind },

    #[error("craftsman {craftsman_id} is not eligible: {reason}")]
    NotEligible { craftsman_id: Uuid, reason: String },

    #[error("payment for job {job_id} is already settled")]
    AlreadySettled { job_id: Uuid },

    #[error("job {job_id} has already been reviewed by this client")]
    DuplicateReview { job_id: Uuid },

    #[error("job {job_id} was modified concurrently")]
    ConcurrentModification { job_id: Uuid },

    #[error("craftsman {craftsman_id} was modified concurrently")]
    StaleProfile { craftsman_id: Uuid },

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage failure")]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: vec![field.to_string()],
        }
    }

    pub fn missing_fields(missing: &[MissingField]) -> Self {
        let fields: Vec<String> = missing.iter().map(|f| f.to_string()).collect();
        Self::Validation {
            message: format!("missing required fields: {}", fields.join(", ")),
            fields,
        }
    }

    pub fn unauthorized(role: Role, action: ActionKind) -> Self {
        Self::UnauthorizedTransition { role, action }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(anyhow::Error::new(e))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
