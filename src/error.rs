//! Unified API error handling
//!
//! Engine errors map to stable machine-readable codes so clients can treat
//! idempotency guards (`ALREADY_SETTLED`, `DUPLICATE_REVIEW`) as benign.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Offending fields for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Engine(e) => match e {
                EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
                EngineError::InvalidTransition { .. } => StatusCode::CONFLICT,
                EngineError::UnauthorizedTransition { .. } => StatusCode::FORBIDDEN,
                EngineError::NotEligible { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                EngineError::AlreadySettled { .. } => StatusCode::CONFLICT,
                EngineError::DuplicateReview { .. } => StatusCode::CONFLICT,
                EngineError::ConcurrentModification { .. }
                | EngineError::StaleProfile { .. } => StatusCode::CONFLICT,
                EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Engine(e) => match e {
                EngineError::Validation { .. } => "VALIDATION_ERROR",
                EngineError::InvalidTransition { .. } => "INVALID_TRANSITION",
                EngineError::UnauthorizedTransition { .. } => "UNAUTHORIZED_TRANSITION",
                EngineError::NotEligible { .. } => "NOT_ELIGIBLE",
                EngineError::AlreadySettled { .. } => "ALREADY_SETTLED",
                EngineError::DuplicateReview { .. } => "DUPLICATE_REVIEW",
                EngineError::ConcurrentModification { .. }
                | EngineError::StaleProfile { .. } => "CONCURRENT_MODIFICATION",
                EngineError::NotFound(_) => "NOT_FOUND",
                EngineError::Storage(_) => "INTERNAL_ERROR",
            },
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            // Don't leak internal error details
            Self::Internal(_) | Self::Engine(EngineError::Storage(_)) => {
                "An internal error occurred".to_string()
            }
            Self::Engine(EngineError::Validation { message, .. }) => message.clone(),
            Self::Engine(e) => e.to_string(),
        }
    }

    fn details(&self) -> Option<Vec<String>> {
        match self {
            Self::Engine(EngineError::Validation { fields, .. }) if !fields.is_empty() => {
                Some(fields.clone())
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) | Self::Engine(EngineError::Storage(e)) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            _ => {
                tracing::warn!(error = %self, code = self.error_code(), "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
            details: self.details(),
            request_id: None,
        };

        (status, Json(body)).into_response()
    }
}
