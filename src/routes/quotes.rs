use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::RequireActor;
use crate::domain::QuoteInput;
use crate::error::ApiError;

/// POST /quotes/preview
///
/// Totals a draft quote exactly as submission would, without touching a job.
pub async fn preview_quote(
    State(state): State<Arc<AppState>>,
    _actor: RequireActor,
    Json(input): Json<QuoteInput>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.marketplace.quote_preview(&input)?;
    Ok(DataResponse::new(summary))
}
