//! Provider job callback endpoint.
//!
//! The provider posts here when a scrape job changes state. A payload missing
//! the expected fields is rejected with 400; a well-formed callback is always
//! acknowledged with 200, with any pipeline failure reported through the
//! notifier instead of back to the provider.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::provider::types::JobStatus;
use crate::server::AppState;

/// Expected shape of the provider's job callback.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct JobCallbackRequest {
    pub job_id: i64,
    pub crawl_status: JobStatus,
}

/// Receives a job state callback from the provider
#[utoipa::path(
    post,
    path = "/process_job",
    request_body = JobCallbackRequest,
    responses(
        (status = 200, description = "Callback acknowledged"),
        (status = 400, description = "Malformed callback payload")
    ),
    tag = "callbacks"
)]
pub async fn process_job(
    State(state): State<AppState>,
    payload: Result<Json<JobCallbackRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(callback) = payload?;

    tracing::info!(
        job_id = callback.job_id,
        status = %callback.crawl_status,
        "Job callback received"
    );

    state
        .processor
        .process(callback.job_id, callback.crawl_status)
        .await;

    Ok(Json(json!({ "acknowledged": true })))
}
