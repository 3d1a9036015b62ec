//! Schedule management endpoints.
//!
//! Creating a schedule registers the recurring scrape with the provider
//! first, then records the provider-assigned id locally. Deleting removes it
//! at the provider before dropping the local row.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::error::{ApiError, validation_error};
use crate::provider::types::ScheduleFrequency;
use crate::repositories::ScheduleRepository;
use crate::server::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateScheduleRequest {
    pub url: String,
    pub frequency: ScheduleFrequency,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub schedule_id: i64,
    pub url: String,
    pub frequency: ScheduleFrequency,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct DeleteScheduleParams {
    /// Provider-assigned schedule id
    pub schedule_id: i64,
}

/// Registers a recurring scrape schedule
#[utoipa::path(
    post,
    path = "/schedule",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleResponse),
        (status = 400, description = "Invalid URL or duplicate schedule"),
        (status = 502, description = "Provider rejected the schedule")
    ),
    tag = "schedules"
)]
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), ApiError> {
    if Url::parse(&request.url).is_err() {
        return Err(validation_error(
            "Invalid schedule URL",
            serde_json::json!({ "url": "Must be an absolute URL" }),
        ));
    }

    let repo = ScheduleRepository::new(state.db.clone());

    if repo.exists_by_url(&request.url).await? {
        return Err(validation_error(
            "A schedule already exists for this URL.",
            serde_json::json!({ "url": "Already scheduled" }),
        ));
    }

    let schedule_id = state
        .provider
        .create_schedule(&request.url, request.frequency)
        .await?;

    repo.insert(schedule_id, &request.url).await?;

    Ok((
        StatusCode::CREATED,
        Json(ScheduleResponse {
            schedule_id,
            url: request.url,
            frequency: request.frequency,
        }),
    ))
}

/// Removes a scrape schedule
#[utoipa::path(
    delete,
    path = "/schedule",
    params(DeleteScheduleParams),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 404, description = "Schedule not found"),
        (status = 502, description = "Provider rejected the deletion")
    ),
    tag = "schedules"
)]
pub async fn delete_schedule(
    State(state): State<AppState>,
    Query(params): Query<DeleteScheduleParams>,
) -> Result<StatusCode, ApiError> {
    let schedule_id = params.schedule_id;
    let repo = ScheduleRepository::new(state.db.clone());

    if repo.find_by_id(schedule_id).await?.is_none() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("Schedule {} not found", schedule_id),
        ));
    }

    // Provider first: if this fails the local row stays and the operation
    // can be retried.
    state.provider.delete_schedule(schedule_id).await?;
    repo.delete_by_id(schedule_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
