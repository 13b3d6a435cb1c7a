//! Decision run endpoints
//!
//! Thin translation between HTTP and the run manager: the synchronous path
//! blocks until the workflow finishes, the asynchronous path answers 202
//! with a run id for polling.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::decision::DecisionSummary;
use crate::domain::run::{RunId, RunRecord};

/// Request to run a decision workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// The decision the caller wants analyzed
    pub query: String,
}

/// Response to an accepted asynchronous run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCreatedResponse {
    pub run_id: String,
    pub status: String,
}

/// A run record as exposed over the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub run_id: String,
    pub query: String,
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DecisionSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<RunRecord> for RunResponse {
    fn from(record: RunRecord) -> Self {
        Self {
            run_id: record.id().to_string(),
            query: record.query().to_string(),
            status: record.status().to_string(),
            result: record.result().cloned(),
            error: record.error().map(str::to_string),
            created_at: record.created_at(),
            completed_at: record.completed_at(),
        }
    }
}

/// Listing of run records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunListResponse {
    pub runs: Vec<RunResponse>,
    pub total: usize,
}

/// Request to delete old terminal runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupRequest {
    /// Only delete runs that completed more than this many hours ago
    #[serde(default = "default_older_than_hours")]
    pub older_than_hours: u64,
}

fn default_older_than_hours() -> u64 {
    24
}

/// Response to a cleanup request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub deleted: u64,
}

/// POST /v1/decisions - run the workflow synchronously
pub async fn run_decision(
    State(state): State<AppState>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionSummary>, ApiError> {
    debug!("Running synchronous decision");

    let summary = state
        .run_manager
        .run_sync(&request.query)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(summary))
}

/// POST /v1/decisions/async - create a run and execute it in the background
pub async fn create_async_decision(
    State(state): State<AppState>,
    Json(request): Json<DecisionRequest>,
) -> Result<Response, ApiError> {
    let record = state
        .run_manager
        .create(&request.query)
        .await
        .map_err(ApiError::from)?;

    state.run_manager.schedule(record.id().clone());

    let response = RunCreatedResponse {
        run_id: record.id().to_string(),
        status: record.status().to_string(),
    };

    Ok((StatusCode::ACCEPTED, Json(response)).into_response())
}

/// GET /v1/decisions/{id} - poll a run
pub async fn get_decision(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunResponse>, ApiError> {
    let run_id = RunId::new(id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let record = state
        .run_manager
        .get(&run_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Run '{}' not found", run_id)))?;

    Ok(Json(record.into()))
}

/// GET /v1/decisions - list all runs
pub async fn list_decisions(
    State(state): State<AppState>,
) -> Result<Json<RunListResponse>, ApiError> {
    let records = state.run_manager.list().await.map_err(ApiError::from)?;

    let runs: Vec<RunResponse> = records.into_iter().map(RunResponse::from).collect();
    let total = runs.len();

    Ok(Json(RunListResponse { runs, total }))
}

/// POST /v1/decisions/cleanup - delete old terminal runs
pub async fn cleanup_decisions(
    State(state): State<AppState>,
    Json(request): Json<CleanupRequest>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let older_than = Duration::from_secs(request.older_than_hours * 3600);

    let deleted = state
        .run_manager
        .cleanup(older_than)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(CleanupResponse { deleted }))
}
