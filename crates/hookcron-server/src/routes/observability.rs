// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health, statistics and failure reporting.

use axum::{
	extract::{Query, State},
	Json,
};
use chrono::{DateTime, Utc};
use hookcron_server_db::{ExecutionRecord, ExecutionStats};
use hookcron_server_jobs::SchedulerStatus;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::error::ServerError;
use crate::pagination::LimitParams;

const DEFAULT_FAILURES_LIMIT: u32 = 10;
const MAX_FAILURES_LIMIT: u32 = 100;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
	pub status: String,
	pub timestamp: DateTime<Utc>,
	pub scheduler: SchedulerStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
	pub executions: ExecutionStats,
	pub scheduler: SchedulerStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FailureListResponse {
	pub failures: Vec<ExecutionRecord>,
}

/// GET /api/observability/health
#[utoipa::path(
	get,
	path = "/api/observability/health",
	responses(
		(status = 200, description = "Service is up", body = HealthResponse)
	),
	tag = "observability"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "healthy".to_string(),
		timestamp: Utc::now(),
		scheduler: state.scheduler.status(),
	})
}

/// GET /api/observability/stats
#[utoipa::path(
	get,
	path = "/api/observability/stats",
	responses(
		(status = 200, description = "Execution counts and scheduler status", body = StatsResponse)
	),
	tag = "observability"
)]
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ServerError> {
	let executions = state.executions.stats(Utc::now()).await?;

	Ok(Json(StatsResponse {
		executions,
		scheduler: state.scheduler.status(),
	}))
}

/// GET /api/observability/failures
#[utoipa::path(
	get,
	path = "/api/observability/failures",
	params(LimitParams),
	responses(
		(status = 200, description = "Most recent failed executions", body = FailureListResponse)
	),
	tag = "observability"
)]
#[instrument(skip(state))]
pub async fn failures(
	State(state): State<AppState>,
	Query(params): Query<LimitParams>,
) -> Result<Json<FailureListResponse>, ServerError> {
	let limit = params.limit_clamped(DEFAULT_FAILURES_LIMIT, MAX_FAILURES_LIMIT);
	let failures = state.executions.recent_failures(limit).await?;

	Ok(Json(FailureListResponse { failures }))
}
