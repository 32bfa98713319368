// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job management HTTP handlers.

use std::collections::HashMap;

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use chrono::Utc;
use hookcron_server_db::{ExecutionRecord, HttpMethod, Job, JobId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::error::{ErrorResponse, ServerError};
use crate::pagination::{LimitParams, PaginationParams};
use crate::validation::{
	parse_job_id, validate_endpoint, validate_retry_attempts, validate_retry_delay,
	validate_schedule,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_EXECUTIONS_LIMIT: u32 = 5;

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateJobRequest {
	/// Six-field cron expression: second minute hour day month day-of-week.
	pub schedule: String,
	pub endpoint: String,
	pub method: Option<HttpMethod>,
	pub headers: Option<HashMap<String, String>>,
	#[schema(value_type = Option<Object>)]
	pub body: Option<serde_json::Value>,
	pub enabled: Option<bool>,
	pub retry_attempts: Option<u32>,
	pub retry_delay_ms: Option<u64>,
}

/// Fields left out are unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateJobRequest {
	pub schedule: Option<String>,
	pub endpoint: Option<String>,
	pub method: Option<HttpMethod>,
	pub headers: Option<HashMap<String, String>>,
	#[schema(value_type = Option<Object>)]
	pub body: Option<serde_json::Value>,
	pub enabled: Option<bool>,
	pub retry_attempts: Option<u32>,
	pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobListResponse {
	pub jobs: Vec<Job>,
	pub page: u32,
	pub limit: u32,
	pub total: u64,
	pub total_pages: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExecutionListResponse {
	pub job_id: JobId,
	pub executions: Vec<ExecutionRecord>,
}

async fn load_job(state: &AppState, id: JobId) -> Result<Job, ServerError> {
	state
		.jobs
		.get(id)
		.await?
		.ok_or_else(|| ServerError::NotFound(id.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/jobs - Create a job and compute its first run.
#[utoipa::path(
	post,
	path = "/api/jobs",
	request_body = CreateJobRequest,
	responses(
		(status = 201, description = "Job created", body = Job),
		(status = 400, description = "Invalid schedule, endpoint or retry settings", body = ErrorResponse),
	),
	tag = "jobs"
)]
#[instrument(skip(state, request))]
pub async fn create_job(
	State(state): State<AppState>,
	Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), ServerError> {
	let expression = validate_schedule(&request.schedule)?;
	validate_endpoint(&request.endpoint)?;

	let mut job = Job::new(expression.as_str(), request.endpoint);
	if let Some(method) = request.method {
		job.method = method;
	}
	if let Some(headers) = request.headers {
		job.headers = headers;
	}
	if let Some(body) = request.body {
		job.body = body;
	}
	if let Some(enabled) = request.enabled {
		job.enabled = enabled;
	}
	if let Some(retry_attempts) = request.retry_attempts {
		validate_retry_attempts(retry_attempts)?;
		job.retry_attempts = retry_attempts;
	}
	if let Some(retry_delay_ms) = request.retry_delay_ms {
		validate_retry_delay(retry_delay_ms)?;
		job.retry_delay_ms = retry_delay_ms;
	}

	job.next_run_at = expression.next_after(Utc::now());
	if job.next_run_at.is_none() {
		warn!(schedule = %job.schedule, "schedule has no run within the search horizon");
	}

	state.jobs.create(&job).await?;

	info!(job_id = %job.id, schedule = %job.schedule, endpoint = %job.endpoint, "Job created");
	Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs - List jobs in creation order.
#[utoipa::path(
	get,
	path = "/api/jobs",
	params(PaginationParams),
	responses(
		(status = 200, description = "Page of jobs", body = JobListResponse),
	),
	tag = "jobs"
)]
#[instrument(skip(state))]
pub async fn list_jobs(
	State(state): State<AppState>,
	Query(params): Query<PaginationParams>,
) -> Result<Json<JobListResponse>, ServerError> {
	let page = params.page_or_default();
	let limit = params.limit_clamped(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

	let jobs = state.jobs.list(params.offset(limit), limit).await?;
	let total = state.jobs.count().await?;

	Ok(Json(JobListResponse {
		jobs,
		page,
		limit,
		total,
		total_pages: total.div_ceil(u64::from(limit)),
	}))
}

/// GET /api/jobs/{id}
#[utoipa::path(
	get,
	path = "/api/jobs/{id}",
	params(("id" = String, Path, description = "Job ID")),
	responses(
		(status = 200, description = "Job details", body = Job),
		(status = 400, description = "Malformed job ID", body = ErrorResponse),
		(status = 404, description = "Job not found", body = ErrorResponse),
	),
	tag = "jobs"
)]
#[instrument(skip(state), fields(job_id = %id))]
pub async fn get_job(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Job>, ServerError> {
	let id = parse_job_id(&id)?;
	Ok(Json(load_job(&state, id).await?))
}

/// PUT /api/jobs/{id} - Partial update.
///
/// The next run is recomputed when the schedule changes or the job is
/// re-enabled, so a stale `next_run_at` never fires immediately.
#[utoipa::path(
	put,
	path = "/api/jobs/{id}",
	params(("id" = String, Path, description = "Job ID")),
	request_body = UpdateJobRequest,
	responses(
		(status = 200, description = "Updated job", body = Job),
		(status = 400, description = "Invalid update", body = ErrorResponse),
		(status = 404, description = "Job not found", body = ErrorResponse),
	),
	tag = "jobs"
)]
#[instrument(skip(state, request), fields(job_id = %id))]
pub async fn update_job(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(request): Json<UpdateJobRequest>,
) -> Result<Json<Job>, ServerError> {
	let id = parse_job_id(&id)?;
	let mut job = load_job(&state, id).await?;
	let mut reschedule = false;

	if let Some(schedule) = request.schedule {
		let expression = validate_schedule(&schedule)?;
		if expression.as_str() != job.schedule {
			job.schedule = expression.as_str().to_string();
			reschedule = true;
		}
	}
	if let Some(endpoint) = request.endpoint {
		validate_endpoint(&endpoint)?;
		job.endpoint = endpoint;
	}
	if let Some(retry_attempts) = request.retry_attempts {
		validate_retry_attempts(retry_attempts)?;
		job.retry_attempts = retry_attempts;
	}
	if let Some(retry_delay_ms) = request.retry_delay_ms {
		validate_retry_delay(retry_delay_ms)?;
		job.retry_delay_ms = retry_delay_ms;
	}
	if let Some(method) = request.method {
		job.method = method;
	}
	if let Some(headers) = request.headers {
		job.headers = headers;
	}
	if let Some(body) = request.body {
		job.body = body;
	}
	if let Some(enabled) = request.enabled {
		reschedule |= enabled && !job.enabled;
		job.enabled = enabled;
	}

	let now = Utc::now();
	job.updated_at = now;
	state.jobs.update(&job).await?;

	// next_run_at belongs to the scheduler; only a reschedule writes it here.
	if reschedule {
		let next_run_at = hookcron_cron_core::next_run_time(&job.schedule, now)
			.map_err(|e| ServerError::BadRequest(e.to_string()))?;
		state
			.jobs
			.update_next_run_at(job.id, next_run_at, None)
			.await?;
	}

	let job = load_job(&state, id).await?;

	info!(job_id = %job.id, rescheduled = reschedule, "Job updated");
	Ok(Json(job))
}

/// DELETE /api/jobs/{id}
#[utoipa::path(
	delete,
	path = "/api/jobs/{id}",
	params(("id" = String, Path, description = "Job ID")),
	responses(
		(status = 204, description = "Job deleted"),
		(status = 400, description = "Malformed job ID", body = ErrorResponse),
		(status = 404, description = "Job not found", body = ErrorResponse),
	),
	tag = "jobs"
)]
#[instrument(skip(state), fields(job_id = %id))]
pub async fn delete_job(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
	let id = parse_job_id(&id)?;
	if !state.jobs.delete(id).await? {
		return Err(ServerError::NotFound(id.to_string()));
	}

	info!(job_id = %id, "Job deleted");
	Ok(StatusCode::NO_CONTENT)
}

/// GET /api/jobs/{id}/executions - Most recent attempts for one job.
#[utoipa::path(
	get,
	path = "/api/jobs/{id}/executions",
	params(
		("id" = String, Path, description = "Job ID"),
		LimitParams,
	),
	responses(
		(status = 200, description = "Recent executions, newest first", body = ExecutionListResponse),
		(status = 400, description = "Malformed job ID", body = ErrorResponse),
		(status = 404, description = "Job not found", body = ErrorResponse),
	),
	tag = "jobs"
)]
#[instrument(skip(state), fields(job_id = %id))]
pub async fn list_job_executions(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(params): Query<LimitParams>,
) -> Result<Json<ExecutionListResponse>, ServerError> {
	let id = parse_job_id(&id)?;
	load_job(&state, id).await?;

	let limit = params.limit_clamped(DEFAULT_EXECUTIONS_LIMIT, MAX_PAGE_SIZE);
	let executions = state.executions.list_for_job(id, limit).await?;

	Ok(Json(ExecutionListResponse {
		job_id: id,
		executions,
	}))
}
