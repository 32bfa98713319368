// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::routes::{index, jobs, observability};

#[derive(OpenApi)]
#[openapi(
	info(
		title = "hookcron API",
		description = "Schedule HTTP calls with six-field cron expressions and inspect their executions",
		license(name = "Proprietary")
	),
	paths(
		index::index,
		jobs::create_job,
		jobs::list_jobs,
		jobs::get_job,
		jobs::update_job,
		jobs::delete_job,
		jobs::list_job_executions,
		observability::health,
		observability::stats,
		observability::failures,
	),
	components(schemas(
		ErrorResponse,
		index::IndexResponse,
		index::IndexEndpoints,
		jobs::CreateJobRequest,
		jobs::UpdateJobRequest,
		jobs::JobListResponse,
		jobs::ExecutionListResponse,
		observability::HealthResponse,
		observability::StatsResponse,
		observability::FailureListResponse,
		hookcron_server_db::Job,
		hookcron_server_db::JobId,
		hookcron_server_db::HttpMethod,
		hookcron_server_db::ExecutionRecord,
		hookcron_server_db::ExecutionId,
		hookcron_server_db::ExecutionStatus,
		hookcron_server_db::ExecutionStats,
		hookcron_server_jobs::SchedulerStatus,
	)),
	tags(
		(name = "index", description = "Service index"),
		(name = "jobs", description = "Job management and execution history"),
		(name = "observability", description = "Health, statistics and failures"),
	)
)]
pub struct ApiDoc;
