// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use hookcron_server_config::SchedulerConfig;
use hookcron_server_db::{ExecutionRepository, JobRepository};
use hookcron_server_jobs::{JobExecutor, ReqwestInvoker, Scheduler};
use sqlx::SqlitePool;
use utoipa::OpenApi;

use crate::api_docs::ApiDoc;
use crate::error::ServerError;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub jobs: Arc<JobRepository>,
	pub executions: Arc<ExecutionRepository>,
	pub scheduler: Arc<Scheduler>,
}

/// Wire repositories, the HTTP invoker and the scheduler over one pool.
///
/// The scheduler is built but not started.
pub fn create_app_state(
	pool: SqlitePool,
	config: &SchedulerConfig,
) -> Result<AppState, ServerError> {
	let jobs = Arc::new(JobRepository::new(pool.clone()));
	let executions = Arc::new(ExecutionRepository::new(pool));

	let invoker = ReqwestInvoker::new(Duration::from_secs(config.request_timeout_secs))
		.map_err(|e| ServerError::Internal(e.to_string()))?;
	let executor = JobExecutor::new(executions.clone(), Arc::new(invoker));

	let scheduler = Arc::new(Scheduler::new(
		jobs.clone(),
		executor,
		hookcron_server_jobs::SchedulerConfig {
			poll_interval: Duration::from_millis(config.poll_interval_ms),
			max_concurrent_jobs: config.max_concurrent_jobs as usize,
		},
	));

	Ok(AppState {
		jobs,
		executions,
		scheduler,
	})
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
	Json(ApiDoc::openapi())
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/", get(routes::index::index))
		.route(
			"/api/jobs",
			get(routes::jobs::list_jobs).post(routes::jobs::create_job),
		)
		.route(
			"/api/jobs/{id}",
			get(routes::jobs::get_job)
				.put(routes::jobs::update_job)
				.delete(routes::jobs::delete_job),
		)
		.route(
			"/api/jobs/{id}/executions",
			get(routes::jobs::list_job_executions),
		)
		.route(
			"/api/observability/health",
			get(routes::observability::health),
		)
		.route(
			"/api/observability/stats",
			get(routes::observability::stats),
		)
		.route(
			"/api/observability/failures",
			get(routes::observability::failures),
		)
		.route("/api/openapi.json", get(openapi_json))
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{
		body::Body,
		http::{Request, StatusCode},
	};
	use chrono::Utc;
	use hookcron_server_db::{testing::create_test_pool, Job, JobId};
	use serde_json::{json, Value};
	use tower::ServiceExt;

	async fn create_test_app() -> (Router, AppState) {
		let pool = create_test_pool().await;
		let state = create_app_state(pool, &SchedulerConfig::default()).unwrap();
		(create_router(state.clone()), state)
	}

	async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
		let builder = Request::builder().method(method).uri(uri);
		let request = match body {
			Some(body) => builder
				.header("content-type", "application/json")
				.body(Body::from(body.to_string()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};

		let response = app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let json = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, json)
	}

	async fn create_job(app: &Router, body: Value) -> Job {
		let (status, json) = send(app, "POST", "/api/jobs", Some(body)).await;
		assert_eq!(status, StatusCode::CREATED, "{json}");
		serde_json::from_value(json).unwrap()
	}

	#[tokio::test]
	async fn test_index() {
		let (app, _) = create_test_app().await;
		let (status, json) = send(&app, "GET", "/", None).await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(json["name"], "hookcron");
		assert_eq!(json["endpoints"]["jobs"], "/api/jobs");
	}

	#[tokio::test]
	async fn test_openapi_document() {
		let (app, _) = create_test_app().await;
		let (status, json) = send(&app, "GET", "/api/openapi.json", None).await;

		assert_eq!(status, StatusCode::OK);
		assert!(json["paths"]["/api/jobs"].is_object());
		assert!(json["paths"]["/api/observability/health"].is_object());
	}

	#[tokio::test]
	async fn test_create_job_computes_next_run() {
		let (app, _) = create_test_app().await;
		let before = Utc::now();

		let job = create_job(
			&app,
			json!({
				"schedule": "0  */5 * * * *",
				"endpoint": "https://example.com/hook",
				"method": "PUT",
				"headers": {"x-token": "abc"},
				"body": {"hello": "world"},
				"retry_attempts": 2,
			}),
		)
		.await;

		assert_eq!(job.schedule, "0 */5 * * * *");
		assert_eq!(job.method, hookcron_server_db::HttpMethod::Put);
		assert_eq!(job.headers.get("x-token").map(String::as_str), Some("abc"));
		assert_eq!(job.body, json!({"hello": "world"}));
		assert_eq!(job.retry_attempts, 2);
		assert!(job.enabled);

		let next = job.next_run_at.unwrap();
		assert!(next > before);
		assert!(next <= before + chrono::Duration::minutes(5) + chrono::Duration::seconds(1));
	}

	#[tokio::test]
	async fn test_create_job_defaults() {
		let (app, _) = create_test_app().await;
		let job = create_job(
			&app,
			json!({"schedule": "* * * * * *", "endpoint": "http://localhost:9000"}),
		)
		.await;

		assert_eq!(job.method, hookcron_server_db::HttpMethod::Post);
		assert_eq!(job.retry_attempts, 3);
		assert_eq!(job.retry_delay_ms, 5000);
		assert_eq!(job.body, json!({}));
	}

	#[tokio::test]
	async fn test_create_job_rejects_bad_input() {
		let (app, state) = create_test_app().await;

		let cases = [
			json!({"schedule": "*/5 * * * *", "endpoint": "https://example.com"}),
			json!({"schedule": "0 0 25 * * *", "endpoint": "https://example.com"}),
			json!({"schedule": "* * * * * *", "endpoint": "ftp://example.com"}),
			json!({"schedule": "* * * * * *", "endpoint": "example.com"}),
			json!({"schedule": "* * * * * *", "endpoint": "https://example.com", "retry_attempts": 0}),
			json!({"schedule": "* * * * * *", "endpoint": "https://example.com", "retry_delay_ms": u64::MAX}),
		];
		for body in cases {
			let (status, json) = send(&app, "POST", "/api/jobs", Some(body)).await;
			assert_eq!(status, StatusCode::BAD_REQUEST);
			assert_eq!(json["error"], "bad_request");
		}

		assert_eq!(state.jobs.count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_get_job() {
		let (app, _) = create_test_app().await;
		let job = create_job(
			&app,
			json!({"schedule": "0 0 * * * *", "endpoint": "https://example.com"}),
		)
		.await;

		let (status, json) = send(&app, "GET", &format!("/api/jobs/{}", job.id), None).await;
		assert_eq!(status, StatusCode::OK);
		let fetched: Job = serde_json::from_value(json).unwrap();
		assert_eq!(fetched.id, job.id);

		let (status, json) = send(&app, "GET", &format!("/api/jobs/{}", JobId::new()), None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(json["error"], "not_found");

		let (status, _) = send(&app, "GET", "/api/jobs/not-a-uuid", None).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_list_jobs_paginates() {
		let (app, _) = create_test_app().await;
		for _ in 0..3 {
			create_job(
				&app,
				json!({"schedule": "0 0 * * * *", "endpoint": "https://example.com"}),
			)
			.await;
		}

		let (status, json) = send(&app, "GET", "/api/jobs?page=2&limit=2", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(json["jobs"].as_array().unwrap().len(), 1);
		assert_eq!(json["page"], 2);
		assert_eq!(json["limit"], 2);
		assert_eq!(json["total"], 3);
		assert_eq!(json["total_pages"], 2);

		let (_, json) = send(&app, "GET", "/api/jobs", None).await;
		assert_eq!(json["jobs"].as_array().unwrap().len(), 3);
		assert_eq!(json["page"], 1);
		assert_eq!(json["limit"], 20);
	}

	#[tokio::test]
	async fn test_update_job_recomputes_next_run_on_schedule_change() {
		let (app, _) = create_test_app().await;
		let job = create_job(
			&app,
			json!({"schedule": "0 0 0 1 1 *", "endpoint": "https://example.com"}),
		)
		.await;

		let (status, json) = send(
			&app,
			"PUT",
			&format!("/api/jobs/{}", job.id),
			Some(json!({"schedule": "* * * * * *", "retry_delay_ms": 10})),
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{json}");

		let updated: Job = serde_json::from_value(json).unwrap();
		assert_eq!(updated.schedule, "* * * * * *");
		assert_eq!(updated.endpoint, job.endpoint);
		assert_eq!(updated.retry_delay_ms, 10);
		let next = updated.next_run_at.unwrap();
		assert!(next <= Utc::now() + chrono::Duration::seconds(2));
		assert!(updated.updated_at >= job.updated_at);
	}

	#[tokio::test]
	async fn test_update_job_keeps_next_run_without_schedule_change() {
		let (app, _) = create_test_app().await;
		let job = create_job(
			&app,
			json!({"schedule": "0 0 0 1 1 *", "endpoint": "https://example.com"}),
		)
		.await;

		let (status, json) = send(
			&app,
			"PUT",
			&format!("/api/jobs/{}", job.id),
			Some(json!({"endpoint": "https://example.org/other"})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);

		let updated: Job = serde_json::from_value(json).unwrap();
		assert_eq!(updated.endpoint, "https://example.org/other");
		assert_eq!(updated.next_run_at, job.next_run_at);
	}

	#[tokio::test]
	async fn test_update_job_preserves_scheduler_advance() {
		let (app, state) = create_test_app().await;
		let job = create_job(
			&app,
			json!({"schedule": "* * * * * *", "endpoint": "https://example.com"}),
		)
		.await;

		let dispatched = Utc::now();
		let advanced = dispatched + chrono::Duration::days(200);
		state
			.jobs
			.update_next_run_at(job.id, Some(advanced), Some(dispatched))
			.await
			.unwrap();

		let (status, json) = send(
			&app,
			"PUT",
			&format!("/api/jobs/{}", job.id),
			Some(json!({"endpoint": "https://example.org/moved", "enabled": true})),
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{json}");

		let updated: Job = serde_json::from_value(json).unwrap();
		let stored = state.jobs.get(job.id).await.unwrap().unwrap();
		assert_eq!(updated.endpoint, "https://example.org/moved");
		assert_eq!(updated.next_run_at, stored.next_run_at);
		assert!(stored.next_run_at.unwrap() > dispatched + chrono::Duration::days(199));
		assert!(stored.last_run_at.is_some());
		assert!(state.jobs.find_due(10, Utc::now()).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_update_job_rejects_bad_input() {
		let (app, state) = create_test_app().await;
		let job = create_job(
			&app,
			json!({"schedule": "0 0 * * * *", "endpoint": "https://example.com"}),
		)
		.await;
		let uri = format!("/api/jobs/{}", job.id);

		let (status, _) = send(&app, "PUT", &uri, Some(json!({"schedule": "bogus"}))).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		let (status, _) = send(&app, "PUT", &uri, Some(json!({"endpoint": "mailto:a@b"}))).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		let (status, json) = send(
			&app,
			"PUT",
			&uri,
			Some(json!({"retry_delay_ms": u64::MAX})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(json["error"], "bad_request");

		let stored = state.jobs.get(job.id).await.unwrap().unwrap();
		assert_eq!(stored.schedule, "0 0 * * * *");
		assert_eq!(stored.endpoint, "https://example.com");
		assert_eq!(stored.retry_delay_ms, 5000);

		let (status, _) = send(
			&app,
			"PUT",
			&format!("/api/jobs/{}", JobId::new()),
			Some(json!({"enabled": false})),
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_delete_job() {
		let (app, _) = create_test_app().await;
		let job = create_job(
			&app,
			json!({"schedule": "0 0 * * * *", "endpoint": "https://example.com"}),
		)
		.await;
		let uri = format!("/api/jobs/{}", job.id);

		let (status, _) = send(&app, "DELETE", &uri, None).await;
		assert_eq!(status, StatusCode::NO_CONTENT);

		let (status, _) = send(&app, "DELETE", &uri, None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		let (status, _) = send(&app, "GET", &uri, None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_job_executions_and_observability() {
		let (app, state) = create_test_app().await;
		let job = create_job(
			&app,
			json!({"schedule": "0 0 * * * *", "endpoint": "https://example.com"}),
		)
		.await;

		let now = Utc::now();
		let ok = state.executions.create(job.id, 1, now).await.unwrap();
		state
			.executions
			.mark_success(ok, 200, Some("ok".to_string()), 12)
			.await
			.unwrap();
		let failed = state.executions.create(job.id, 2, now).await.unwrap();
		state
			.executions
			.mark_failure(failed, "boom".to_string(), Some(500), 7)
			.await
			.unwrap();

		let (status, json) = send(
			&app,
			"GET",
			&format!("/api/jobs/{}/executions", job.id),
			None,
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(json["executions"].as_array().unwrap().len(), 2);

		let (_, json) = send(
			&app,
			"GET",
			&format!("/api/jobs/{}/executions?limit=1", job.id),
			None,
		)
		.await;
		assert_eq!(json["executions"].as_array().unwrap().len(), 1);

		let (status, _) = send(
			&app,
			"GET",
			&format!("/api/jobs/{}/executions", JobId::new()),
			None,
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, json) = send(&app, "GET", "/api/observability/stats", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(json["executions"]["total"], 2);
		assert_eq!(json["executions"]["successful"], 1);
		assert_eq!(json["executions"]["failed"], 1);
		assert_eq!(json["scheduler"]["is_running"], false);

		let (status, json) = send(&app, "GET", "/api/observability/failures", None).await;
		assert_eq!(status, StatusCode::OK);
		let failures = json["failures"].as_array().unwrap();
		assert_eq!(failures.len(), 1);
		assert_eq!(failures[0]["error_message"], "boom");
	}

	#[tokio::test]
	async fn test_health() {
		let (app, _) = create_test_app().await;
		let (status, json) = send(&app, "GET", "/api/observability/health", None).await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(json["status"], "healthy");
		assert!(json["timestamp"].is_string());
		assert_eq!(json["scheduler"]["max_concurrent_jobs"], 10);
		assert_eq!(json["scheduler"]["poll_interval_ms"], 1000);
		assert_eq!(json["scheduler"]["running_jobs"], 0);
	}
}
