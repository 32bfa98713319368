// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{DbError, Result};
use crate::types::{
	decode_optional_timestamp, decode_timestamp, decode_u32, decode_u64, encode_timestamp,
	encode_u64, parse_uuid, HttpMethod, JobId,
};

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5000;

/// A scheduled HTTP call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Job {
	pub id: JobId,
	/// Six-field cron expression: second minute hour day month day-of-week.
	pub schedule: String,
	pub endpoint: String,
	pub method: HttpMethod,
	pub headers: HashMap<String, String>,
	#[schema(value_type = Object)]
	pub body: serde_json::Value,
	pub enabled: bool,
	pub retry_attempts: u32,
	pub retry_delay_ms: u64,
	pub next_run_at: Option<DateTime<Utc>>,
	pub last_run_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Job {
	/// A new enabled job with default method, retries and an empty body.
	pub fn new(schedule: impl Into<String>, endpoint: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: JobId::new(),
			schedule: schedule.into(),
			endpoint: endpoint.into(),
			method: HttpMethod::default(),
			headers: HashMap::new(),
			body: serde_json::Value::Object(Default::default()),
			enabled: true,
			retry_attempts: DEFAULT_RETRY_ATTEMPTS,
			retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
			next_run_at: None,
			last_run_at: None,
			created_at: now,
			updated_at: now,
		}
	}

	/// Enabled and scheduled at or before `now`. A job without a next run is
	/// never due.
	pub fn is_due(&self, now: DateTime<Utc>) -> bool {
		self.enabled && self.next_run_at.is_some_and(|at| at <= now)
	}

	pub fn retry_delay(&self) -> Duration {
		Duration::from_millis(self.retry_delay_ms)
	}
}

#[derive(sqlx::FromRow)]
struct JobRow {
	id: String,
	schedule: String,
	endpoint: String,
	method: String,
	headers: String,
	body: String,
	enabled: bool,
	retry_attempts: i64,
	retry_delay_ms: i64,
	next_run_at: Option<String>,
	last_run_at: Option<String>,
	created_at: String,
	updated_at: String,
}

impl TryFrom<JobRow> for Job {
	type Error = DbError;

	fn try_from(row: JobRow) -> Result<Self> {
		Ok(Job {
			id: JobId(parse_uuid(&row.id)?),
			schedule: row.schedule,
			endpoint: row.endpoint,
			method: row.method.parse().map_err(DbError::Internal)?,
			headers: serde_json::from_str(&row.headers)?,
			body: serde_json::from_str(&row.body)?,
			enabled: row.enabled,
			retry_attempts: decode_u32(row.retry_attempts, "retry_attempts")?,
			retry_delay_ms: decode_u64(row.retry_delay_ms, "retry_delay_ms")?,
			next_run_at: decode_optional_timestamp(row.next_run_at)?,
			last_run_at: decode_optional_timestamp(row.last_run_at)?,
			created_at: decode_timestamp(&row.created_at)?,
			updated_at: decode_timestamp(&row.updated_at)?,
		})
	}
}

const JOB_COLUMNS: &str = "id, schedule, endpoint, method, headers, body, enabled, \
	retry_attempts, retry_delay_ms, next_run_at, last_run_at, created_at, updated_at";

/// The job-store operations the scheduler depends on.
#[async_trait]
pub trait JobStore: Send + Sync {
	/// Up to `limit` enabled jobs whose next run is at or before `now`.
	async fn find_due(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<Job>>;

	/// Persist a job's next run. `dispatched_at`, when given, becomes the
	/// job's `last_run_at`.
	async fn update_next_run_at(
		&self,
		id: JobId,
		next_run_at: Option<DateTime<Utc>>,
		dispatched_at: Option<DateTime<Utc>>,
	) -> Result<()>;

	async fn list_enabled(&self) -> Result<Vec<Job>>;
}

#[derive(Clone)]
pub struct JobRepository {
	pool: SqlitePool,
}

impl JobRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, job), fields(job_id = %job.id))]
	pub async fn create(&self, job: &Job) -> Result<()> {
		sqlx::query(&format!(
			"INSERT INTO jobs ({JOB_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
		))
		.bind(job.id.to_string())
		.bind(&job.schedule)
		.bind(&job.endpoint)
		.bind(job.method.as_str())
		.bind(serde_json::to_string(&job.headers)?)
		.bind(serde_json::to_string(&job.body)?)
		.bind(job.enabled)
		.bind(i64::from(job.retry_attempts))
		.bind(encode_u64(job.retry_delay_ms, "retry_delay_ms")?)
		.bind(job.next_run_at.map(encode_timestamp))
		.bind(job.last_run_at.map(encode_timestamp))
		.bind(encode_timestamp(job.created_at))
		.bind(encode_timestamp(job.updated_at))
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self), fields(job_id = %id))]
	pub async fn get(&self, id: JobId) -> Result<Option<Job>> {
		let row = sqlx::query_as::<_, JobRow>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Job>> {
		let rows = sqlx::query_as::<_, JobRow>(&format!(
			"SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at, id LIMIT ? OFFSET ?"
		))
		.bind(limit as i64)
		.bind(offset as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[tracing::instrument(skip(self))]
	pub async fn count(&self) -> Result<u64> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
			.fetch_one(&self.pool)
			.await?;

		Ok(count.max(0) as u64)
	}

	/// Overwrite a job's definition: schedule, request template, retry
	/// settings and `enabled`.
	///
	/// `next_run_at` and `last_run_at` belong to the scheduler and are never
	/// written here; use [`JobRepository::update_next_run_at`] to change them.
	#[tracing::instrument(skip(self, job), fields(job_id = %job.id))]
	pub async fn update(&self, job: &Job) -> Result<()> {
		let result = sqlx::query(
			r#"
			UPDATE jobs
			SET schedule = ?,
				endpoint = ?,
				method = ?,
				headers = ?,
				body = ?,
				enabled = ?,
				retry_attempts = ?,
				retry_delay_ms = ?,
				updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&job.schedule)
		.bind(&job.endpoint)
		.bind(job.method.as_str())
		.bind(serde_json::to_string(&job.headers)?)
		.bind(serde_json::to_string(&job.body)?)
		.bind(job.enabled)
		.bind(i64::from(job.retry_attempts))
		.bind(encode_u64(job.retry_delay_ms, "retry_delay_ms")?)
		.bind(encode_timestamp(job.updated_at))
		.bind(job.id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(job.id.to_string()));
		}

		Ok(())
	}

	#[tracing::instrument(skip(self), fields(job_id = %id))]
	pub async fn delete(&self, id: JobId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self))]
	pub async fn find_due(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<Job>> {
		let rows = sqlx::query_as::<_, JobRow>(&format!(
			r#"
			SELECT {JOB_COLUMNS}
			FROM jobs
			WHERE enabled = 1
			  AND next_run_at IS NOT NULL
			  AND next_run_at <= ?
			ORDER BY next_run_at
			LIMIT ?
			"#
		))
		.bind(encode_timestamp(now))
		.bind(limit as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[tracing::instrument(skip(self), fields(job_id = %id))]
	pub async fn update_next_run_at(
		&self,
		id: JobId,
		next_run_at: Option<DateTime<Utc>>,
		dispatched_at: Option<DateTime<Utc>>,
	) -> Result<()> {
		let result = sqlx::query(
			r#"
			UPDATE jobs
			SET next_run_at = ?,
				last_run_at = COALESCE(?, last_run_at),
				updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(next_run_at.map(encode_timestamp))
		.bind(dispatched_at.map(encode_timestamp))
		.bind(encode_timestamp(Utc::now()))
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(id.to_string()));
		}

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_enabled(&self) -> Result<Vec<Job>> {
		let rows = sqlx::query_as::<_, JobRow>(&format!(
			"SELECT {JOB_COLUMNS} FROM jobs WHERE enabled = 1 ORDER BY created_at, id"
		))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}
}

#[async_trait]
impl JobStore for JobRepository {
	async fn find_due(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<Job>> {
		self.find_due(limit, now).await
	}

	async fn update_next_run_at(
		&self,
		id: JobId,
		next_run_at: Option<DateTime<Utc>>,
		dispatched_at: Option<DateTime<Utc>>,
	) -> Result<()> {
		self.update_next_run_at(id, next_run_at, dispatched_at).await
	}

	async fn list_enabled(&self) -> Result<Vec<Job>> {
		self.list_enabled().await
	}
}
