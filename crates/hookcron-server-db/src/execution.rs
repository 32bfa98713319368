// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DbError, Result};
use crate::types::{
	decode_optional_timestamp, decode_timestamp, decode_u32, decode_u64, encode_timestamp,
	encode_u64, parse_uuid, ExecutionId, ExecutionStatus, JobId,
};

/// Maximum stored response body length, in characters.
pub const MAX_RESPONSE_BODY_CHARS: usize = 1000;

/// Maximum stored error message length, in characters.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((byte_index, _)) => text[..byte_index].to_string(),
		None => text.to_string(),
	}
}

/// One HTTP attempt made on behalf of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExecutionRecord {
	pub id: ExecutionId,
	pub job_id: JobId,
	/// 1-based attempt number within one dispatch.
	pub attempt: u32,
	pub status: ExecutionStatus,
	/// The due instant this dispatch was intended for.
	pub scheduled_at: DateTime<Utc>,
	pub started_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub duration_ms: Option<u64>,
	pub response_code: Option<u16>,
	pub response_body: Option<String>,
	pub error_message: Option<String>,
}

/// Aggregate execution counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExecutionStats {
	pub total: u64,
	pub successful: u64,
	pub failed: u64,
	pub last_24_hours: u64,
}

#[derive(sqlx::FromRow)]
struct ExecutionRow {
	id: String,
	job_id: String,
	attempt: i64,
	status: String,
	scheduled_at: String,
	started_at: String,
	completed_at: Option<String>,
	duration_ms: Option<i64>,
	response_code: Option<i64>,
	response_body: Option<String>,
	error_message: Option<String>,
}

impl TryFrom<ExecutionRow> for ExecutionRecord {
	type Error = DbError;

	fn try_from(row: ExecutionRow) -> Result<Self> {
		Ok(ExecutionRecord {
			id: ExecutionId(parse_uuid(&row.id)?),
			job_id: JobId(parse_uuid(&row.job_id)?),
			attempt: decode_u32(row.attempt, "attempt")?,
			status: row.status.parse().map_err(DbError::Internal)?,
			scheduled_at: decode_timestamp(&row.scheduled_at)?,
			started_at: decode_timestamp(&row.started_at)?,
			completed_at: decode_optional_timestamp(row.completed_at)?,
			duration_ms: row
				.duration_ms
				.map(|d| decode_u64(d, "duration_ms"))
				.transpose()?,
			response_code: row
				.response_code
				.map(|c| u16::try_from(c).map_err(|e| DbError::Internal(e.to_string())))
				.transpose()?,
			response_body: row.response_body,
			error_message: row.error_message,
		})
	}
}

const EXECUTION_COLUMNS: &str = "id, job_id, attempt, status, scheduled_at, started_at, \
	completed_at, duration_ms, response_code, response_body, error_message";

/// The execution-record operations the executor depends on.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
	/// Open a `running` record for one attempt.
	async fn create(
		&self,
		job_id: JobId,
		attempt: u32,
		scheduled_at: DateTime<Utc>,
	) -> Result<ExecutionId>;

	async fn mark_success(
		&self,
		id: ExecutionId,
		response_code: u16,
		response_body: Option<String>,
		duration_ms: u64,
	) -> Result<()>;

	async fn mark_failure(
		&self,
		id: ExecutionId,
		error_message: String,
		response_code: Option<u16>,
		duration_ms: u64,
	) -> Result<()>;
}

#[derive(Clone)]
pub struct ExecutionRepository {
	pool: SqlitePool,
}

impl ExecutionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(job_id = %job_id))]
	pub async fn create(
		&self,
		job_id: JobId,
		attempt: u32,
		scheduled_at: DateTime<Utc>,
	) -> Result<ExecutionId> {
		let id = ExecutionId::new();
		sqlx::query(
			r#"
			INSERT INTO job_executions (id, job_id, attempt, status, scheduled_at, started_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(job_id.to_string())
		.bind(i64::from(attempt))
		.bind(ExecutionStatus::Running.as_str())
		.bind(encode_timestamp(scheduled_at))
		.bind(encode_timestamp(Utc::now()))
		.execute(&self.pool)
		.await?;

		Ok(id)
	}

	#[tracing::instrument(skip(self, response_body), fields(execution_id = %id))]
	pub async fn mark_success(
		&self,
		id: ExecutionId,
		response_code: u16,
		response_body: Option<String>,
		duration_ms: u64,
	) -> Result<()> {
		self
			.complete(
				id,
				ExecutionStatus::Success,
				Some(response_code),
				response_body,
				None,
				duration_ms,
			)
			.await
	}

	#[tracing::instrument(skip(self, error_message), fields(execution_id = %id))]
	pub async fn mark_failure(
		&self,
		id: ExecutionId,
		error_message: String,
		response_code: Option<u16>,
		duration_ms: u64,
	) -> Result<()> {
		self
			.complete(
				id,
				ExecutionStatus::Failure,
				response_code,
				None,
				Some(error_message),
				duration_ms,
			)
			.await
	}

	/// Move a running record to a terminal state. Records that are already
	/// terminal are left untouched.
	async fn complete(
		&self,
		id: ExecutionId,
		status: ExecutionStatus,
		response_code: Option<u16>,
		response_body: Option<String>,
		error_message: Option<String>,
		duration_ms: u64,
	) -> Result<()> {
		let result = sqlx::query(
			r#"
			UPDATE job_executions
			SET status = ?,
				completed_at = ?,
				duration_ms = ?,
				response_code = ?,
				response_body = ?,
				error_message = ?
			WHERE id = ? AND status = 'running'
			"#,
		)
		.bind(status.as_str())
		.bind(encode_timestamp(Utc::now()))
		.bind(encode_u64(duration_ms, "duration_ms")?)
		.bind(response_code.map(i64::from))
		.bind(response_body)
		.bind(error_message)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(id.to_string()));
		}

		Ok(())
	}

	#[tracing::instrument(skip(self), fields(execution_id = %id))]
	pub async fn get(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>> {
		let row = sqlx::query_as::<_, ExecutionRow>(&format!(
			"SELECT {EXECUTION_COLUMNS} FROM job_executions WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	/// Most recent executions of a job, newest first.
	#[tracing::instrument(skip(self), fields(job_id = %job_id))]
	pub async fn list_for_job(&self, job_id: JobId, limit: u32) -> Result<Vec<ExecutionRecord>> {
		let rows = sqlx::query_as::<_, ExecutionRow>(&format!(
			r#"
			SELECT {EXECUTION_COLUMNS}
			FROM job_executions
			WHERE job_id = ?
			ORDER BY started_at DESC, attempt DESC
			LIMIT ?
			"#
		))
		.bind(job_id.to_string())
		.bind(limit as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	/// Most recent failed executions across all jobs, newest first.
	#[tracing::instrument(skip(self))]
	pub async fn recent_failures(&self, limit: u32) -> Result<Vec<ExecutionRecord>> {
		let rows = sqlx::query_as::<_, ExecutionRow>(&format!(
			r#"
			SELECT {EXECUTION_COLUMNS}
			FROM job_executions
			WHERE status = 'failure'
			ORDER BY started_at DESC
			LIMIT ?
			"#
		))
		.bind(limit as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[tracing::instrument(skip(self))]
	pub async fn stats(&self, now: DateTime<Utc>) -> Result<ExecutionStats> {
		let since = encode_timestamp(now - Duration::hours(24));
		let (total, successful, failed, last_24_hours) =
			sqlx::query_as::<_, (i64, i64, i64, i64)>(
				r#"
				SELECT COUNT(*),
					COALESCE(SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END), 0),
					COALESCE(SUM(CASE WHEN status = 'failure' THEN 1 ELSE 0 END), 0),
					COALESCE(SUM(CASE WHEN started_at >= ? THEN 1 ELSE 0 END), 0)
				FROM job_executions
				"#,
			)
			.bind(since)
			.fetch_one(&self.pool)
			.await?;

		Ok(ExecutionStats {
			total: total as u64,
			successful: successful as u64,
			failed: failed as u64,
			last_24_hours: last_24_hours as u64,
		})
	}
}

#[async_trait]
impl ExecutionStore for ExecutionRepository {
	async fn create(
		&self,
		job_id: JobId,
		attempt: u32,
		scheduled_at: DateTime<Utc>,
	) -> Result<ExecutionId> {
		self.create(job_id, attempt, scheduled_at).await
	}

	async fn mark_success(
		&self,
		id: ExecutionId,
		response_code: u16,
		response_body: Option<String>,
		duration_ms: u64,
	) -> Result<()> {
		self
			.mark_success(id, response_code, response_body, duration_ms)
			.await
	}

	async fn mark_failure(
		&self,
		id: ExecutionId,
		error_message: String,
		response_code: Option<u16>,
		duration_ms: u64,
	) -> Result<()> {
		self
			.mark_failure(id, error_message, response_code, duration_ms)
			.await
	}
}
