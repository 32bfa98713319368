// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request validation shared by the job handlers.

use hookcron_cron_core::CronExpression;
use hookcron_server_db::JobId;
use url::Url;

use crate::error::ServerError;

pub fn validate_schedule(schedule: &str) -> Result<CronExpression, ServerError> {
	CronExpression::parse(schedule).map_err(|e| {
		ServerError::BadRequest(format!(
			"Invalid cron expression ({e}). Format: second minute hour day month dayOfWeek"
		))
	})
}

/// Endpoints must be absolute `http` or `https` URLs.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ServerError> {
	let url = Url::parse(endpoint)
		.map_err(|e| ServerError::BadRequest(format!("Invalid endpoint '{endpoint}': {e}")))?;

	match url.scheme() {
		"http" | "https" => Ok(()),
		other => Err(ServerError::BadRequest(format!(
			"Invalid endpoint scheme '{other}'. Must be a valid HTTP/HTTPS URL"
		))),
	}
}

pub fn validate_retry_attempts(retry_attempts: u32) -> Result<(), ServerError> {
	if retry_attempts == 0 {
		return Err(ServerError::BadRequest(
			"retry_attempts must be at least 1".to_string(),
		));
	}
	Ok(())
}

/// Delays are stored as signed 64-bit milliseconds.
pub fn validate_retry_delay(retry_delay_ms: u64) -> Result<(), ServerError> {
	if i64::try_from(retry_delay_ms).is_err() {
		return Err(ServerError::BadRequest(format!(
			"retry_delay_ms must be at most {}",
			i64::MAX
		)));
	}
	Ok(())
}

pub fn parse_job_id(raw: &str) -> Result<JobId, ServerError> {
	raw.parse()
		.map_err(|_| ServerError::BadRequest(format!("Invalid job id: {raw}")))
}
