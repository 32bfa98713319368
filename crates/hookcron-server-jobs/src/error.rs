// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use hookcron_cron_core::CronError;
use hookcron_server_db::DbError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JobError>;

/// Failures while scheduling or dispatching a job.
///
/// HTTP-level failures of the target endpoint are not errors here; they are
/// recorded on the execution and drive retries.
#[derive(Debug, Error)]
pub enum JobError {
	#[error("invalid schedule: {0}")]
	Schedule(#[from] CronError),

	#[error("database error: {0}")]
	Database(#[from] DbError),

	#[error("http client error: {0}")]
	HttpClient(String),

	#[error("internal error: {0}")]
	Internal(String),
}
