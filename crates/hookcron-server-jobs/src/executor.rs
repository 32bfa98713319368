// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runs a job's HTTP call with bounded retries and records every attempt.

use chrono::Utc;
use futures::FutureExt;
use hookcron_server_db::{
	truncate_chars, ExecutionStore, Job, JobId, MAX_ERROR_MESSAGE_CHARS, MAX_RESPONSE_BODY_CHARS,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::http::HttpInvoker;
use crate::running::RunningSet;

/// Result of one dispatch: how many attempts were made and whether the last
/// one succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
	pub attempts: u32,
	pub succeeded: bool,
}

#[derive(Clone)]
pub struct JobExecutor {
	executions: Arc<dyn ExecutionStore>,
	invoker: Arc<dyn HttpInvoker>,
	running: RunningSet,
}

impl JobExecutor {
	pub fn new(executions: Arc<dyn ExecutionStore>, invoker: Arc<dyn HttpInvoker>) -> Self {
		Self {
			executions,
			invoker,
			running: RunningSet::new(),
		}
	}

	/// Number of jobs with a dispatch in flight.
	pub fn running_count(&self) -> usize {
		self.running.len()
	}

	pub fn is_running(&self, job_id: JobId) -> bool {
		self.running.contains(job_id)
	}

	/// Run `job` to completion on the current task.
	///
	/// Returns `Ok(None)` without touching the execution store when the job
	/// already has a dispatch in flight.
	#[instrument(skip(self, job), fields(job_id = %job.id))]
	pub async fn execute(&self, job: &Job) -> Result<Option<DispatchOutcome>> {
		let Some(_guard) = self.running.try_claim(job.id) else {
			debug!("job already running, skipping");
			return Ok(None);
		};

		self.run_attempts(job).await.map(Some)
	}

	/// Claim `job` and run it on a new task.
	///
	/// The claim is taken before this returns, so `running_count` already
	/// includes the job. Errors and panics inside the task are logged and
	/// surface as `None` from the handle.
	pub fn dispatch(&self, job: Job) -> Option<JoinHandle<Option<DispatchOutcome>>> {
		let Some(guard) = self.running.try_claim(job.id) else {
			debug!(job_id = %job.id, "job already running, skipping");
			return None;
		};

		let executor = self.clone();
		Some(tokio::spawn(async move {
			let _guard = guard;
			let job_id = job.id;

			match AssertUnwindSafe(executor.run_attempts(&job))
				.catch_unwind()
				.await
			{
				Ok(Ok(outcome)) => Some(outcome),
				Ok(Err(e)) => {
					error!(job_id = %job_id, error = %e, "job dispatch failed");
					None
				}
				Err(_) => {
					error!(job_id = %job_id, "job dispatch panicked");
					None
				}
			}
		}))
	}

	/// A record that cannot be completed is logged and left `running`; the
	/// sequence carries on. Only a failed `create` ends it early.
	async fn run_attempts(&self, job: &Job) -> Result<DispatchOutcome> {
		let scheduled_at = job.next_run_at.unwrap_or_else(Utc::now);
		let max_attempts = job.retry_attempts.max(1);

		for attempt in 1..=max_attempts {
			let execution_id = self.executions.create(job.id, attempt, scheduled_at).await?;
			let started = Instant::now();
			let result = self.invoker.invoke(job).await;
			let duration_ms = started.elapsed().as_millis() as u64;

			match result {
				Ok(response) => {
					let body = (!response.body.is_empty())
						.then(|| truncate_chars(&response.body, MAX_RESPONSE_BODY_CHARS));
					if let Err(e) = self
						.executions
						.mark_success(execution_id, response.status, body, duration_ms)
						.await
					{
						error!(
							job_id = %job.id,
							execution_id = %execution_id,
							error = %e,
							"failed to record successful execution"
						);
					}

					info!(
						job_id = %job.id,
						execution_id = %execution_id,
						attempt,
						status = response.status,
						duration_ms,
						"job execution succeeded"
					);
					return Ok(DispatchOutcome {
						attempts: attempt,
						succeeded: true,
					});
				}
				Err(failure) => {
					let message = truncate_chars(&failure.message, MAX_ERROR_MESSAGE_CHARS);
					if let Err(e) = self
						.executions
						.mark_failure(execution_id, message, failure.status, duration_ms)
						.await
					{
						error!(
							job_id = %job.id,
							execution_id = %execution_id,
							error = %e,
							"failed to record failed execution"
						);
					}

					if attempt < max_attempts {
						warn!(
							job_id = %job.id,
							execution_id = %execution_id,
							attempt,
							max_attempts,
							retry_delay_ms = job.retry_delay_ms,
							error = %failure,
							"job execution failed, retrying"
						);
						tokio::time::sleep(job.retry_delay()).await;
					} else {
						warn!(
							job_id = %job.id,
							execution_id = %execution_id,
							attempt,
							error = %failure,
							"job execution failed, no attempts left"
						);
					}
				}
			}
		}

		Ok(DispatchOutcome {
			attempts: max_attempts,
			succeeded: false,
		})
	}
}
