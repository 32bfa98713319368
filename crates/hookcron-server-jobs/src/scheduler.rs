// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Poll loop that finds due jobs, advances their next run and dispatches them.

use chrono::{DateTime, Utc};
use hookcron_cron_core::next_run_time;
use hookcron_server_db::{Job, JobStore};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::executor::JobExecutor;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
	pub poll_interval: Duration,
	pub max_concurrent_jobs: usize,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			poll_interval: DEFAULT_POLL_INTERVAL,
			max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
		}
	}
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SchedulerStatus {
	pub is_running: bool,
	pub running_jobs: usize,
	pub max_concurrent_jobs: usize,
	pub poll_interval_ms: u64,
}

/// Polls the job store for due jobs and hands them to the executor.
///
/// A single loop task runs one cycle at a time; cycles never overlap.
/// Dispatched jobs run on their own tasks and outlive [`Scheduler::stop`].
pub struct Scheduler {
	jobs: Arc<dyn JobStore>,
	executor: JobExecutor,
	config: SchedulerConfig,
	shutdown_tx: broadcast::Sender<()>,
	handle: Mutex<Option<JoinHandle<()>>>,
	running: AtomicBool,
}

impl Scheduler {
	pub fn new(jobs: Arc<dyn JobStore>, executor: JobExecutor, config: SchedulerConfig) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs,
			executor,
			config,
			shutdown_tx,
			handle: Mutex::new(None),
			running: AtomicBool::new(false),
		}
	}

	pub fn executor(&self) -> &JobExecutor {
		&self.executor
	}

	pub fn config(&self) -> &SchedulerConfig {
		&self.config
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	/// Start the poll loop. Calling this while already running does nothing.
	///
	/// Enabled jobs without a next run get one computed first; failures there
	/// are logged per job.
	#[instrument(skip(self))]
	pub async fn start(self: &Arc<Self>) {
		let mut handle = self.handle.lock().await;
		if handle.is_some() {
			info!("scheduler already running");
			return;
		}

		self.initialize_next_runs().await;

		let scheduler = Arc::clone(self);
		let mut shutdown_rx = self.shutdown_tx.subscribe();
		let poll_interval = self.config.poll_interval;

		*handle = Some(tokio::spawn(async move {
			loop {
				tokio::select! {
					_ = tokio::time::sleep(poll_interval) => {
						scheduler.poll_cycle().await;
					}
					_ = shutdown_rx.recv() => {
						debug!("scheduler poll loop received shutdown");
						break;
					}
				}
			}
		}));
		self.running.store(true, Ordering::SeqCst);

		info!(
			poll_interval_ms = poll_interval.as_millis() as u64,
			max_concurrent_jobs = self.config.max_concurrent_jobs,
			"scheduler started"
		);
	}

	/// Stop the poll loop and wait for the current cycle to finish.
	/// In-flight dispatches keep running.
	#[instrument(skip(self))]
	pub async fn stop(&self) {
		let mut handle = self.handle.lock().await;
		let Some(task) = handle.take() else {
			debug!("scheduler not running");
			return;
		};

		let _ = self.shutdown_tx.send(());
		if let Err(e) = task.await {
			warn!(error = %e, "scheduler poll loop ended abnormally");
		}
		self.running.store(false, Ordering::SeqCst);

		info!(
			running_jobs = self.executor.running_count(),
			"scheduler stopped"
		);
	}

	/// Run one poll cycle and return how many jobs were dispatched.
	///
	/// Each due job's next run is persisted before it is dispatched. A job
	/// whose schedule cannot be evaluated or whose update fails is skipped
	/// and stays due.
	#[instrument(skip(self))]
	pub async fn poll_cycle(&self) -> usize {
		let running = self.executor.running_count();
		let available = self.config.max_concurrent_jobs.saturating_sub(running);
		if available == 0 {
			debug!(running, "at max concurrent jobs, skipping poll");
			return 0;
		}

		let now = Utc::now();
		let due = match self.jobs.find_due(available, now).await {
			Ok(due) => due,
			Err(e) => {
				error!(error = %e, "failed to query due jobs");
				return 0;
			}
		};

		if due.is_empty() {
			return 0;
		}
		debug!(count = due.len(), available, "found due jobs");

		let mut dispatched = 0;
		for job in due {
			if let Err(e) = self.advance(&job, now).await {
				warn!(job_id = %job.id, schedule = %job.schedule, error = %e, "skipping job");
				continue;
			}
			if self.executor.dispatch(job).is_some() {
				dispatched += 1;
			}
		}

		dispatched
	}

	pub fn status(&self) -> SchedulerStatus {
		SchedulerStatus {
			is_running: self.is_running(),
			running_jobs: self.executor.running_count(),
			max_concurrent_jobs: self.config.max_concurrent_jobs,
			poll_interval_ms: self.config.poll_interval.as_millis() as u64,
		}
	}

	async fn advance(&self, job: &Job, now: DateTime<Utc>) -> Result<()> {
		let next = next_run_time(&job.schedule, now)?;
		if next.is_none() {
			warn!(job_id = %job.id, schedule = %job.schedule, "no future run within search horizon");
		}
		self.jobs.update_next_run_at(job.id, next, Some(now)).await?;
		Ok(())
	}

	async fn initialize_next_runs(&self) {
		let jobs = match self.jobs.list_enabled().await {
			Ok(jobs) => jobs,
			Err(e) => {
				error!(error = %e, "failed to load enabled jobs");
				return;
			}
		};

		let now = Utc::now();
		let mut initialized = 0;
		for job in jobs.into_iter().filter(|job| job.next_run_at.is_none()) {
			let next = match next_run_time(&job.schedule, now) {
				Ok(Some(next)) => next,
				Ok(None) => {
					warn!(job_id = %job.id, schedule = %job.schedule, "no future run within search horizon");
					continue;
				}
				Err(e) => {
					warn!(job_id = %job.id, error = %e, "invalid schedule");
					continue;
				}
			};

			match self.jobs.update_next_run_at(job.id, Some(next), None).await {
				Ok(()) => initialized += 1,
				Err(e) => warn!(job_id = %job.id, error = %e, "failed to initialize next run"),
			}
		}

		if initialized > 0 {
			info!(initialized, "initialized next run for jobs");
		}
	}
}
