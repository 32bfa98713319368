// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory stores and scripted invokers for executor and scheduler tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hookcron_server_db::{
	DbError, ExecutionId, ExecutionRecord, ExecutionStatus, ExecutionStore, Job, JobId, JobStore,
	Result as DbResult,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

use crate::http::{HttpInvoker, HttpResponse, TransportFailure};

#[derive(Default)]
pub struct MemoryJobStore {
	jobs: Mutex<HashMap<JobId, Job>>,
	fail_find: AtomicBool,
	fail_updates: Mutex<HashSet<JobId>>,
}

impl MemoryJobStore {
	pub fn insert(&self, job: Job) {
		self.jobs.lock().unwrap().insert(job.id, job);
	}

	pub fn get(&self, id: JobId) -> Option<Job> {
		self.jobs.lock().unwrap().get(&id).cloned()
	}

	pub fn set_fail_find(&self, fail: bool) {
		self.fail_find.store(fail, Ordering::SeqCst);
	}

	pub fn fail_updates_for(&self, id: JobId) {
		self.fail_updates.lock().unwrap().insert(id);
	}
}

#[async_trait]
impl JobStore for MemoryJobStore {
	async fn find_due(&self, limit: usize, now: DateTime<Utc>) -> DbResult<Vec<Job>> {
		if self.fail_find.load(Ordering::SeqCst) {
			return Err(DbError::Internal("find_due unavailable".to_string()));
		}

		let mut due: Vec<Job> = self
			.jobs
			.lock()
			.unwrap()
			.values()
			.filter(|job| job.is_due(now))
			.cloned()
			.collect();
		due.sort_by_key(|job| job.next_run_at);
		due.truncate(limit);
		Ok(due)
	}

	async fn update_next_run_at(
		&self,
		id: JobId,
		next_run_at: Option<DateTime<Utc>>,
		dispatched_at: Option<DateTime<Utc>>,
	) -> DbResult<()> {
		if self.fail_updates.lock().unwrap().contains(&id) {
			return Err(DbError::Internal("update unavailable".to_string()));
		}

		let mut jobs = self.jobs.lock().unwrap();
		let job = jobs
			.get_mut(&id)
			.ok_or_else(|| DbError::NotFound(id.to_string()))?;
		job.next_run_at = next_run_at;
		if dispatched_at.is_some() {
			job.last_run_at = dispatched_at;
		}
		Ok(())
	}

	async fn list_enabled(&self) -> DbResult<Vec<Job>> {
		Ok(self
			.jobs
			.lock()
			.unwrap()
			.values()
			.filter(|job| job.enabled)
			.cloned()
			.collect())
	}
}

#[derive(Default)]
pub struct MemoryExecutionStore {
	records: Mutex<Vec<ExecutionRecord>>,
	fail_create: AtomicBool,
	fail_complete: AtomicBool,
}

impl MemoryExecutionStore {
	/// All records in creation order.
	pub fn records(&self) -> Vec<ExecutionRecord> {
		self.records.lock().unwrap().clone()
	}

	pub fn set_fail_create(&self, fail: bool) {
		self.fail_create.store(fail, Ordering::SeqCst);
	}

	/// Make `mark_success` and `mark_failure` error, leaving records running.
	pub fn set_fail_complete(&self, fail: bool) {
		self.fail_complete.store(fail, Ordering::SeqCst);
	}

	fn complete(
		&self,
		id: ExecutionId,
		apply: impl FnOnce(&mut ExecutionRecord),
	) -> DbResult<()> {
		if self.fail_complete.load(Ordering::SeqCst) {
			return Err(DbError::Internal("complete unavailable".to_string()));
		}

		let mut records = self.records.lock().unwrap();
		let record = records
			.iter_mut()
			.find(|r| r.id == id && r.status == ExecutionStatus::Running)
			.ok_or_else(|| DbError::NotFound(id.to_string()))?;
		apply(record);
		record.completed_at = Some(Utc::now());
		Ok(())
	}
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
	async fn create(
		&self,
		job_id: JobId,
		attempt: u32,
		scheduled_at: DateTime<Utc>,
	) -> DbResult<ExecutionId> {
		if self.fail_create.load(Ordering::SeqCst) {
			return Err(DbError::Internal("create unavailable".to_string()));
		}

		let id = ExecutionId::new();
		self.records.lock().unwrap().push(ExecutionRecord {
			id,
			job_id,
			attempt,
			status: ExecutionStatus::Running,
			scheduled_at,
			started_at: Utc::now(),
			completed_at: None,
			duration_ms: None,
			response_code: None,
			response_body: None,
			error_message: None,
		});
		Ok(id)
	}

	async fn mark_success(
		&self,
		id: ExecutionId,
		response_code: u16,
		response_body: Option<String>,
		duration_ms: u64,
	) -> DbResult<()> {
		self.complete(id, |record| {
			record.status = ExecutionStatus::Success;
			record.response_code = Some(response_code);
			record.response_body = response_body;
			record.duration_ms = Some(duration_ms);
		})
	}

	async fn mark_failure(
		&self,
		id: ExecutionId,
		error_message: String,
		response_code: Option<u16>,
		duration_ms: u64,
	) -> DbResult<()> {
		self.complete(id, |record| {
			record.status = ExecutionStatus::Failure;
			record.error_message = Some(error_message);
			record.response_code = response_code;
			record.duration_ms = Some(duration_ms);
		})
	}
}

enum Behaviour {
	Respond(HttpResponse),
	Fail(TransportFailure),
	FailTimes(u32),
}

/// Scripted [`HttpInvoker`]. A gated invoker blocks every call until the
/// paired sender publishes `true`.
pub struct MockInvoker {
	behaviour: Behaviour,
	gate: Option<watch::Receiver<bool>>,
	calls: AtomicU32,
}

impl MockInvoker {
	fn with(behaviour: Behaviour) -> Self {
		Self {
			behaviour,
			gate: None,
			calls: AtomicU32::new(0),
		}
	}

	pub fn succeed() -> Self {
		Self::respond(ok_response())
	}

	pub fn respond(response: HttpResponse) -> Self {
		Self::with(Behaviour::Respond(response))
	}

	pub fn fail() -> Self {
		Self::fail_with(TransportFailure::from_status(500))
	}

	pub fn fail_with(failure: TransportFailure) -> Self {
		Self::with(Behaviour::Fail(failure))
	}

	/// Fail the first `n` calls, then succeed.
	pub fn fail_times(n: u32) -> Self {
		Self::with(Behaviour::FailTimes(n))
	}

	pub fn gated() -> (Self, watch::Sender<bool>) {
		let (tx, rx) = watch::channel(false);
		let mut invoker = Self::succeed();
		invoker.gate = Some(rx);
		(invoker, tx)
	}

	pub fn calls(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}
}

fn ok_response() -> HttpResponse {
	HttpResponse {
		status: 200,
		body: "ok".to_string(),
	}
}

#[async_trait]
impl HttpInvoker for MockInvoker {
	async fn invoke(&self, _job: &Job) -> Result<HttpResponse, TransportFailure> {
		if let Some(gate) = &self.gate {
			let mut gate = gate.clone();
			let _ = gate.wait_for(|open| *open).await;
		}

		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		match &self.behaviour {
			Behaviour::Respond(response) => Ok(response.clone()),
			Behaviour::Fail(failure) => Err(failure.clone()),
			Behaviour::FailTimes(n) if call <= *n => Err(TransportFailure::from_status(500)),
			Behaviour::FailTimes(_) => Ok(ok_response()),
		}
	}
}
