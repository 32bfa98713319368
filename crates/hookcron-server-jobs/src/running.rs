// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-local registry of jobs with a dispatch in flight.

use hookcron_server_db::JobId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct RunningSet {
	inner: Arc<Mutex<HashSet<JobId>>>,
}

impl RunningSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Mark `id` as running. Returns `None` when it already is.
	///
	/// The id stays claimed until the returned guard is dropped.
	pub fn try_claim(&self, id: JobId) -> Option<RunningGuard> {
		if !self.lock().insert(id) {
			return None;
		}
		Some(RunningGuard {
			set: self.clone(),
			id,
		})
	}

	pub fn contains(&self, id: JobId) -> bool {
		self.lock().contains(&id)
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	fn lock(&self) -> MutexGuard<'_, HashSet<JobId>> {
		self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

/// Releases a job's claim on drop, including on early return or panic.
#[derive(Debug)]
pub struct RunningGuard {
	set: RunningSet,
	id: JobId,
}

impl RunningGuard {
	pub fn job_id(&self) -> JobId {
		self.id
	}
}

impl Drop for RunningGuard {
	fn drop(&mut self) {
		self.set.lock().remove(&self.id);
	}
}
