// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scheduler configuration section.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_MAX_CONCURRENT_JOBS: u32 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfigLayer {
	pub poll_interval_ms: Option<u64>,
	pub max_concurrent_jobs: Option<u32>,
	pub request_timeout_secs: Option<u64>,
	pub enabled: Option<bool>,
}

impl SchedulerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.poll_interval_ms.is_some() {
			self.poll_interval_ms = other.poll_interval_ms;
		}
		if other.max_concurrent_jobs.is_some() {
			self.max_concurrent_jobs = other.max_concurrent_jobs;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
	}

	pub fn finalize(self) -> SchedulerConfig {
		SchedulerConfig {
			poll_interval_ms: self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
			max_concurrent_jobs: self
				.max_concurrent_jobs
				.unwrap_or(DEFAULT_MAX_CONCURRENT_JOBS),
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
			enabled: self.enabled.unwrap_or(true),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
	pub poll_interval_ms: u64,
	pub max_concurrent_jobs: u32,
	pub request_timeout_secs: u64,
	/// When false the API is served but no jobs are dispatched.
	pub enabled: bool,
}

impl SchedulerConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		let checks = [
			("scheduler.poll_interval_ms", self.poll_interval_ms),
			("scheduler.max_concurrent_jobs", u64::from(self.max_concurrent_jobs)),
			("scheduler.request_timeout_secs", self.request_timeout_secs),
		];
		for (key, value) in checks {
			if value == 0 {
				return Err(ConfigError::Validation(format!("{key} must be at least 1")));
			}
		}
		Ok(())
	}
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		SchedulerConfigLayer::default().finalize()
	}
}
