// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scheduling and execution of HTTP jobs.
//!
//! The [`Scheduler`] polls a [`hookcron_server_db::JobStore`] for due jobs,
//! advances each job's next run and hands it to the [`JobExecutor`], which
//! performs the HTTP call with bounded retries and records every attempt.

pub mod error;
pub mod executor;
pub mod http;
pub mod running;
pub mod scheduler;
#[cfg(test)]
mod testing;

pub use error::{JobError, Result};
pub use executor::{DispatchOutcome, JobExecutor};
pub use http::{
	HttpInvoker, HttpResponse, ReqwestInvoker, TransportFailure, DEFAULT_REQUEST_TIMEOUT,
};
pub use running::{RunningGuard, RunningSet};
pub use scheduler::{
	Scheduler, SchedulerConfig, SchedulerStatus, DEFAULT_MAX_CONCURRENT_JOBS, DEFAULT_POLL_INTERVAL,
};
