// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job and execution persistence for hookcron.
//!
//! SQLite-backed repositories for job definitions and their execution
//! history, plus the narrow [`JobStore`] and [`ExecutionStore`] traits the
//! scheduler depends on.

pub mod error;
pub mod execution;
pub mod job;
pub mod pool;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use error::{DbError, Result};
pub use execution::{
	truncate_chars, ExecutionRecord, ExecutionRepository, ExecutionStats, ExecutionStore,
	MAX_ERROR_MESSAGE_CHARS, MAX_RESPONSE_BODY_CHARS,
};
pub use job::{Job, JobRepository, JobStore, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};
pub use pool::{create_pool, run_migrations};
pub use types::{ExecutionId, ExecutionStatus, HttpMethod, JobId};
