// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for cron expression handling.

use thiserror::Error;

/// Result type for cron operations.
pub type Result<T> = std::result::Result<T, CronError>;

/// Errors that can occur while parsing a cron expression.
///
/// An expression that parses but never matches is not an error: the search
/// simply yields no next run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
	#[error("malformed cron expression: {0}")]
	MalformedExpression(String),
}

impl CronError {
	pub(crate) fn malformed(message: impl Into<String>) -> Self {
		Self::MalformedExpression(message.into())
	}
}
