// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifiers, enums and timestamp encoding shared by the repositories.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DbError, Result};

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobId(pub Uuid);

impl JobId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for JobId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for JobId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for JobId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Unique identifier for one execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for ExecutionId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ExecutionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ExecutionId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// HTTP method used when invoking a job's endpoint.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	Get,
	#[default]
	Post,
	Put,
	Patch,
	Delete,
}

impl HttpMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Patch => "PATCH",
			HttpMethod::Delete => "DELETE",
		}
	}

	/// Write-style methods carry the job body; the rest are sent without one.
	pub fn sends_body(&self) -> bool {
		matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
	}
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for HttpMethod {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(HttpMethod::Get),
			"POST" => Ok(HttpMethod::Post),
			"PUT" => Ok(HttpMethod::Put),
			"PATCH" => Ok(HttpMethod::Patch),
			"DELETE" => Ok(HttpMethod::Delete),
			_ => Err(format!("unknown http method: {s}")),
		}
	}
}

/// Lifecycle state of an execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
	Running,
	Success,
	Failure,
}

impl ExecutionStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			ExecutionStatus::Running => "running",
			ExecutionStatus::Success => "success",
			ExecutionStatus::Failure => "failure",
		}
	}

	pub fn is_terminal(&self) -> bool {
		!matches!(self, ExecutionStatus::Running)
	}
}

impl fmt::Display for ExecutionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ExecutionStatus {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"running" => Ok(ExecutionStatus::Running),
			"success" => Ok(ExecutionStatus::Success),
			"failure" => Ok(ExecutionStatus::Failure),
			_ => Err(format!("unknown execution status: {s}")),
		}
	}
}

/// Encode a timestamp as fixed-width RFC 3339 so that SQL string comparison
/// orders the same way as time.
pub(crate) fn encode_timestamp(dt: DateTime<Utc>) -> String {
	dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp '{s}': {e}")))
}

pub(crate) fn decode_optional_timestamp(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
	s.as_deref().map(decode_timestamp).transpose()
}

/// SQLite integers are signed: values above `i64::MAX` are refused, not wrapped.
pub(crate) fn encode_u64(value: u64, column: &str) -> Result<i64> {
	i64::try_from(value)
		.map_err(|_| DbError::Internal(format!("{column} out of range: {value}")))
}

pub(crate) fn decode_u64(value: i64, column: &str) -> Result<u64> {
	u64::try_from(value)
		.map_err(|_| DbError::Internal(format!("{column} out of range: {value}")))
}

pub(crate) fn decode_u32(value: i64, column: &str) -> Result<u32> {
	u32::try_from(value)
		.map_err(|_| DbError::Internal(format!("{column} out of range: {value}")))
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
	Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("invalid id '{s}': {e}")))
}
