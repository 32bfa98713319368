// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parsed six-field cron expressions and next-run search.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::{CronError, Result};
use crate::field::{FieldKind, FieldPattern};

/// How far ahead the next-run search looks: one leap year of seconds.
pub const SEARCH_HORIZON_SECS: i64 = 366 * 24 * 3600;

/// A parsed expression of the form
/// `second minute hour day-of-month month day-of-week`.
///
/// All fields are evaluated against UTC wall-clock time and must match
/// simultaneously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
	source: String,
	second: FieldPattern,
	minute: FieldPattern,
	hour: FieldPattern,
	day_of_month: FieldPattern,
	month: FieldPattern,
	day_of_week: FieldPattern,
}

impl CronExpression {
	pub fn parse(expression: &str) -> Result<Self> {
		let parts: Vec<&str> = expression.split_whitespace().collect();
		if parts.len() != FieldKind::ALL.len() {
			return Err(CronError::malformed(format!(
				"expected 6 fields (second minute hour day month day-of-week), found {}",
				parts.len()
			)));
		}

		let field = |index: usize| FieldPattern::parse(parts[index], FieldKind::ALL[index]);

		Ok(Self {
			source: parts.join(" "),
			second: field(0)?,
			minute: field(1)?,
			hour: field(2)?,
			day_of_month: field(3)?,
			month: field(4)?,
			day_of_week: field(5)?,
		})
	}

	/// The expression text, with whitespace normalized to single spaces.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Whether `at` (truncated to whole seconds) satisfies every field.
	pub fn matches(&self, at: DateTime<Utc>) -> bool {
		let at = at.naive_utc();
		self.matches_date(&at) && self.matches_time(&at)
	}

	/// The earliest instant strictly after `from` that matches, searching at
	/// most [`SEARCH_HORIZON_SECS`] seconds ahead.
	///
	/// Sub-second precision of `from` is discarded before the search starts at
	/// the following whole second.
	pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
		let base = from.naive_utc().with_nanosecond(0)?;
		let horizon = base + Duration::seconds(SEARCH_HORIZON_SECS);
		let mut candidate = base + Duration::seconds(1);

		// Skipping to the next day/hour/minute boundary is equivalent to a
		// per-second scan: no instant before the boundary can match.
		while candidate <= horizon {
			let date = candidate.date();

			if !self.matches_date(&candidate) {
				candidate = date.succ_opt()?.and_hms_opt(0, 0, 0)?;
				continue;
			}

			if !self.hour.matches(candidate.hour(), FieldKind::Hour.min()) {
				candidate = date.and_hms_opt(candidate.hour(), 0, 0)? + Duration::hours(1);
				continue;
			}

			if !self.minute.matches(candidate.minute(), FieldKind::Minute.min()) {
				candidate =
					date.and_hms_opt(candidate.hour(), candidate.minute(), 0)? + Duration::minutes(1);
				continue;
			}

			if !self.second.matches(candidate.second(), FieldKind::Second.min()) {
				candidate += Duration::seconds(1);
				continue;
			}

			return Some(Utc.from_utc_datetime(&candidate));
		}

		None
	}

	fn matches_date(&self, at: &NaiveDateTime) -> bool {
		self.month.matches(at.month(), FieldKind::Month.min())
			&& self.day_of_month.matches(at.day(), FieldKind::DayOfMonth.min())
			&& self.day_of_week.matches(
				at.weekday().num_days_from_sunday(),
				FieldKind::DayOfWeek.min(),
			)
	}

	fn matches_time(&self, at: &NaiveDateTime) -> bool {
		self.hour.matches(at.hour(), FieldKind::Hour.min())
			&& self.minute.matches(at.minute(), FieldKind::Minute.min())
			&& self.second.matches(at.second(), FieldKind::Second.min())
	}
}

impl FromStr for CronExpression {
	type Err = CronError;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

impl fmt::Display for CronExpression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

/// Check that `expression` parses. Says nothing about whether it ever matches.
pub fn validate(expression: &str) -> bool {
	CronExpression::parse(expression).is_ok()
}

/// Parse `expression` and find the first matching instant after `from`.
///
/// Returns `Ok(None)` when the expression is well formed but nothing matches
/// within the search horizon.
pub fn next_run_time(expression: &str, from: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
	Ok(CronExpression::parse(expression)?.next_after(from))
}
