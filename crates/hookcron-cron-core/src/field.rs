// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-field patterns of a cron expression.

use std::fmt;

use crate::error::{CronError, Result};

/// Position of a field within a six-field expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
	Second,
	Minute,
	Hour,
	DayOfMonth,
	Month,
	DayOfWeek,
}

impl FieldKind {
	/// Fields in expression order.
	pub const ALL: [FieldKind; 6] = [
		FieldKind::Second,
		FieldKind::Minute,
		FieldKind::Hour,
		FieldKind::DayOfMonth,
		FieldKind::Month,
		FieldKind::DayOfWeek,
	];

	pub fn name(&self) -> &'static str {
		match self {
			FieldKind::Second => "second",
			FieldKind::Minute => "minute",
			FieldKind::Hour => "hour",
			FieldKind::DayOfMonth => "day-of-month",
			FieldKind::Month => "month",
			FieldKind::DayOfWeek => "day-of-week",
		}
	}

	/// Inclusive `(min, max)` bounds. Day-of-week counts Sunday as 0.
	pub fn bounds(&self) -> (u32, u32) {
		match self {
			FieldKind::Second | FieldKind::Minute => (0, 59),
			FieldKind::Hour => (0, 23),
			FieldKind::DayOfMonth => (1, 31),
			FieldKind::Month => (1, 12),
			FieldKind::DayOfWeek => (0, 6),
		}
	}

	pub fn min(&self) -> u32 {
		self.bounds().0
	}
}

impl fmt::Display for FieldKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A parsed field pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPattern {
	/// `*`
	Any,
	/// `*/step`: every `step`-th value counted from the field minimum.
	Step(u32),
	/// `a-b`
	Range { start: u32, end: u32 },
	/// `a-b/step`: every `step`-th value counted from `a`, up to `b`.
	RangeStep { start: u32, end: u32, step: u32 },
	/// `a,b,c`
	List(Vec<u32>),
	/// A bare integer.
	Value(u32),
}

impl FieldPattern {
	pub fn parse(text: &str, kind: FieldKind) -> Result<Self> {
		if text == "*" {
			return Ok(FieldPattern::Any);
		}

		if let Some((range, step)) = text.split_once('/') {
			let step = parse_step(step, kind)?;
			if range == "*" {
				return Ok(FieldPattern::Step(step));
			}
			let (start, end) = parse_range(range, kind)?;
			return Ok(FieldPattern::RangeStep { start, end, step });
		}

		if text.contains('-') {
			let (start, end) = parse_range(text, kind)?;
			return Ok(FieldPattern::Range { start, end });
		}

		if text.contains(',') {
			let values = text
				.split(',')
				.map(|item| parse_value(item, kind))
				.collect::<Result<Vec<_>>>()?;
			return Ok(FieldPattern::List(values));
		}

		parse_value(text, kind).map(FieldPattern::Value)
	}

	/// Whether `value` satisfies this pattern. `min` is the field's lower bound.
	pub fn matches(&self, value: u32, min: u32) -> bool {
		match self {
			FieldPattern::Any => true,
			FieldPattern::Step(step) => value >= min && (value - min) % step == 0,
			FieldPattern::Range { start, end } => (*start..=*end).contains(&value),
			FieldPattern::RangeStep { start, end, step } => {
				(*start..=*end).contains(&value) && (value - start) % step == 0
			}
			FieldPattern::List(values) => values.contains(&value),
			FieldPattern::Value(expected) => value == *expected,
		}
	}
}

fn parse_value(text: &str, kind: FieldKind) -> Result<u32> {
	if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
		return Err(CronError::malformed(format!(
			"{kind} field: '{text}' is not a non-negative integer"
		)));
	}

	let value: u32 = text
		.parse()
		.map_err(|_| CronError::malformed(format!("{kind} field: '{text}' is out of range")))?;

	let (min, max) = kind.bounds();
	if value < min || value > max {
		return Err(CronError::malformed(format!(
			"{kind} field: {value} is outside {min}-{max}"
		)));
	}

	Ok(value)
}

fn parse_range(text: &str, kind: FieldKind) -> Result<(u32, u32)> {
	let (start, end) = text
		.split_once('-')
		.ok_or_else(|| CronError::malformed(format!("{kind} field: '{text}' is not a range")))?;
	let start = parse_value(start, kind)?;
	let end = parse_value(end, kind)?;

	if start > end {
		return Err(CronError::malformed(format!(
			"{kind} field: range {start}-{end} is reversed"
		)));
	}

	Ok((start, end))
}

fn parse_step(text: &str, kind: FieldKind) -> Result<u32> {
	if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
		return Err(CronError::malformed(format!(
			"{kind} field: step '{text}' is not a positive integer"
		)));
	}

	match text.parse::<u32>() {
		Ok(0) | Err(_) => Err(CronError::malformed(format!(
			"{kind} field: step '{text}' is not a positive integer"
		))),
		Ok(step) => Ok(step),
	}
}
