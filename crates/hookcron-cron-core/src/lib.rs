// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cron expression evaluation for hookcron.
//!
//! Expressions have six whitespace-separated fields:
//! `second minute hour day-of-month month day-of-week`. Each field accepts
//! `*`, `*/step`, `a-b`, `a-b/step`, `a,b,c` or a bare integer.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//!
//! let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let next = hookcron_cron_core::next_run_time("0 */15 * * * *", from)
//! 	.unwrap()
//! 	.unwrap();
//! assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 0, 15, 0).unwrap());
//! ```

pub mod error;
pub mod expression;
pub mod field;

pub use error::{CronError, Result};
pub use expression::{next_run_time, validate, CronExpression, SEARCH_HORIZON_SECS};
pub use field::{FieldKind, FieldPattern};
