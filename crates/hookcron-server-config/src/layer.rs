// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, SchedulerConfigLayer,
};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub scheduler: Option<SchedulerConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(
			&mut self.scheduler,
			other.scheduler,
			SchedulerConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_preserves_base_when_other_empty() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer::default());
		assert_eq!(base.http.as_ref().unwrap().port, Some(9000));
	}

	#[test]
	fn test_merge_other_overwrites_field_by_field() {
		let mut base = ServerConfigLayer {
			scheduler: Some(SchedulerConfigLayer {
				poll_interval_ms: Some(500),
				max_concurrent_jobs: Some(4),
				..Default::default()
			}),
			..Default::default()
		};
		let other = ServerConfigLayer {
			scheduler: Some(SchedulerConfigLayer {
				max_concurrent_jobs: Some(16),
				..Default::default()
			}),
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
			}),
			..Default::default()
		};
		base.merge(other);

		let scheduler = base.scheduler.unwrap();
		assert_eq!(scheduler.poll_interval_ms, Some(500));
		assert_eq!(scheduler.max_concurrent_jobs, Some(16));
		assert_eq!(
			base.database.unwrap().url,
			Some("sqlite::memory:".to_string())
		);
	}

	#[test]
	fn test_deserialize_toml_sections() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
[http]
port = 8081

[scheduler]
poll_interval_ms = 250
enabled = false
"#,
		)
		.unwrap();

		assert_eq!(layer.http.unwrap().port, Some(8081));
		let scheduler = layer.scheduler.unwrap();
		assert_eq!(scheduler.poll_interval_ms, Some(250));
		assert_eq!(scheduler.enabled, Some(false));
		assert!(layer.database.is_none());
	}
}
