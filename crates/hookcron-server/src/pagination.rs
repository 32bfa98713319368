// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared pagination utilities for API handlers.

/// Page-based pagination. Missing or zero values fall back to the defaults.
#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
	/// 1-based page number.
	pub page: Option<u32>,
	pub limit: Option<u32>,
}

impl PaginationParams {
	pub fn page_or_default(&self) -> u32 {
		self.page.filter(|p| *p > 0).unwrap_or(1)
	}

	pub fn limit_clamped(&self, default: u32, max: u32) -> u32 {
		clamp_limit(self.limit, default, max)
	}

	pub fn offset(&self, limit: u32) -> u32 {
		(self.page_or_default() - 1).saturating_mul(limit)
	}
}

/// A bare `limit` query parameter.
#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
	pub limit: Option<u32>,
}

impl LimitParams {
	pub fn limit_clamped(&self, default: u32, max: u32) -> u32 {
		clamp_limit(self.limit, default, max)
	}
}

fn clamp_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
	limit.filter(|l| *l > 0).unwrap_or(default).min(max)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pagination_defaults() {
		let params = PaginationParams::default();
		assert_eq!(params.page_or_default(), 1);
		assert_eq!(params.limit_clamped(20, 100), 20);
		assert_eq!(params.offset(20), 0);
	}

	#[test]
	fn test_pagination_clamping() {
		let params = PaginationParams {
			page: Some(3),
			limit: Some(500),
		};
		let limit = params.limit_clamped(20, 100);
		assert_eq!(limit, 100);
		assert_eq!(params.offset(limit), 200);

		let params = PaginationParams {
			page: Some(0),
			limit: Some(0),
		};
		assert_eq!(params.page_or_default(), 1);
		assert_eq!(params.limit_clamped(20, 100), 20);
	}

	#[test]
	fn test_limit_params() {
		assert_eq!(LimitParams::default().limit_clamped(5, 100), 5);
		assert_eq!(LimitParams { limit: Some(7) }.limit_clamped(5, 100), 7);
		assert_eq!(LimitParams { limit: Some(1000) }.limit_clamped(5, 100), 100);
	}
}
