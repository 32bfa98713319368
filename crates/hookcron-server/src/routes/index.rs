// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::version::VERSION;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexEndpoints {
	pub jobs: String,
	pub observability: String,
	pub openapi: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexResponse {
	pub name: String,
	pub version: String,
	pub endpoints: IndexEndpoints,
}

/// GET / - Service name, version and where the APIs live.
#[utoipa::path(
	get,
	path = "/",
	responses(
		(status = 200, description = "Service index", body = IndexResponse)
	),
	tag = "index"
)]
pub async fn index() -> Json<IndexResponse> {
	Json(IndexResponse {
		name: "hookcron".to_string(),
		version: VERSION.to_string(),
		endpoints: IndexEndpoints {
			jobs: "/api/jobs".to_string(),
			observability: "/api/observability".to_string(),
			openapi: "/api/openapi.json".to_string(),
		},
	})
}
