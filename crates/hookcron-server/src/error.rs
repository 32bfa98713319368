// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use hookcron_server_db::DbError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Database error: {0}")]
	Db(#[from] DbError),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Internal error: {0}")]
	Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	fn new(error: &str, message: impl Into<String>) -> Self {
		Self {
			error: error.to_string(),
			message: message.into(),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = match self {
			ServerError::Db(DbError::NotFound(id)) | ServerError::NotFound(id) => (
				StatusCode::NOT_FOUND,
				ErrorResponse::new("not_found", format!("Job not found: {id}")),
			),
			ServerError::Db(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("database_error", "A database error occurred"),
				)
			}
			ServerError::BadRequest(message) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("bad_request", message),
			),
			ServerError::Internal(message) => {
				tracing::error!(error = %message, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("internal_error", "An internal error occurred"),
				)
			}
		};

		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_codes() {
		assert_eq!(
			ServerError::NotFound("x".into()).into_response().status(),
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			ServerError::Db(DbError::NotFound("x".into()))
				.into_response()
				.status(),
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			ServerError::BadRequest("x".into()).into_response().status(),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(
			ServerError::Db(DbError::Internal("x".into()))
				.into_response()
				.status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
		assert_eq!(
			ServerError::Internal("x".into()).into_response().status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}
}
