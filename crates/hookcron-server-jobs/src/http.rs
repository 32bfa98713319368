// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound HTTP calls for job executions.

use async_trait::async_trait;
use hookcron_server_db::{HttpMethod, Job};
use reqwest::{Client, Method};
use std::time::Duration;
use thiserror::Error;

use crate::error::{JobError, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A completed call with a 2xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: String,
}

/// A call that did not produce a 2xx response: timeout, connection error or
/// an error status. `status` is set only when the server answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFailure {
	pub message: String,
	pub status: Option<u16>,
}

impl TransportFailure {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			status: None,
		}
	}

	pub fn from_status(status: u16) -> Self {
		Self {
			message: format!("Request failed with status code {status}"),
			status: Some(status),
		}
	}
}

/// Performs the HTTP request described by a job.
#[async_trait]
pub trait HttpInvoker: Send + Sync {
	async fn invoke(&self, job: &Job) -> std::result::Result<HttpResponse, TransportFailure>;
}

/// [`HttpInvoker`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestInvoker {
	client: Client,
}

impl ReqwestInvoker {
	pub fn new(timeout: Duration) -> Result<Self> {
		let client = hookcron_common_http::client_with_timeout(timeout)
			.map_err(|e| JobError::HttpClient(e.to_string()))?;
		Ok(Self { client })
	}

	pub fn with_client(client: Client) -> Self {
		Self { client }
	}
}

fn to_reqwest_method(method: HttpMethod) -> Method {
	match method {
		HttpMethod::Get => Method::GET,
		HttpMethod::Post => Method::POST,
		HttpMethod::Put => Method::PUT,
		HttpMethod::Patch => Method::PATCH,
		HttpMethod::Delete => Method::DELETE,
	}
}

fn describe(err: &reqwest::Error) -> String {
	if err.is_timeout() {
		format!("request timed out: {err}")
	} else if err.is_connect() {
		format!("connection failed: {err}")
	} else {
		err.to_string()
	}
}

#[async_trait]
impl HttpInvoker for ReqwestInvoker {
	#[tracing::instrument(skip(self, job), fields(job_id = %job.id, method = %job.method, endpoint = %job.endpoint))]
	async fn invoke(&self, job: &Job) -> std::result::Result<HttpResponse, TransportFailure> {
		let mut request = self
			.client
			.request(to_reqwest_method(job.method), &job.endpoint);

		for (name, value) in &job.headers {
			request = request.header(name, value);
		}

		if job.method.sends_body() {
			request = request.json(&job.body);
		}

		let response = request
			.send()
			.await
			.map_err(|e| TransportFailure::new(describe(&e)))?;

		let status = response.status();
		if !status.is_success() {
			tracing::debug!(status = status.as_u16(), "endpoint returned error status");
			return Err(TransportFailure::from_status(status.as_u16()));
		}

		let body = response.text().await.map_err(|e| TransportFailure {
			message: format!("failed to read response body: {e}"),
			status: Some(status.as_u16()),
		})?;

		Ok(HttpResponse {
			status: status.as_u16(),
			body,
		})
	}
}
