//! API client for the health query service.
//!
//! This module provides the `ApiClient` struct for signing in and for
//! submitting free-text queries with a bearer token.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{AuthMode, AuthResponse, Credentials, Identity, QueryResult};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Where the query service listens unless configured otherwise
pub const DEFAULT_BASE_URL: &str = "http://localhost:5050";

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// API client for the health query service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url`.
    ///
    /// With `timeout` unset, requests wait as long as the transport allows.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST credentials to `/login` or `/signup`.
    ///
    /// A successful login always carries an access token; a response
    /// without one is reported as a decode error.
    pub async fn authenticate(
        &self,
        mode: AuthMode,
        credentials: &Credentials,
    ) -> Result<AuthResponse, ApiError> {
        let url = self.url(mode.path());
        debug!(%mode, username = %credentials.username, "Sending auth request");

        let response = self
            .client
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| ApiError::Auth(transport_message(&e)))?;

        let response = check_response(response, ApiError::auth_from_body).await?;
        let auth: AuthResponse = decode(response).await?;

        if mode == AuthMode::Login && auth.access_token.as_deref().unwrap_or("").is_empty() {
            return Err(ApiError::Decode("login response has no access_token".to_string()));
        }

        Ok(auth)
    }

    /// POST free text to `/query` with the given bearer token
    pub async fn query(&self, token: &str, text: &str) -> Result<QueryResult, ApiError> {
        let url = self.url("query");
        debug!(query = %text, "Sending query");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&QueryRequest { query: text })
            .send()
            .await
            .map_err(|e| ApiError::Query(transport_message(&e)))?;

        let response = check_response(response, ApiError::query_from_body).await?;
        let result: QueryResult = decode(response).await?;

        debug!(
            entries = result.entry.as_ref().map(Vec::len).unwrap_or(0),
            "Query answered"
        );
        Ok(result)
    }

    /// GET `/protected` to learn who the token belongs to
    pub async fn whoami(&self, token: &str) -> Result<Identity, ApiError> {
        let url = self.url("protected");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Auth(transport_message(&e)))?;

        let response = check_response(response, |body| {
            ApiError::Auth(
                ApiError::server_message(body, "msg").unwrap_or_else(|| "Token rejected".to_string()),
            )
        })
        .await?;

        decode(response).await
    }
}

/// Turn a non-2xx response into an error built from its body.
async fn check_response(
    response: Response,
    to_error: impl FnOnce(&str) -> ApiError,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let err = to_error(&body);
    warn!(status = status.as_u16(), error = %err, "Request rejected");
    if status == StatusCode::UNAUTHORIZED {
        debug!("Server answered 401 - token or credentials not accepted");
    }
    Err(err)
}

/// Read a 2xx body and decode it, keeping shape mismatches distinct
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;

    serde_json::from_str(&body).map_err(|e| {
        warn!(error = %e, "Failed to decode response body");
        ApiError::Decode(e.to_string())
    })
}

fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Connection timed out. Please try again.".to_string()
    } else if err.is_connect() {
        "Unable to connect to server. Is the query service running?".to_string()
    } else {
        format!("Request failed: {}", err)
    }
}
