//! HTTP client shared by the auth and post clients

use chirp_protocol::common::ErrorBody;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::config::endpoint_url;
use crate::error::{ChirpError, Result};

/// Raw answer from a service: status plus the unparsed body
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as `R`
    pub fn json<R: DeserializeOwned>(&self) -> Result<R> {
        serde_json::from_str(&self.body).map_err(|e| {
            ChirpError::invalid_response(
                self.status.as_u16(),
                format!("Invalid API response: {}", e),
            )
        })
    }

    /// Message from an `{"error"}` / `{"message"}` body, if there is one
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(ErrorBody::into_message)
    }

    /// Pass successful responses through; turn the rest into errors carrying
    /// the server's message, or `fallback` when the body has none
    pub fn into_result(self, fallback: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let message = self
            .error_message()
            .unwrap_or_else(|| fallback.to_string());

        Err(match self.status {
            StatusCode::UNAUTHORIZED => ChirpError::authentication(message),
            StatusCode::FORBIDDEN => ChirpError::authorization(message),
            status => ChirpError::api(status.as_u16(), message),
        })
    }
}

/// Base HTTP client bound to one service
#[derive(Debug, Clone)]
pub struct BaseClient {
    client: Client,
    base_url: String,
}

impl BaseClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ChirpError::invalid_endpoint("Base URL cannot be empty"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request. Transport failures are errors; HTTP error statuses are not.
    pub async fn send<T>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
        bearer_token: Option<&str>,
    ) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        let url = endpoint_url(&self.base_url, endpoint);
        tracing::debug!(%method, %url, "sending request");

        let mut request_builder = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json");

        if let Some(token) = bearer_token {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", token));
        }

        if let Some(data) = payload {
            request_builder = request_builder.json(data);
        }

        let response = request_builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%url, status = status.as_u16(), "received response");

        Ok(ApiResponse { status, body })
    }

    /// Send, require success, decode the body
    pub async fn request<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
        fallback_error: &str,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(method, endpoint, payload, None)
            .await?
            .into_result(fallback_error)?
            .json()
    }

    /// Same as [`BaseClient::request`] with an `Authorization: Bearer` header
    pub async fn request_with_bearer<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
        bearer_token: &str,
        fallback_error: &str,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(method, endpoint, payload, Some(bearer_token))
            .await?
            .into_result(fallback_error)?
            .json()
    }
}
