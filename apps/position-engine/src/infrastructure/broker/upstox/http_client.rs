//! HTTP client wrapper for the Upstox REST API.
//!
//! One attempt per call. Retry is applied by the gateway decorator so the
//! same policy covers every adapter.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::broker::HttpStatusClass;

use super::api_types::{UpstoxEnvelope, UpstoxErrorResponse};
use super::config::UpstoxConfig;
use super::error::UpstoxError;

/// HTTP client for the Upstox API.
#[derive(Debug, Clone)]
pub struct UpstoxHttpClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl UpstoxHttpClient {
    /// Create a new HTTP client from config.
    ///
    /// # Errors
    ///
    /// Returns error if the access token is empty or the client cannot be built.
    pub fn new(config: &UpstoxConfig) -> Result<Self, UpstoxError> {
        if config.access_token.trim().is_empty() {
            return Err(UpstoxError::AuthenticationFailed);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstoxError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            access_token: config.access_token.clone(),
            base_url: config.base_url.clone(),
        })
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, UpstoxError> {
        let url = format!("{}{path}", self.base_url);
        self.send(self.client.get(url).query(query), path).await
    }

    /// Make a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, UpstoxError> {
        let url = format!("{}{path}", self.base_url);
        self.send(self.client.post(url).json(body), path).await
    }

    /// Make a DELETE request.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, UpstoxError> {
        let url = format!("{}{path}", self.base_url);
        self.send(self.client.delete(url).query(query), path).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, UpstoxError> {
        let response = request
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstoxError::Timeout(path.to_string())
                } else if e.is_connect() {
                    UpstoxError::Connection(e.to_string())
                } else {
                    UpstoxError::Indeterminate(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if status.is_server_error() {
                UpstoxError::Unavailable {
                    status: status.as_u16(),
                    message: e.to_string(),
                }
            } else {
                UpstoxError::Indeterminate(format!("status {status}: {e}"))
            }
        })?;

        if status.is_success() {
            let envelope: UpstoxEnvelope<T> =
                serde_json::from_str(&text).map_err(|e| UpstoxError::JsonParse(e.to_string()))?;
            return envelope.data.ok_or_else(|| {
                UpstoxError::JsonParse(format!("response without data (status {})", envelope.status))
            });
        }

        let body: UpstoxErrorResponse = serde_json::from_str(&text).unwrap_or_default();
        let (code, message) = body
            .first()
            .map_or_else(|| (status.as_u16().to_string(), text.clone()), |(c, m)| {
                (c.to_string(), m.to_string())
            });

        tracing::debug!(%path, status = status.as_u16(), %code, %message, "Upstox error response");

        match HttpStatusClass::of(status.as_u16()) {
            HttpStatusClass::RateLimited => Err(UpstoxError::RateLimited),
            HttpStatusClass::Transient => Err(UpstoxError::Unavailable {
                status: status.as_u16(),
                message,
            }),
            HttpStatusClass::Permanent => match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Err(UpstoxError::AuthenticationFailed)
                }
                _ => Err(UpstoxError::Api {
                    status: status.as_u16(),
                    code,
                    message,
                }),
            },
        }
    }
}
