//! REST client for the Kairos backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{OnboardStatusUpdate, OnboardingApi};
use crate::error::ApiError;
use crate::onboarding::clarification::{SearchRequest, SearchResponse};
use crate::onboarding::profile::ProfileUpdate;

const SEARCH_ENDPOINT: &str = "/doctors/search/ai";
const USER_ENDPOINT: &str = "/user";
const PROFILE_ENDPOINT: &str = "/user/profile";

/// Fallback error detail when the backend gives none.
const DEFAULT_ERROR_DETAIL: &str = "API request failed";

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the version prefix, e.g. `http://localhost:8010/api/v1`.
    pub base_url: String,
    /// Sent as `x-api-key` on every request.
    pub api_key: SecretString,
    /// Bearer token of the signed-in user.
    pub user_token: Option<SecretString>,
    pub timeout: Duration,
}

/// `OnboardingApi` over HTTP with bearer auth.
pub struct HttpApiClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed {
                endpoint: config.base_url.clone(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    /// Send a JSON body with auth headers and map error statuses.
    async fn send<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let token = self
            .config
            .user_token
            .as_ref()
            .ok_or_else(|| ApiError::MissingToken {
                endpoint: endpoint.to_string(),
            })?;

        debug!(%method, endpoint, "Calling backend");
        let response = self
            .client
            .request(method, self.url(endpoint))
            .header("x-api-key", self.config.api_key.expose_secret())
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "Backend rejected the user token");
            return Err(ApiError::Unauthorized {
                endpoint: endpoint.to_string(),
            });
        }
        if !status.is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
                .unwrap_or_else(|| DEFAULT_ERROR_DETAIL.to_string());
            warn!(endpoint, status = status.as_u16(), %detail, "Backend request failed");
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response)
    }

    /// Like `send`, decoding the JSON response body.
    async fn send_json<B, R>(&self, method: Method, endpoint: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(method, endpoint, body)
            .await?
            .json::<R>()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl OnboardingApi for HttpApiClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.send_json(Method::POST, SEARCH_ENDPOINT, request).await
    }

    async fn mark_onboarding_complete(&self) -> Result<(), ApiError> {
        self.send(Method::PUT, USER_ENDPOINT, &OnboardStatusUpdate::complete())
            .await?;
        Ok(())
    }

    async fn update_profile(&self, profile: &ProfileUpdate) -> Result<(), ApiError> {
        self.send(Method::PUT, PROFILE_ENDPOINT, profile).await?;
        Ok(())
    }
}
