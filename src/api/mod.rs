//! Backend collaborators used by the onboarding flow.
//!
//! - **Search**: AI clarification search (`POST /doctors/search/ai`)
//! - **User**: onboarding status flag (`PUT /user`)
//! - **Profile**: collected answers (`PUT /user/profile`)
//!
//! `HttpApiClient` talks to the real REST backend; tests plug in stubs via
//! the `OnboardingApi` trait.

mod http;

pub use http::{ApiConfig, HttpApiClient};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ApiError;
use crate::onboarding::clarification::{SearchRequest, SearchResponse};
use crate::onboarding::profile::ProfileUpdate;

/// Body of `PUT /user` when onboarding finishes.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardStatusUpdate {
    pub onboard_status: &'static str,
}

impl OnboardStatusUpdate {
    pub fn complete() -> Self {
        Self {
            onboard_status: "complete",
        }
    }
}

/// Request/response calls the onboarding session depends on.
#[async_trait]
pub trait OnboardingApi: Send + Sync {
    /// Send one clarification turn to the search backend.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError>;

    /// Flag the user's onboarding as complete.
    async fn mark_onboarding_complete(&self) -> Result<(), ApiError>;

    /// Store the collected profile.
    async fn update_profile(&self, profile: &ProfileUpdate) -> Result<(), ApiError>;
}
