//! REST endpoints that let a thin client drive the onboarding session.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::session::OnboardingSession;
use crate::error::{FlowError, SessionError};

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub session: OnboardingSession,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    text: String,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    option: String,
}

#[derive(Debug, Deserialize)]
struct ChurchBody {
    #[serde(default)]
    name: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::Flow(FlowError::UnknownOption { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SessionError::Flow(_)
            | SessionError::RequestInFlight
            | SessionError::ClarificationInactive
            | SessionError::NothingToRetry => StatusCode::CONFLICT,
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

async fn health() -> impl IntoResponse {
    "ok"
}

/// GET /api/onboarding/state
async fn get_state(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.session.view().await)
}

/// POST /api/onboarding/start
///
/// Starts (or resumes) the typing delay for the current question.
async fn start(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.session.start().await)
}

/// POST /api/onboarding/input
///
/// Filters text as it is typed, e.g. digits only for the age question.
async fn sanitize_input(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<TextBody>,
) -> impl IntoResponse {
    let text = state.session.sanitize_input(&body.text).await;
    Json(serde_json::json!({ "text": text }))
}

/// POST /api/onboarding/answer
async fn submit_answer(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<TextBody>,
) -> Result<impl IntoResponse, SessionError> {
    Ok(Json(state.session.submit_text(&body.text).await?))
}

/// POST /api/onboarding/select
async fn select_option(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<SelectBody>,
) -> Result<impl IntoResponse, SessionError> {
    Ok(Json(state.session.select_option(&body.option).await?))
}

/// POST /api/onboarding/church
async fn submit_church(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<ChurchBody>,
) -> Result<impl IntoResponse, SessionError> {
    Ok(Json(state.session.submit_church(&body.name).await?))
}

/// POST /api/onboarding/search
async fn begin_search(
    State(state): State<OnboardingRouteState>,
) -> Result<impl IntoResponse, SessionError> {
    Ok(Json(state.session.begin_search().await?))
}

/// POST /api/onboarding/clarify
async fn clarify(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<TextBody>,
) -> Result<impl IntoResponse, SessionError> {
    Ok(Json(state.session.send_clarification(&body.text).await?))
}

/// POST /api/onboarding/retry
async fn retry(
    State(state): State<OnboardingRouteState>,
) -> Result<impl IntoResponse, SessionError> {
    Ok(Json(state.session.retry().await?))
}

/// POST /api/onboarding/error/dismiss
async fn dismiss_error(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.session.dismiss_error().await)
}

/// POST /api/onboarding/leave
async fn leave(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.session.navigate_away().await)
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding/state", get(get_state))
        .route("/api/onboarding/start", post(start))
        .route("/api/onboarding/input", post(sanitize_input))
        .route("/api/onboarding/answer", post(submit_answer))
        .route("/api/onboarding/select", post(select_option))
        .route("/api/onboarding/church", post(submit_church))
        .route("/api/onboarding/search", post(begin_search))
        .route("/api/onboarding/clarify", post(clarify))
        .route("/api/onboarding/retry", post(retry))
        .route("/api/onboarding/error/dismiss", post(dismiss_error))
        .route("/api/onboarding/leave", post(leave))
        .with_state(state)
}
