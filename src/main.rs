use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use kairos_onboard::api::{HttpApiClient, OnboardingApi};
use kairos_onboard::config::AppConfig;
use kairos_onboard::error::Result;
use kairos_onboard::onboarding::{OnboardingRouteState, OnboardingSession, onboarding_routes};

/// Read the environment and wire the backend client into a session.
fn bootstrap() -> Result<(AppConfig, OnboardingSession)> {
    let config = AppConfig::from_env()?;
    let api: Arc<dyn OnboardingApi> = Arc::new(HttpApiClient::new(config.api.clone())?);
    let session = OnboardingSession::new(api, config.session.clone());
    Ok((config, session))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let (config, session) = bootstrap()?;

    eprintln!("🐾 Kairos onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.api.base_url);
    eprintln!(
        "   User token: {}",
        if config.api.user_token.is_some() {
            "set"
        } else {
            "missing (profile and search calls will fail)"
        }
    );
    eprintln!("   Typing delay: {:?}", config.session.typing_delay);
    eprintln!("   Onboarding API: http://0.0.0.0:{}/api/onboarding/state\n", config.port);

    session.start().await;

    let app = onboarding_routes(OnboardingRouteState { session })
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Onboarding server started");
    axum::serve(listener, app).await?;

    Ok(())
}
