//! StoryPulse Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storypulse_engine::{api, App, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storypulse_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting StoryPulse Engine");

    // Load configuration
    let config = EngineConfig::from_env();
    tracing::info!(
        upstream = %config.upstream_url,
        mode = %config.flavor.as_str(),
        model = %config.default_model,
        "Upstream configured"
    );

    // Create application
    let app = Arc::new(App::new(config.clone()));

    // Build router
    let router = api::http::routes()
        .with_state(app)
        .layer(build_cors_layer_from_env())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

/// CORS policy from `ALLOWED_ORIGINS` (comma-separated). Unset or `*`
/// allows any origin, matching the development default.
fn build_cors_layer_from_env() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .or_else(|_| std::env::var("CORS_ALLOWED_ORIGINS"))
        .ok()
        .map(|origins| origins.trim().to_string())
        .filter(|origins| !origins.is_empty());

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    match allowed_origins {
        None => cors = cors.allow_origin(Any),
        Some(origins) if origins == "*" => cors = cors.allow_origin(Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect();
            cors = cors.allow_origin(origins);
        }
    }

    cors
}
