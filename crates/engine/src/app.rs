//! Application state and composition.

use storypulse_protocol::ModelRequestAdapter;

use crate::config::EngineConfig;
use crate::infrastructure::upstream::UpstreamClient;

/// Main application state.
///
/// Holds the resolved configuration, the request adapter, and the
/// upstream client. Passed to HTTP handlers via Axum state; everything in
/// here is read-only after startup, so concurrent requests share it
/// without synchronization.
pub struct App {
    pub config: EngineConfig,
    pub adapter: ModelRequestAdapter,
    pub upstream: UpstreamClient,
}

impl App {
    pub fn new(config: EngineConfig) -> Self {
        let upstream = UpstreamClient::new(
            &config.upstream_url,
            config.flavor,
            config.upstream_api_key.clone(),
        );
        Self {
            config,
            adapter: ModelRequestAdapter::default(),
            upstream,
        }
    }
}
