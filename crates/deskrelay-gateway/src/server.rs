// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use deskrelay_config::model::GatewayConfig;
use deskrelay_coordinator::HandoffCoordinator;
use deskrelay_core::{PluginAdapter, RelayError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Backends whose health checks are reported on `/health`.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub coordinator: Arc<HandoffCoordinator>,
    /// Authentication configuration.
    pub auth: AuthConfig,
    pub health: HealthState,
    /// Domain appended to conversation keys that carry no `@`.
    pub key_domain: Arc<str>,
}

impl GatewayState {
    pub fn new(coordinator: Arc<HandoffCoordinator>, config: &GatewayConfig) -> Self {
        Self {
            coordinator,
            auth: AuthConfig {
                bearer_token: config.bearer_token.clone(),
            },
            health: HealthState {
                start_time: std::time::Instant::now(),
                adapters: Vec::new(),
            },
            key_domain: Arc::from(config.default_key_domain.as_str()),
        }
    }

    /// Report `adapter` on the health endpoint.
    pub fn with_adapter(mut self, adapter: Arc<dyn PluginAdapter>) -> Self {
        self.health.adapters.push(adapter);
        self
    }
}

/// Build the gateway router.
///
/// - GET /health (public)
/// - GET /v1/tenants/{tenant}/coordination/status
/// - POST /v1/tenants/{tenant}/coordination/manage
/// - POST /v1/tenants/{tenant}/coordination/gate
/// - POST /v1/tenants/{tenant}/coordination/events
/// - POST /v1/tenants/{tenant}/messages
/// - GET /v1/tenants/{tenant}/sessions
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/tenants/{tenant}/coordination/status",
            get(handlers::get_coordination_status),
        )
        .route(
            "/v1/tenants/{tenant}/coordination/manage",
            post(handlers::post_manage),
        )
        .route(
            "/v1/tenants/{tenant}/coordination/gate",
            post(handlers::post_gate),
        )
        .route(
            "/v1/tenants/{tenant}/coordination/events",
            post(handlers::post_event),
        )
        .route("/v1/tenants/{tenant}/messages", post(handlers::post_message))
        .route("/v1/tenants/{tenant}/sessions", get(handlers::get_sessions))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind to `host:port` and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &GatewayConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), RelayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RelayError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskrelay_test_utils::CoordinatorHarness;

    #[test]
    fn state_takes_token_and_domain_from_config() {
        let harness = CoordinatorHarness::builder().build();
        let config = GatewayConfig {
            bearer_token: Some("tok".into()),
            default_key_domain: "c.us".into(),
            ..GatewayConfig::default()
        };
        let state = GatewayState::new(harness.coordinator.clone(), &config);
        assert_eq!(state.auth.bearer_token.as_deref(), Some("tok"));
        assert_eq!(&*state.key_domain, "c.us");
        assert!(state.health.adapters.is_empty());
        let _cloned = state.clone();
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let harness = CoordinatorHarness::builder().build();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = GatewayConfig {
            host: "127.0.0.1".into(),
            port: taken.local_addr().unwrap().port(),
            ..GatewayConfig::default()
        };
        let state = GatewayState::new(harness.coordinator.clone(), &config);
        let err = start_server(&config, state, async {}).await.unwrap_err();
        assert!(err.to_string().contains("failed to bind gateway"));
    }
}
