// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::FromRef,
    middleware as axum_middleware,
    routing::{get, post},
};
use parley_chat::ChatService;
use parley_config::model::{ServerConfig, WidgetConfig};
use parley_core::ParleyError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AdminAuth, require_admin};
use crate::client_ip::TrustedProxies;
use crate::handlers;

/// Path prefix of every route.
pub const API_PREFIX: &str = "/api/v1";

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub widget: Arc<WidgetConfig>,
    /// Process start time for uptime reporting.
    pub started_at: Instant,
    pub trusted_proxies: TrustedProxies,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>, widget: WidgetConfig) -> Self {
        Self {
            chat,
            widget: Arc::new(widget),
            started_at: Instant::now(),
            trusted_proxies: TrustedProxies::default(),
        }
    }

    /// Believe forwarding headers from these peers.
    pub fn with_trusted_proxies(mut self, proxies: impl IntoIterator<Item = IpAddr>) -> Self {
        self.trusted_proxies = TrustedProxies::new(proxies);
        self
    }
}

impl FromRef<AppState> for TrustedProxies {
    fn from_ref(state: &AppState) -> Self {
        state.trusted_proxies.clone()
    }
}

/// Builds the complete router.
///
/// Widget routes are public; everything under `/admin` requires the bearer
/// token held by `auth`.
pub fn router(state: AppState, auth: AdminAuth) -> Router {
    let public_routes = Router::new()
        .route("/chat/send", post(handlers::send_message))
        .route("/chat/messages", get(handlers::list_messages))
        .route("/chat/visitor", post(handlers::update_visitor))
        .route("/chat/rate", post(handlers::rate_conversation))
        .route("/chat/status", get(handlers::chat_status))
        .route("/widget/config", get(handlers::widget_config))
        .route("/health", get(handlers::health));

    let admin_routes = Router::new()
        .route(
            "/admin/conversations",
            get(handlers::admin_list_conversations),
        )
        .route(
            "/admin/conversations/{id}",
            get(handlers::admin_get_conversation),
        )
        .route(
            "/admin/conversations/{id}/reply",
            post(handlers::admin_reply),
        )
        .route(
            "/admin/conversations/{id}/status",
            post(handlers::admin_update_status),
        )
        .route(
            "/admin/conversations/{id}/messages",
            get(handlers::admin_list_messages),
        )
        .route("/admin/stats", get(handlers::admin_stats))
        .route("/admin/unread-count", get(handlers::admin_unread_count))
        .route("/admin/test-ai", post(handlers::admin_test_ai))
        .route(
            "/admin/knowledge/invalidate",
            post(handlers::admin_invalidate_knowledge),
        )
        .route(
            "/admin/knowledge/rebuild",
            post(handlers::admin_rebuild_knowledge),
        )
        .route_layer(axum_middleware::from_fn_with_state(auth, require_admin));

    Router::new()
        .nest(API_PREFIX, public_routes.merge(admin_routes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the configured address and serves until `shutdown` resolves.
pub async fn serve(
    config: &ServerConfig,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ParleyError> {
    let app = router(state, AdminAuth::new(config.admin_token.clone()));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| ParleyError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
