// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use fincabot_agent::inbox::InboxService;
use fincabot_agent::InboundAgent;
use fincabot_core::FincabotError;
use tower_http::cors::CorsLayer;

use crate::handlers;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<InboundAgent>,
    pub inbox: Arc<InboxService>,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/webhooks/ycloud", post(handlers::post_ycloud_webhook))
        .route("/inbox/conversations", get(handlers::list_conversations))
        .route(
            "/inbox/conversations/{id}/messages",
            get(handlers::get_messages).post(handlers::post_manual_message),
        )
        .route(
            "/inbox/conversations/{id}/status",
            put(handlers::put_status),
        )
        .route(
            "/inbox/conversations/{id}/priority",
            put(handlers::put_priority),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the task is cancelled.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), FincabotError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FincabotError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| FincabotError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
