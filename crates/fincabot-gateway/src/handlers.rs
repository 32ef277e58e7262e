// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the gateway routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fincabot_agent::InboundEvent;
use fincabot_core::{ConversationStatus, FincabotError, Priority};
use fincabot_ycloud::{WebhookEvent, WebhookPayload};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::server::AppState;

/// Map pipeline errors onto HTTP statuses for the operator surface.
fn error_response(e: FincabotError) -> Response {
    let status = match &e {
        FincabotError::NotFound(_) => StatusCode::NOT_FOUND,
        FincabotError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

pub async fn get_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// The YCloud webhook.
///
/// Always answers 200 (the provider redelivers on anything else); the actual
/// processing runs detached, guarded by the event deduplicator.
pub async fn post_ycloud_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> impl IntoResponse {
    match event.payload() {
        WebhookPayload::InboundText {
            event_id,
            phone,
            name,
            text,
            wamid,
        } => {
            info!(event_id = %event_id, "inbound message event accepted");
            let agent = state.agent.clone();
            tokio::spawn(async move {
                let inbound = InboundEvent {
                    event_id,
                    phone,
                    name,
                    text,
                    wamid,
                };
                if let Err(e) = agent.handle_inbound_event(inbound).await {
                    error!(error = %e, "inbound event processing failed");
                }
            });
        }
        WebhookPayload::BusinessOutbound { phone } => {
            let agent = state.agent.clone();
            tokio::spawn(async move {
                if let Err(e) = agent.mark_human_outbound(&phone).await {
                    error!(error = %e, "outbound escalation failed");
                }
            });
        }
        WebhookPayload::Ignored => {}
    }
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ConversationStatus>,
    pub priority: Option<Priority>,
    pub limit: Option<i64>,
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    match state
        .inbox
        .list_conversations(query.status, query.priority, query.limit)
        .await
    {
        Ok(conversations) => Json(conversations).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Response {
    match state.inbox.recent_messages(&id, query.limit).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ConversationStatus,
}

pub async fn put_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Response {
    match state.inbox.set_status(&id, body.status).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct PriorityBody {
    pub priority: Priority,
}

pub async fn put_priority(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PriorityBody>,
) -> Response {
    match state.inbox.set_priority(&id, body.priority).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ManualMessageBody {
    pub text: String,
}

pub async fn post_manual_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ManualMessageBody>,
) -> Response {
    match state.inbox.send_manual_text(&id, &body.text).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => error_response(e),
    }
}
