// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the coordination API.
//!
//! Request bodies are validated here and turned into coordinator calls.
//! Only caller mistakes produce an error status; coordinator actions always
//! answer 200 with their own `success` flag.

use std::str::FromStr;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use deskrelay_core::{
    ActionOutcome, Assignment, BotSession, ConversationKey, ConversationMessage, HealthStatus,
    ManageAction, ManageRequest, ManageResponse, MessageDirection, RelayError, RemoteStatus,
    TenantId,
};

use crate::server::GatewayState;

const INTEGRATION_NAME: &str = "chatbot-desk-coordination";

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// An error status plus the message sent in [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidRequest(message) => Self {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Qualify a bare conversation key with `@{domain}`.
pub fn normalize_key(raw: &str, domain: &str) -> Result<ConversationKey, RelayError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RelayError::InvalidRequest(
            "conversation_key is required".into(),
        ));
    }
    if trimmed.contains('@') {
        Ok(ConversationKey(trimmed.to_string()))
    } else {
        Ok(ConversationKey(format!("{trimmed}@{domain}")))
    }
}

fn tenant_id(raw: &str) -> Result<TenantId, RelayError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RelayError::InvalidRequest("tenant is required".into()));
    }
    Ok(TenantId::from(trimmed))
}

fn required_key(raw: Option<&str>, domain: &str) -> Result<ConversationKey, RelayError> {
    normalize_key(raw.unwrap_or_default(), domain)
}

// --- Health ---

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when every adapter is healthy, otherwise "degraded".
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let mut adapters = Vec::with_capacity(state.health.adapters.len());
    for adapter in &state.health.adapters {
        let (status, detail) = match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => ("healthy", None),
            Ok(HealthStatus::Unhealthy(msg)) => ("unhealthy", Some(msg)),
            Err(e) => ("unhealthy", Some(e.to_string())),
        };
        adapters.push(AdapterHealth {
            name: adapter.name().to_string(),
            status: status.to_string(),
            detail,
        });
    }
    let all_healthy = adapters.iter().all(|a| a.status == "healthy");

    Json(HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        adapters,
    })
}

// --- Coordination ---

/// GET /v1/tenants/{tenant}/coordination/status
pub async fn get_coordination_status(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tenant = tenant_id(&tenant)?;
    let policy = state.coordinator.coordination_status(&tenant).await;
    Ok(Json(json!({
        "status": "ok",
        "integration": INTEGRATION_NAME,
        "tenant": tenant.0,
        "coordination": policy,
    })))
}

/// Request body for POST /v1/tenants/{tenant}/coordination/manage.
#[derive(Debug, Deserialize)]
pub struct ManageBody {
    pub action: String,
    #[serde(default)]
    pub conversation_key: Option<String>,
    #[serde(default)]
    pub desk: Option<DeskOptions>,
}

/// Optional remote-side parameters of a manage command.
#[derive(Debug, Default, Deserialize)]
pub struct DeskOptions {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<u64>,
    #[serde(default)]
    pub team_id: Option<u64>,
}

impl ManageBody {
    /// Validate the body into a [`ManageRequest`].
    pub fn into_request(self, key_domain: &str) -> Result<ManageRequest, RelayError> {
        let action = ManageAction::from_str(self.action.trim()).map_err(|_| {
            RelayError::InvalidRequest(format!(
                "Invalid action: {}. Valid actions: transfer_human, resolve_bot, pause_bot, resume_bot",
                self.action
            ))
        })?;
        let conversation_key = required_key(self.conversation_key.as_deref(), key_domain)?;

        let desk = self.desk.unwrap_or_default();
        let desired_remote_status = match desk.status.as_deref() {
            None => None,
            Some(s @ ("open" | "resolved" | "pending")) => Some(RemoteStatus::from(s)),
            Some(other) => {
                return Err(RelayError::InvalidRequest(format!(
                    "invalid desk status: {other}. Valid statuses: open, resolved, pending"
                )));
            }
        };

        Ok(ManageRequest {
            action,
            conversation_key,
            // Zero is the desk's "nobody"; it never triggers an assignment.
            assignment: Assignment {
                agent_id: desk.assignee_id.filter(|id| *id != 0),
                team_id: desk.team_id.filter(|id| *id != 0),
            },
            desired_remote_status,
        })
    }
}

/// POST /v1/tenants/{tenant}/coordination/manage
///
/// A tenant with management disabled still gets a 200, with a
/// `"status": "disabled"` body.
pub async fn post_manage(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
    body: Result<Json<ManageBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let tenant = tenant_id(&tenant)?;
    let Json(body) = body?;
    let request = body.into_request(&state.key_domain)?;

    let response = match state.coordinator.manage(&tenant, &request).await {
        ManageResponse::Completed { action, outcome } => json!({
            "action": action.as_ref(),
            "success": outcome.success,
            "detail": outcome.detail,
        }),
        ManageResponse::Disabled => json!({
            "status": "disabled",
            "error": "manage endpoint is disabled for this tenant",
        }),
    };
    Ok(Json(response))
}

/// Request body for POST /v1/tenants/{tenant}/coordination/gate.
#[derive(Debug, Default, Deserialize)]
pub struct GateBody {
    #[serde(default)]
    pub remote_conversation_id: Option<u64>,
}

/// POST /v1/tenants/{tenant}/coordination/gate
pub async fn post_gate(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
    body: Result<Json<GateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let tenant = tenant_id(&tenant)?;
    let Json(body) = body?;
    let allowed = state
        .coordinator
        .should_bot_process(&tenant, body.remote_conversation_id)
        .await;
    Ok(Json(json!({ "should_bot_process": allowed })))
}

/// Lifecycle events reported by the messaging side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationEvent {
    HumanReply,
    BotCompleted,
    BotReply,
    SessionOpened,
}

/// Request body for POST /v1/tenants/{tenant}/coordination/events.
#[derive(Debug, Deserialize)]
pub struct EventBody {
    pub event: CoordinationEvent,
    #[serde(default)]
    pub conversation_key: Option<String>,
    /// Bot output, required for `bot_reply`.
    #[serde(default)]
    pub text: Option<String>,
}

/// POST /v1/tenants/{tenant}/coordination/events
pub async fn post_event(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
    body: Result<Json<EventBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let tenant = tenant_id(&tenant)?;
    let Json(body) = body?;
    let key = required_key(body.conversation_key.as_deref(), &state.key_domain)?;
    let coordinator = &state.coordinator;

    let response = match body.event {
        CoordinationEvent::HumanReply => {
            let paused = coordinator.on_human_reply(&tenant, &key).await;
            json!({ "event": "human_reply", "paused": paused })
        }
        CoordinationEvent::BotCompleted => {
            let ActionOutcome { success, detail } =
                coordinator.on_bot_completed(&tenant, &key).await;
            json!({ "event": "bot_completed", "success": success, "detail": detail })
        }
        CoordinationEvent::BotReply => {
            let text = body.text.ok_or_else(|| {
                RelayError::InvalidRequest("text is required for bot_reply".into())
            })?;
            let detection = coordinator.detect_transfer(&tenant, &key, &text).await;
            json!({
                "event": "bot_reply",
                "text": detection.text,
                "transferred": detection.transferred,
            })
        }
        CoordinationEvent::SessionOpened => {
            let session = coordinator
                .open_session(&tenant, &key)
                .await
                .ok_or_else(|| ApiError::internal("failed to open bot session"))?;
            json!({ "event": "session_opened", "session": session })
        }
    };
    Ok(Json(response))
}

// --- History and sessions ---

/// Request body for POST /v1/tenants/{tenant}/messages.
#[derive(Debug, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub conversation_key: Option<String>,
    pub direction: MessageDirection,
    pub content: String,
    #[serde(default)]
    pub remote_conversation_id: Option<u64>,
    /// Unix seconds; defaults to now.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// POST /v1/tenants/{tenant}/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
    body: Result<Json<MessageBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let tenant = tenant_id(&tenant)?;
    let Json(body) = body?;
    let key = required_key(body.conversation_key.as_deref(), &state.key_domain)?;

    let message = ConversationMessage {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant.0,
        conversation_key: key.0,
        direction: body.direction,
        content: body.content,
        remote_conversation_id: body.remote_conversation_id,
        message_timestamp: body
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp()),
    };

    state
        .coordinator
        .record_message(&message)
        .await
        .map_err(|e| match e {
            RelayError::InvalidRequest(_) => ApiError::from(e),
            _ => ApiError::internal("failed to record message"),
        })?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": message.id,
            "message_timestamp": message.message_timestamp,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    pub conversation_key: Option<String>,
}

/// Response body for GET /v1/tenants/{tenant}/sessions.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<BotSession>,
}

/// GET /v1/tenants/{tenant}/sessions?conversation_key=...
pub async fn get_sessions(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let tenant = tenant_id(&tenant)?;
    let key = required_key(query.conversation_key.as_deref(), &state.key_domain)?;
    let sessions = state.coordinator.sessions(&tenant, &key).await;
    Ok(Json(SessionListResponse { sessions }))
}
