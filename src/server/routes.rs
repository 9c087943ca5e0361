//! HTTP route handlers for the chat relay API.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info};
use url::form_urlencoded;

use crate::chat::core::ids::SessionId;

use super::state::AppState;

/// Body returned when no user message was supplied.
pub const MISSING_MESSAGE: &str = "You must provide a user message.";
/// Body returned on any internal failure.
pub const INTERNAL_ERROR: &str = "Internal Server Error";

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", get(chat).post(chat))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "chat-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Query parameters accepted by the chat route.
#[derive(Debug, Default)]
pub struct ChatQuery {
    /// Session to continue; a fresh one is generated when absent.
    pub session_id: Option<String>,
    /// The user's message.
    pub user_msg: Option<String>,
}

impl ChatQuery {
    /// Parse a raw query string. Repeated keys keep their first value and
    /// unknown keys are ignored.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "sessionId" => &mut query.session_id,
                "user_msg" => &mut query.user_msg,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }
}

/// Chat reply body.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    /// The assistant's reply.
    pub resp: String,
}

/// Handle a chat turn sent as `GET` query parameters or a `POST` JSON body.
async fn chat(
    State(state): State<Arc<AppState>>,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> Response {
    info!("processing chat request");
    let query = ChatQuery::parse(raw_query.as_deref());

    let session_id = query
        .session_id
        .filter(|id| !id.is_empty())
        .map_or_else(SessionId::generate, SessionId::from);

    let body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(error = %err, "failed to parse chat request body");
                return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response();
            }
        }
    };

    let Some(user_msg) = user_message(query.user_msg, body.as_ref()) else {
        return (StatusCode::BAD_REQUEST, MISSING_MESSAGE).into_response();
    };

    match state.conversation.respond(&session_id, &user_msg).await {
        Ok(resp) => Json(ChatReply { resp }).into_response(),
        Err(err) => {
            error!(session_id = %session_id, error = %err, "chat request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response()
        }
    }
}

/// Query parameter first, then the `user_msg` string field of a JSON object body.
fn user_message(from_query: Option<String>, body: Option<&serde_json::Value>) -> Option<String> {
    from_query.filter(|msg| !msg.is_empty()).or_else(|| {
        body.and_then(|value| value.get("user_msg"))
            .and_then(serde_json::Value::as_str)
            .filter(|msg| !msg.is_empty())
            .map(str::to_string)
    })
}
