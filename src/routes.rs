//! HTTP surface: the Twilio webhook and the stateless `/api` endpoint.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::agent::Agent;
use crate::channels::whatsapp::{canonicalize, twiml_reply, TwilioInbound};
use crate::chat::GENERAL_SYSTEM_PROMPT;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::onboarding::prompts::{API_FALLBACK_REPLY, FALLBACK_REPLY};

/// Shared handler state, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub llm: Arc<dyn LlmProvider>,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", post(whatsapp_webhook))
        .route("/api", post(api_chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn twiml_response(body: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "text/xml")],
        twiml_reply(body),
    )
        .into_response()
}

/// POST / — the Twilio WhatsApp webhook. Exactly one TwiML reply per
/// request; store failures surface as HTTP 500 so the transport records
/// the delivery failure instead of a reply claiming success.
async fn whatsapp_webhook(
    State(state): State<AppState>,
    Form(inbound): Form<TwilioInbound>,
) -> Response {
    // Non-text payloads short-circuit before any store access.
    let Some(msg) = canonicalize(&inbound) else {
        return twiml_response(FALLBACK_REPLY);
    };

    match state.agent.handle_message(&msg).await {
        Ok(reply) => twiml_response(&reply),
        Err(e) => {
            error!(error = %e, user = %msg.user_id, "Failed to handle inbound message");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiChatRequest {
    msg: String,
}

/// POST /api — stateless diagnostic chat with the static system prompt.
async fn api_chat(State(state): State<AppState>, Json(request): Json<ApiChatRequest>) -> String {
    let completion = CompletionRequest::new(vec![
        ChatMessage::system(GENERAL_SYSTEM_PROMPT),
        ChatMessage::user(request.msg),
    ]);

    match state.llm.complete(completion).await {
        Ok(response) => response.content,
        Err(e) => {
            error!(error = %e, "API chat completion failed");
            API_FALLBACK_REPLY.to_string()
        }
    }
}
