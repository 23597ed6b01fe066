//! HTTP/WebSocket Handlers

use axum::{
    Json,
    extract::{State, WebSocketUpgrade, ws::{Message as WsMessage, WebSocket}},
    http::StatusCode,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use agent_core::{Agent, Conversation, Message, Role};
use agent_registry::{AgentInfo, LoadError, ModelProviderConfig, ProviderResolver, Selection};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub agents: usize,
}

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub ordinal: usize,
    #[serde(flatten)]
    pub info: AgentInfo,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// `MODEL_PROVIDER` as currently set (or the default)
    pub selected: String,
    pub providers: Vec<ModelProviderConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Ordinal ("1") or id ("basic")
    pub agent: String,
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub agent_id: String,
    pub model: String,
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// Status and code for each load failure kind
pub fn load_error_response(err: &LoadError) -> ApiError {
    let (status, code) = match err {
        LoadError::SelectionInvalid(_) => (StatusCode::NOT_FOUND, "SELECTION_INVALID"),
        LoadError::ProviderResolutionFailed(_) => (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE"),
        LoadError::AgentConstructionFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_CONSTRUCTION_FAILED"),
    };
    api_error(status, code, err.user_message())
}

/// Build the selected agent and seed its conversation.
///
/// Client-supplied system turns are dropped; the agent's own prompt is
/// always the one in effect.
fn prepare(state: &AppState, request: &ChatRequest) -> Result<(Agent, AgentInfo, Conversation), LoadError> {
    let (agent, info) = state.loader.create(&Selection::parse(&request.agent))?;

    let mut conversation = Conversation::from_messages(
        request
            .history
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect(),
    );
    conversation.push(Message::user(&request.message));

    Ok((agent, info, conversation))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        agents: state.loader.registry().len(),
    })
}

/// Agent catalog with 1-based ordinals
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<CatalogEntry>> {
    Json(
        state
            .loader
            .registry()
            .catalog()
            .into_iter()
            .map(|(ordinal, info)| CatalogEntry {
                ordinal,
                info: info.clone(),
            })
            .collect(),
    )
}

/// Known providers and the active selection
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        selected: state.loader.selected_provider(),
        providers: ProviderResolver::known().iter().map(ModelProviderConfig::from).collect(),
    })
}

/// One conversation turn through the full reasoning loop
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (agent, info, mut conversation) = prepare(&state, &payload).map_err(|e| {
        tracing::warn!(agent = %payload.agent, error = %e, "agent load failed");
        load_error_response(&e)
    })?;

    let response = agent.invoke(&mut conversation).await.map_err(|e| {
        tracing::error!(agent = %info.id, error = %e, "agent error");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR", e.user_message())
    })?;

    let conversation_id = payload
        .conversation_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(Json(ChatResponse {
        message: response,
        agent_id: info.id,
        model: agent.model_identifier(),
        conversation_id,
    }))
}

/// WebSocket streaming chat
pub async fn chat_stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

fn error_frame(code: &str, error: &str) -> WsMessage {
    let frame = serde_json::json!({ "type": "error", "code": code, "error": error });
    WsMessage::Text(frame.to_string().into())
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Err(e) => {
                tracing::error!(error = %e, "WebSocket error");
                break;
            }
            _ => continue,
        };

        let request: ChatRequest = match serde_json::from_str(msg.as_str()) {
            Ok(r) => r,
            Err(e) => {
                let _ = sender.send(error_frame("BAD_REQUEST", &e.to_string())).await;
                continue;
            }
        };

        let (agent, info, conversation) = match prepare(&state, &request) {
            Ok(prepared) => prepared,
            Err(e) => {
                let (_, Json(body)) = load_error_response(&e);
                let _ = sender.send(error_frame(&body.code, &body.error)).await;
                continue;
            }
        };

        let start = serde_json::json!({
            "type": "start",
            "agent_id": info.id,
            "model": agent.model_identifier(),
        });
        if sender.send(WsMessage::Text(start.to_string().into())).await.is_err() {
            break;
        }

        match agent.stream(&conversation).await {
            Ok(mut stream) => {
                while let Some(result) = stream.next().await {
                    match result {
                        Ok(chunk) => {
                            let frame = serde_json::json!({
                                "type": "chunk",
                                "content": chunk.delta,
                                "done": chunk.done,
                            });
                            if sender.send(WsMessage::Text(frame.to_string().into())).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = sender.send(error_frame("AGENT_ERROR", &e.user_message())).await;
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(agent = %info.id, error = %e, "stream failed to start");
                let _ = sender.send(error_frame("AGENT_ERROR", &e.user_message())).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_registry::{ResolveError, SelectionError};

    #[test]
    fn test_load_error_status_codes() {
        let (status, Json(body)) =
            load_error_response(&SelectionError::OutOfRange { ordinal: 9, count: 3 }.into());
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "SELECTION_INVALID");

        let (status, Json(body)) = load_error_response(
            &ResolveError::MissingCredential {
                provider: "deepseek".into(),
                env_var: "DEEPSEEK_API_KEY".into(),
            }
            .into(),
        );
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "PROVIDER_UNAVAILABLE");
    }

    #[test]
    fn test_chat_request_defaults() {
        let request: ChatRequest = serde_json::from_str(r#"{"agent":"1","message":"hi"}"#).unwrap();
        assert!(request.history.is_empty());
        assert!(request.conversation_id.is_none());
        assert_eq!(Selection::parse(&request.agent), Selection::Ordinal(1));
    }
}
