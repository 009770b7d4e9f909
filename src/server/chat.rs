//! 聊天 API
//!
//! - POST /api/chat：`{ message, history }` -> `{ response, iterations }`
//! - GET /api/health：`{ status, mcpConnected, aiModel }`，从不报错
//!
//! 失败时返回 `{ error, details? }`；details 只含简短诊断，完整错误写日志。

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationTurn, Role, TurnContent};
use crate::core::Orchestrator;
use crate::mcp::ToolService;

/// 请求间共享的只读状态
pub struct ChatState {
    pub orchestrator: Orchestrator,
    /// 健康检查探测用（与编排器持有同一个工具服务）
    pub tools: Arc<dyn ToolService>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

/// 调用方携带的先前一轮（仅文本）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

impl From<HistoryTurn> for ConversationTurn {
    fn from(turn: HistoryTurn) -> Self {
        ConversationTurn {
            role: turn.role,
            content: TurnContent::Text(turn.content),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub iterations: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub mcp_connected: bool,
    pub ai_model: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: &str, details: Option<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            details,
        }),
    )
}

pub fn router(state: Arc<ChatState>) -> Router {
    Router::new()
        .route("/api/chat", post(api_chat))
        .route("/api/health", get(api_health))
        .with_state(state)
}

async fn api_chat(
    State(state): State<Arc<ChatState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("rejected chat request: {}", rejection.body_text());
        api_error(
            StatusCode::BAD_REQUEST,
            "invalid request body",
            Some(rejection.body_text()),
        )
    })?;

    if req.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message is required", None));
    }

    let history: Vec<ConversationTurn> = req.history.into_iter().map(Into::into).collect();
    tracing::info!(history_len = history.len(), "chat request");

    let outcome = state
        .orchestrator
        .run(&req.message, history)
        .await
        .map_err(|e| {
            tracing::error!("chat request failed: {}", e);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to process request",
                Some(e.public_message().to_string()),
            )
        })?;

    tracing::info!(iterations = outcome.rounds_used, reason = ?outcome.reason, "chat request done");
    Ok(Json(ChatResponse {
        response: outcome.final_text,
        iterations: outcome.rounds_used,
    }))
}

async fn api_health(State(state): State<Arc<ChatState>>) -> Json<HealthResponse> {
    let mcp_connected = state.tools.ping().await;
    if !mcp_connected {
        tracing::warn!("health: tool service unreachable");
    }
    Json(HealthResponse {
        status: "ok".to_string(),
        mcp_connected,
        ai_model: state.orchestrator.model_name().to_string(),
    })
}
