//! 工具执行服务的 HTTP 路由
//!
//! GET /tools 返回目录；POST /call-tool 执行工具。未知工具、参数校验失败与超时返回 500，
//! 响应体仍带 content（`Error: ...`），客户端据 error 字段判定失败。

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::core::ChatError;
use crate::mcp::{CallToolRequest, CallToolResponse, ToolCatalog};
use crate::tools::ToolExecutor;

type ToolError = (StatusCode, Json<CallToolResponse>);

pub fn router(executor: Arc<ToolExecutor>) -> Router {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/call-tool", post(call_tool))
        .with_state(executor)
}

async fn list_tools(State(executor): State<Arc<ToolExecutor>>) -> Json<ToolCatalog> {
    Json(ToolCatalog {
        tools: executor.descriptors(),
    })
}

async fn call_tool(
    State(executor): State<Arc<ToolExecutor>>,
    payload: Result<Json<CallToolRequest>, JsonRejection>,
) -> Result<Json<CallToolResponse>, ToolError> {
    let Json(req) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(CallToolResponse::failure(rejection.body_text())),
        )
    })?;

    tracing::info!(tool = %req.name, "call-tool");
    match executor.execute(&req.name, Value::Object(req.arguments)).await {
        Ok(text) => Ok(Json(CallToolResponse::text(text))),
        Err(e) => {
            tracing::warn!("tool {} failed: {}", req.name, e);
            let message = match e {
                ChatError::ToolInvocationFailed { message, .. } => message,
                other => other.to_string(),
            };
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CallToolResponse::failure(message)),
            ))
        }
    }
}
