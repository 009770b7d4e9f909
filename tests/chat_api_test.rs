//! 聊天 API 与工具服务的 HTTP 层测试（tower::ServiceExt::oneshot 驱动）

#![cfg(all(feature = "web", feature = "tool-server"))]

mod common;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use sqlchat::conversation::ToolInvocationRequest;
    use sqlchat::core::{ChatError, Orchestrator, OrchestratorConfig};
    use sqlchat::llm::{MockModelClient, ModelClient, ScriptedModelClient, TurnResult};
    use sqlchat::mcp::ToolService;
    use sqlchat::server::chat::{router, ChatState};

    use crate::common::{client, seeded_executor, spawn_router, spawn_tool_service, UNREACHABLE_URL};

    fn chat_app(model: Arc<dyn ModelClient>, base_url: &str) -> Router {
        let tools: Arc<dyn ToolService> = Arc::new(client(base_url));
        let orchestrator = Orchestrator::new(model, Arc::clone(&tools), OrchestratorConfig::default());
        router(Arc::new(ChatState { orchestrator, tools }))
    }

    fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.into()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_returns_normalized_tool_output() {
        let base_url = spawn_tool_service().await;
        let model = Arc::new(ScriptedModelClient::new(vec![
            TurnResult::ToolCallsRequested(vec![ToolInvocationRequest::new(
                "sql:executeSQL",
                [("query".to_string(), json!("SELECT emp_no FROM employees WHERE emp_no = 10001"))]
                    .into_iter()
                    .collect(),
            )]),
            TurnResult::FinalAnswer("```json\n[{\"emp_no\": 10001}]\n```".to_string()),
        ]));
        let app = chat_app(model.clone(), &base_url);

        let body = json!({
            "message": "who is employee 10001?",
            "history": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "hi, ask me about employees"}
            ]
        });
        let response = app.oneshot(post_json("/api/chat", body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["response"], "[{\"emp_no\": 10001}]");
        assert_eq!(body["iterations"], 2);
        // 先前两轮历史原样传给模型
        assert_eq!(model.history_lens()[0], 2);
    }

    #[tokio::test]
    async fn test_chat_rejects_invalid_requests() {
        let app = chat_app(Arc::new(MockModelClient), UNREACHABLE_URL);

        let cases = [
            json!({"message": "   "}).to_string(),
            json!({"history": []}).to_string(),
            json!({"message": "hi", "history": [{"role": "system", "content": "x"}]}).to_string(),
            "{not json".to_string(),
        ];
        for case in cases {
            let response = app.clone().oneshot(post_json("/api/chat", case.clone())).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case: {}", case);
            let body = json_body(response).await;
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_chat_fatal_error_is_generic() {
        let app = chat_app(Arc::new(MockModelClient), UNREACHABLE_URL);

        let response = app
            .oneshot(post_json("/api/chat", json!({"message": "list employees"}).to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["error"], "failed to process request");
        assert_eq!(body["details"], "tool service unavailable");
    }

    #[tokio::test]
    async fn test_health_reports_tool_service_state() {
        let down = chat_app(Arc::new(MockModelClient), UNREACHABLE_URL);
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = down.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"status": "ok", "mcpConnected": false, "aiModel": "mock"})
        );

        let base_url = spawn_tool_service().await;
        let up = chat_app(Arc::new(MockModelClient), &base_url);
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let body = json_body(up.oneshot(request).await.unwrap()).await;
        assert_eq!(body["mcpConnected"], true);
    }

    #[tokio::test]
    async fn test_broken_catalog_is_unavailable() {
        let failing = Router::new().route(
            "/tools",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let malformed = Router::new().route("/tools", get(|| async { Json(json!({"nope": 1})) }));

        for service in [failing, malformed] {
            let base_url = spawn_router(service).await;

            let err = client(&base_url).list_tools().await.unwrap_err();
            assert!(matches!(err, ChatError::CatalogUnavailable(_)), "{err:?}");

            let app = chat_app(Arc::new(MockModelClient), &base_url);
            let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
            let body = json_body(app.clone().oneshot(request).await.unwrap()).await;
            assert_eq!(body["mcpConnected"], false);

            let response = app
                .oneshot(post_json("/api/chat", json!({"message": "list employees"}).to_string()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(json_body(response).await["details"], "tool service unavailable");
        }
    }

    #[tokio::test]
    async fn test_tool_service_catalog_and_errors() {
        let app = sqlchat::server::tool_service::router(seeded_executor().await);

        let request = Request::builder().uri("/tools").body(Body::empty()).unwrap();
        let catalog = json_body(app.clone().oneshot(request).await.unwrap()).await;
        let names: Vec<&str> = catalog["tools"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names, vec!["sql:listEmployees", "sql:salaryFor", "sql:executeSQL"]);
        assert_eq!(catalog["tools"][1]["inputSchema"]["required"][0], "name");

        let ok = app
            .clone()
            .oneshot(post_json(
                "/call-tool",
                json!({"name": "sql:salaryFor", "arguments": {"name": "Janez Novak"}}).to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body = json_body(ok).await;
        assert_eq!(body["content"][0]["type"], "text");
        assert!(body.get("error").is_none());

        let unknown = app
            .clone()
            .oneshot(post_json("/call-tool", json!({"name": "sql:dropAll", "arguments": {}}).to_string()))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(unknown).await;
        assert_eq!(body["error"], "Unknown tool: sql:dropAll");
        assert_eq!(body["content"][0]["text"], "Error: Unknown tool: sql:dropAll");

        let bad_args = app
            .oneshot(post_json("/call-tool", json!({"name": "sql:salaryFor", "arguments": {}}).to_string()))
            .await
            .unwrap();
        assert_eq!(bad_args.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
