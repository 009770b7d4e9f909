//! SQL Chat 聊天后端
//!
//! 启动: cargo run --bin sqlchat-web
//! 依赖工具执行服务（默认 http://localhost:3002，见 [mcp] base_url）

#![cfg(feature = "web")]

use std::sync::Arc;

use anyhow::Context;

use sqlchat::config::load_config;
use sqlchat::core::{Orchestrator, ShutdownManager};
use sqlchat::llm::create_model_from_config;
use sqlchat::mcp::{McpClient, ToolService};
use sqlchat::server::chat::{router, ChatState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlchat::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        Default::default()
    });

    let model = create_model_from_config(&cfg).context("cannot create language model client")?;
    let tools: Arc<dyn ToolService> =
        Arc::new(McpClient::from_config(&cfg.mcp).context("cannot create tool service client")?);
    let orchestrator = Orchestrator::new(
        model,
        Arc::clone(&tools),
        cfg.orchestrator.to_orchestrator_config(),
    );

    let state = Arc::new(ChatState {
        orchestrator,
        tools: Arc::clone(&tools),
    });
    let app = router(Arc::clone(&state));

    if state.tools.ping().await {
        tracing::info!("Tool service reachable at {}", cfg.mcp.base_url);
    } else {
        tracing::warn!("Tool service not reachable at {} (requests will fail until it is up)", cfg.mcp.base_url);
    }

    let addr = format!("{}:{}", cfg.web.host, cfg.web.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    tracing::info!(
        "SQL Chat API on http://{} (model: {})",
        addr,
        state.orchestrator.model_name()
    );

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.signal())
        .await?;

    tracing::info!("SQL Chat API stopped");
    Ok(())
}
