//! SQL Chat 工具执行服务
//!
//! 启动: cargo run --bin sqlchat-tools
//! GET /tools 列出工具，POST /call-tool 调用工具；数据源为 [tools] database_path 指定的 SQLite 文件

#![cfg(feature = "tool-server")]

use std::sync::Arc;

use anyhow::Context;

use sqlchat::config::load_config;
use sqlchat::core::ShutdownManager;
use sqlchat::server::tool_service::router;
use sqlchat::tools::{build_executor, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlchat::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        Default::default()
    });
    let tools_cfg = &cfg.tools;

    let db = Database::open(&tools_cfg.database_path)
        .with_context(|| format!("cannot open database {}", tools_cfg.database_path.display()))?;
    db.init_schema().await.context("cannot create schema")?;
    if tools_cfg.seed_demo {
        let seeded = db.seed_demo().await.context("cannot seed demo data")?;
        if seeded > 0 {
            tracing::info!("Seeded {} demo employees", seeded);
        }
    }

    let executor = Arc::new(build_executor(db, tools_cfg));
    tracing::info!("Tools: {}", executor.tool_names().join(", "));
    let app = router(executor);

    let addr = format!("{}:{}", tools_cfg.host, tools_cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    tracing::info!("Tool service on http://{}", addr);

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.signal())
        .await?;

    tracing::info!("Tool service stopped");
    Ok(())
}
