//! 集成测试公用：进程内工具服务（内存 SQLite + 演示数据，监听临时端口）

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use sqlchat::config::ToolsSection;
use sqlchat::mcp::McpClient;
use sqlchat::server::tool_service::router;
use sqlchat::tools::{build_executor, Database, ToolExecutor};

/// 永远连不上的地址
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

pub async fn seeded_executor() -> Arc<ToolExecutor> {
    let db = Database::open_in_memory().unwrap();
    db.seed_demo().await.unwrap();
    Arc::new(build_executor(db, &ToolsSection::default()))
}

/// 启动工具服务，返回 base URL
pub async fn spawn_tool_service() -> String {
    spawn_router(router(seeded_executor().await)).await
}

/// 在临时端口上运行任意路由（模拟异常的工具服务）
pub async fn spawn_router(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn client(base_url: &str) -> McpClient {
    McpClient::new(base_url, Duration::from_secs(5)).unwrap()
}
