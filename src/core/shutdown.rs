//! 优雅关闭
//!
//! 监听 Ctrl+C / SIGTERM，触发后 HTTP 服务停止接收新连接，已在处理的请求跑完后退出。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// 关闭原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl+C
    UserInitiated,
    /// SIGTERM 信号
    Signal,
}

/// 关闭信号管理器
#[derive(Clone, Default)]
pub struct ShutdownManager {
    token: CancellationToken,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown(&self, reason: ShutdownReason) {
        tracing::info!(?reason, "initiating graceful shutdown");
        self.token.cancel();
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }

    /// 安装系统信号处理器 (Ctrl+C, SIGTERM)
    pub fn install_signal_handlers(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                tracing::info!("Received Ctrl+C");
                manager.shutdown(ShutdownReason::UserInitiated);
            }
        });

        #[cfg(unix)]
        {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                    sigterm.recv().await;
                    tracing::info!("Received SIGTERM");
                    manager.shutdown(ShutdownReason::Signal);
                }
            });
        }
    }

    /// 供 `axum::serve(..).with_graceful_shutdown(..)` 使用的关闭 future
    pub fn signal(self: &Arc<Self>) -> impl std::future::Future<Output = ()> + Send + 'static {
        let manager = Arc::clone(self);
        async move { manager.wait_for_shutdown().await }
    }
}
