//! 可观测性：tracing 订阅器初始化
//!
//! 过滤规则取 RUST_LOG，未设置或无法解析时使用 `info`（工具审计日志与编排日志均在 info 级别）。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 默认过滤指令
pub const DEFAULT_DIRECTIVE: &str = "info";

pub fn init() {
    init_with_default(DEFAULT_DIRECTIVE);
}

/// 以指定的默认指令初始化；重复初始化（如测试中多次调用）时静默忽略
pub fn init_with_default(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
