//! SQL Chat - 用自然语言查询关系型数据库
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **conversation**: 对话轮次、工具调用请求与结果、编排结果
//! - **core**: 编排循环、最终回复后处理、错误类型、优雅关闭
//! - **llm**: 模型回合驱动抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **mcp**: 远程工具执行服务客户端、工具目录、工具调用
//! - **observability**: tracing 初始化
//! - **tools**: 工具服务侧的工具实现（员工数据库）与执行器
//! - **server**: 聊天 API 与工具服务的 HTTP 路由（feature: web / tool-server）

pub mod config;
pub mod conversation;
pub mod core;
pub mod llm;
pub mod mcp;
pub mod observability;
#[cfg(any(feature = "web", feature = "tool-server"))]
pub mod server;
pub mod tools;

pub use config::{load_config, AppConfig};
pub use conversation::{ConversationTurn, OrchestrationOutcome, TerminationReason};
pub use core::{ChatError, Orchestrator, OrchestratorConfig};
