//! 核心编排层：错误、编排循环、回复归一、优雅关闭

pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod shutdown;

pub use error::ChatError;
pub use normalize::normalize;
pub use orchestrator::{
    Orchestrator, OrchestratorConfig, DEFAULT_FALLBACK_MESSAGE, DEFAULT_MAX_ROUNDS,
};
pub use shutdown::{ShutdownManager, ShutdownReason};
