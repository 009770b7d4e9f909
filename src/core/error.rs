//! 错误类型
//!
//! ToolInvocationFailed 在编排循环内被吸收为失败的工具结果；CatalogUnavailable / ModelUnavailable
//! 对当前请求致命，由 HTTP 层转为服务端错误。达到最大轮数不是错误（见 TerminationReason）。

use thiserror::Error;

/// 编排与工具服务运行中可能出现的错误
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Tool catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Tool invocation failed ({tool}): {message}")]
    ToolInvocationFailed { tool: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl ChatError {
    /// 面向用户的简短诊断，不包含后端细节（完整信息只写日志）
    pub fn public_message(&self) -> &'static str {
        match self {
            ChatError::CatalogUnavailable(_) => "tool service unavailable",
            ChatError::ModelUnavailable(_) => "language model unavailable",
            ChatError::ToolInvocationFailed { .. } => "tool invocation failed",
            ChatError::MalformedResponse(_) => "malformed upstream response",
            ChatError::InvalidRequest(_) => "invalid request",
            ChatError::Config(_) => "server misconfigured",
            ChatError::Database(_) => "database error",
        }
    }
}

impl From<rusqlite::Error> for ChatError {
    fn from(e: rusqlite::Error) -> Self {
        ChatError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_hides_detail() {
        let err = ChatError::ModelUnavailable("401 invalid api key sk-123".to_string());
        assert_eq!(err.public_message(), "language model unavailable");
        assert!(err.to_string().contains("sk-123"));
    }
}
