//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，execute(tool_name, args) 在超时内调用 registry.execute，
//! 超时或失败时转为 ChatError::ToolInvocationFailed；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::ChatError;
use crate::mcp::client::preview;
use crate::mcp::ToolDescriptor;
use crate::tools::ToolRegistry;

/// 工具执行器：对每次调用施加超时，并将结果映射为 ChatError
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定工具；超时或工具返回 Err 均为 ToolInvocationFailed；输出 JSON 审计日志
    pub async fn execute(&self, tool_name: &str, args: serde_json::Value) -> Result<String, ChatError> {
        let start = Instant::now();
        let args_preview = preview(&args.to_string(), 200);
        let result = timeout(self.timeout, self.registry.execute(tool_name, args)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(message)) => Err(ChatError::ToolInvocationFailed {
                tool: tool_name.to_string(),
                message,
            }),
            Err(_) => Err(ChatError::ToolInvocationFailed {
                tool: tool_name.to_string(),
                message: format!("timed out after {}s", self.timeout.as_secs()),
            }),
        }
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.registry.descriptors()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Slow;

    #[async_trait]
    impl Tool for Slow {
        fn name(&self) -> &str {
            "test:slow"
        }

        fn description(&self) -> &str {
            "sleeps"
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".into())
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_invocation_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(Slow);
        let executor = ToolExecutor::new(registry, 1);

        match executor.execute("test:slow", Value::Null).await {
            Err(ChatError::ToolInvocationFailed { tool, message }) => {
                assert_eq!(tool, "test:slow");
                assert!(message.contains("timed out"));
            }
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let executor = ToolExecutor::new(ToolRegistry::new(), 1);
        assert!(matches!(
            executor.execute("x", Value::Null).await,
            Err(ChatError::ToolInvocationFailed { .. })
        ));
    }
}
