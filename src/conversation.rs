//! 对话数据模型
//!
//! 一次编排运行内创建、运行结束即丢弃；跨请求的多轮记忆由调用方携带 history 传入。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 消息角色（入站 API 仅允许 user / assistant）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// 单轮内容：纯文本、模型请求的工具调用、或回传给模型的工具结果
#[derive(Clone, Debug, PartialEq)]
pub enum TurnContent {
    Text(String),
    ToolCalls(Vec<ToolInvocationRequest>),
    ToolResults(Vec<ToolInvocationResult>),
}

/// 对话中的一轮
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: TurnContent,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn tool_calls(calls: Vec<ToolInvocationRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::ToolCalls(calls),
        }
    }

    pub fn tool_results(results: Vec<ToolInvocationResult>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::ToolResults(results),
        }
    }
}

/// 模型请求的一次工具调用；call_id 由模型后端分配，用于把结果对应回请求
#[derive(Clone, Debug, PartialEq)]
pub struct ToolInvocationRequest {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolInvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            call_id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = call_id.into();
        self
    }
}

/// 工具调用结果：成功文本或失败信息
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutcome {
    Success(String),
    Failure(String),
}

/// 工具调用的最终结果，总是已解析（不会以未处理错误的形式向上冒泡）
#[derive(Clone, Debug, PartialEq)]
pub struct ToolInvocationResult {
    pub call_id: String,
    pub tool_name: String,
    pub outcome: ToolOutcome,
}

impl ToolInvocationResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Failure(_))
    }

    /// 回传给模型的负载：成功为 {"result": text}，失败为 {"error": message}
    pub fn to_payload(&self) -> Value {
        match &self.outcome {
            ToolOutcome::Success(text) => serde_json::json!({ "result": text }),
            ToolOutcome::Failure(message) => serde_json::json!({ "error": message }),
        }
    }
}

/// 编排结束原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationReason {
    /// 模型给出最终回答
    FinalAnswer,
    /// 达到最大轮数，返回固定兜底文案
    RoundLimit,
}

/// 编排结果
#[derive(Clone, Debug)]
pub struct OrchestrationOutcome {
    pub final_text: String,
    pub rounds_used: usize,
    pub reason: TerminationReason,
    /// 本次运行结束时的完整历史（调用方可据此延续多轮对话）
    pub history: Vec<ConversationTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_lowercase() {
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
        assert!(serde_json::from_str::<Role>("\"model\"").is_err());
    }

    #[test]
    fn test_result_payload() {
        let ok = ToolInvocationResult {
            call_id: "c1".into(),
            tool_name: "sql:listEmployees".into(),
            outcome: ToolOutcome::Success("[]".into()),
        };
        assert_eq!(ok.to_payload(), serde_json::json!({ "result": "[]" }));
        assert!(!ok.is_failure());

        let err = ToolInvocationResult {
            outcome: ToolOutcome::Failure("boom".into()),
            ..ok
        };
        assert_eq!(err.to_payload(), serde_json::json!({ "error": "boom" }));
        assert!(err.is_failure());
    }

    #[test]
    fn test_generated_call_ids_are_unique() {
        let a = ToolInvocationRequest::new("t", Map::new());
        let b = ToolInvocationRequest::new("t", Map::new());
        assert_ne!(a.call_id, b.call_id);
        assert!(a.call_id.starts_with("call_"));
    }
}
