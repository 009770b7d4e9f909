//! Mock 模型客户端（用于测试与无 API Key 的本地运行）
//!
//! - MockModelClient：用户消息直接回显；收到工具结果时把首个成功结果包进 ```json 代码块返回
//! - ScriptedModelClient：按脚本依次返回预设回合，并记录每次调用的输入，供编排循环测试断言

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::conversation::{ConversationTurn, ToolOutcome};
use crate::core::ChatError;
use crate::llm::{ModelClient, TurnInput, TurnResult};
use crate::mcp::ToolDescriptor;

/// Mock 客户端：不发起任何网络请求
#[derive(Debug, Default)]
pub struct MockModelClient;

#[async_trait]
impl ModelClient for MockModelClient {
    async fn next_turn(
        &self,
        _history: &[ConversationTurn],
        _catalog: &[ToolDescriptor],
        input: &TurnInput,
    ) -> Result<TurnResult, ChatError> {
        let text = match input {
            TurnInput::UserMessage(text) => format!("Echo from Mock: {}", text),
            TurnInput::ToolResults(results) => results
                .iter()
                .find_map(|r| match &r.outcome {
                    ToolOutcome::Success(text) => Some(format!("```json\n{}\n```", text)),
                    ToolOutcome::Failure(_) => None,
                })
                .unwrap_or_else(|| "All tool calls failed.".to_string()),
        };
        Ok(TurnResult::FinalAnswer(text))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

enum Step {
    Reply(TurnResult),
    Fail(String),
}

/// 脚本化客户端：脚本耗尽后若设置了 repeat 则一直返回该回合，否则返回 ModelUnavailable
pub struct ScriptedModelClient {
    script: Mutex<VecDeque<Step>>,
    repeat: Option<TurnResult>,
    inputs: Mutex<Vec<TurnInput>>,
    history_lens: Mutex<Vec<usize>>,
}

impl ScriptedModelClient {
    pub fn new(replies: impl IntoIterator<Item = TurnResult>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().map(Step::Reply).collect()),
            repeat: None,
            inputs: Mutex::new(Vec::new()),
            history_lens: Mutex::new(Vec::new()),
        }
    }

    /// 永远返回同一回合（模拟不停请求工具的模型）
    pub fn repeating(reply: TurnResult) -> Self {
        let mut client = Self::new(Vec::new());
        client.repeat = Some(reply);
        client
    }

    /// 在脚本末尾追加一次模型失败
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Step::Fail(message.into()));
        }
        self
    }

    /// 已发生的模型调用次数
    pub fn calls(&self) -> usize {
        self.inputs.lock().map(|i| i.len()).unwrap_or(0)
    }

    /// 每次调用收到的输入（按调用顺序）
    pub fn inputs(&self) -> Vec<TurnInput> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// 每次调用时传入的历史长度
    pub fn history_lens(&self) -> Vec<usize> {
        self.history_lens.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn next_turn(
        &self,
        history: &[ConversationTurn],
        _catalog: &[ToolDescriptor],
        input: &TurnInput,
    ) -> Result<TurnResult, ChatError> {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(input.clone());
        }
        if let Ok(mut lens) = self.history_lens.lock() {
            lens.push(history.len());
        }

        let step = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match step {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::Fail(message)) => Err(ChatError::ModelUnavailable(message)),
            None => self
                .repeat
                .clone()
                .ok_or_else(|| ChatError::ModelUnavailable("script exhausted".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ToolInvocationResult;

    #[tokio::test]
    async fn test_mock_wraps_tool_result() {
        let input = TurnInput::ToolResults(vec![ToolInvocationResult {
            call_id: "c".into(),
            tool_name: "sql:listEmployees".into(),
            outcome: ToolOutcome::Success("[1]".into()),
        }]);
        let reply = MockModelClient.next_turn(&[], &[], &input).await.unwrap();
        assert_eq!(reply, TurnResult::FinalAnswer("```json\n[1]\n```".into()));
    }

    #[tokio::test]
    async fn test_scripted_then_fail() {
        let client = ScriptedModelClient::new(vec![TurnResult::FinalAnswer("a".into())]).then_fail("down");
        let input = TurnInput::UserMessage("x".into());
        assert!(client.next_turn(&[], &[], &input).await.is_ok());
        assert!(matches!(
            client.next_turn(&[], &[], &input).await,
            Err(ChatError::ModelUnavailable(_))
        ));
        assert_eq!(client.calls(), 2);
    }
}
