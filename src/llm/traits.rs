//! 模型回合驱动抽象
//!
//! 一次 next_turn 对应一次模型请求/响应：给定历史、工具目录与本轮输入（用户消息或上一轮工具结果），
//! 返回请求的工具调用或最终回答。行为指令由具体实现持有，不来自用户输入。

use async_trait::async_trait;

use crate::conversation::{ConversationTurn, ToolInvocationRequest, ToolInvocationResult};
use crate::core::ChatError;
use crate::mcp::ToolDescriptor;

/// 本轮输入：首轮为用户消息，之后为上一轮全部工具结果
#[derive(Clone, Debug, PartialEq)]
pub enum TurnInput {
    UserMessage(String),
    ToolResults(Vec<ToolInvocationResult>),
}

impl TurnInput {
    /// 本轮输入在历史中的形态
    pub fn to_turn(&self) -> ConversationTurn {
        match self {
            TurnInput::UserMessage(text) => ConversationTurn::user(text.clone()),
            TurnInput::ToolResults(results) => ConversationTurn::tool_results(results.clone()),
        }
    }
}

/// 模型回合结果
#[derive(Clone, Debug, PartialEq)]
pub enum TurnResult {
    ToolCallsRequested(Vec<ToolInvocationRequest>),
    FinalAnswer(String),
}

/// 模型客户端 trait；传输或鉴权失败返回 ModelUnavailable，对本次请求致命
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn next_turn(
        &self,
        history: &[ConversationTurn],
        catalog: &[ToolDescriptor],
        input: &TurnInput,
    ) -> Result<TurnResult, ChatError>;

    /// 当前使用的模型名（健康检查展示）
    fn model_name(&self) -> &str;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
