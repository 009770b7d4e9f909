//! 编排循环：模型回合 <-> 工具调用
//!
//! 状态：等待模型响应 -> （有工具调用时）执行工具 -> 结果作为下一轮输入 -> ... -> 终止。
//! 轮数按模型调用计：每次调用模型前检查上限，最多 max_rounds 次模型调用；
//! 第 max_rounds 次调用仍请求工具时直接以兜底文案结束，不再执行任何工具。
//! 同一轮的全部工具调用都拿到结果后才进入下一轮；历史只追加，不截断不重排。

use std::sync::Arc;

use futures_util::future::join_all;

use crate::conversation::{
    ConversationTurn, OrchestrationOutcome, TerminationReason, ToolInvocationRequest,
    ToolInvocationResult, ToolOutcome,
};
use crate::core::{normalize, ChatError};
use crate::llm::{ModelClient, TurnInput, TurnResult};
use crate::mcp::{invoke, CatalogSource, ToolService};

/// 默认最大轮数（模型调用次数）
pub const DEFAULT_MAX_ROUNDS: usize = 10;
/// 达到轮数上限时返回给用户的固定文案
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Maximum number of iterations reached.";
/// 日志中工具结果预览最大字符数
const RESULT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_rounds: usize,
    /// true：每次运行都重新拉取工具目录
    pub refresh_catalog: bool,
    /// 同一轮内的工具调用是否并发
    pub parallel_tools: bool,
    pub fallback_message: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            refresh_catalog: true,
            parallel_tools: false,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// 编排器：无跨请求可变状态（目录缓存除外，且仅在 refresh_catalog=false 时启用），可被多个请求并发共享
pub struct Orchestrator {
    model: Arc<dyn ModelClient>,
    tools: Arc<dyn ToolService>,
    catalog: CatalogSource,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ModelClient>,
        tools: Arc<dyn ToolService>,
        config: OrchestratorConfig,
    ) -> Self {
        let catalog = CatalogSource::new(Arc::clone(&tools), config.refresh_catalog);
        Self {
            model,
            tools,
            catalog,
            config,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// 对一条用户消息跑完整编排；history 为调用方携带的先前对话
    pub async fn run(
        &self,
        user_message: &str,
        history: Vec<ConversationTurn>,
    ) -> Result<OrchestrationOutcome, ChatError> {
        let catalog = self.catalog.fetch().await?;
        let mut history = history;
        let mut input = TurnInput::UserMessage(user_message.to_string());
        let mut round = 0;

        loop {
            if round >= self.config.max_rounds {
                return Ok(self.round_limit(round, history));
            }
            round += 1;

            tracing::debug!(round, max_rounds = self.config.max_rounds, "awaiting model response");
            let turn = self.model.next_turn(&history, &catalog, &input).await?;
            history.push(input.to_turn());

            match turn {
                TurnResult::FinalAnswer(text) => {
                    history.push(ConversationTurn::assistant(text.clone()));
                    let (prompt, completion, _) = self.model.token_usage();
                    tracing::info!(
                        round,
                        prompt_tokens = prompt,
                        completion_tokens = completion,
                        "final answer"
                    );
                    return Ok(OrchestrationOutcome {
                        final_text: normalize(&text),
                        rounds_used: round,
                        reason: TerminationReason::FinalAnswer,
                        history,
                    });
                }
                TurnResult::ToolCallsRequested(calls) if calls.is_empty() => {
                    return Err(ChatError::MalformedResponse(
                        "model requested an empty set of tool calls".to_string(),
                    ));
                }
                TurnResult::ToolCallsRequested(calls) => {
                    let names: Vec<&str> = calls.iter().map(|c| c.tool_name.as_str()).collect();
                    tracing::info!(round, tools = ?names, "model requested tools");
                    history.push(ConversationTurn::tool_calls(calls.clone()));

                    if round >= self.config.max_rounds {
                        return Ok(self.round_limit(round, history));
                    }

                    let results = self.execute_round(&calls).await;
                    input = TurnInput::ToolResults(results);
                }
            }
        }
    }

    /// 执行一轮内的全部工具调用；并发与否都按请求顺序返回结果
    async fn execute_round(&self, calls: &[ToolInvocationRequest]) -> Vec<ToolInvocationResult> {
        let results = if self.config.parallel_tools {
            join_all(calls.iter().map(|c| invoke(self.tools.as_ref(), c))).await
        } else {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                results.push(invoke(self.tools.as_ref(), call).await);
            }
            results
        };

        for r in &results {
            match &r.outcome {
                ToolOutcome::Success(text) => tracing::info!(
                    tool = %r.tool_name,
                    preview = %crate::mcp::client::preview(text, RESULT_PREVIEW_CHARS),
                    "tool ok"
                ),
                ToolOutcome::Failure(message) => {
                    tracing::warn!(tool = %r.tool_name, "tool failed: {}", message)
                }
            }
        }
        results
    }

    fn round_limit(&self, round: usize, history: Vec<ConversationTurn>) -> OrchestrationOutcome {
        tracing::warn!(round, "maximum rounds reached, returning fallback message");
        OrchestrationOutcome {
            final_text: self.config.fallback_message.clone(),
            rounds_used: round,
            reason: TerminationReason::RoundLimit,
            history,
        }
    }
}
