//! 工具调用器：把 ToolService 的任意失败归一为 ToolOutcome::Failure，保证编排循环总能继续

use crate::conversation::{ToolInvocationRequest, ToolInvocationResult, ToolOutcome};
use crate::mcp::ToolService;

/// 执行一次远程调用（不重试），结果总是已解析
pub async fn invoke(service: &dyn ToolService, request: &ToolInvocationRequest) -> ToolInvocationResult {
    let outcome = match service.call_tool(&request.tool_name, &request.arguments).await {
        Ok(response) => ToolOutcome::Success(response.joined_text()),
        Err(e) => {
            tracing::warn!(tool = %request.tool_name, "tool call failed: {}", e);
            ToolOutcome::Failure(e.to_string())
        }
    };
    ToolInvocationResult {
        call_id: request.call_id.clone(),
        tool_name: request.tool_name.clone(),
        outcome,
    }
}
