//! DeepSeek API 预设（OpenAI 兼容格式，支持 function calling）
//!
//! - Base URL: https://api.deepseek.com
//! - 模型: deepseek-chat（deepseek-reasoner 不支持工具调用，不作为默认）

use std::time::Duration;

use crate::core::ChatError;
use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 创建 DeepSeek 客户端；`model` 缺省为 `deepseek-chat`
pub fn create_deepseek_client(
    api_key: &str,
    model: Option<&str>,
    system_prompt: &str,
    timeout: Duration,
) -> Result<OpenAiClient, ChatError> {
    OpenAiClient::new(
        Some(DEEPSEEK_BASE_URL),
        model.unwrap_or(DEEPSEEK_CHAT),
        Some(api_key),
        system_prompt,
        timeout,
    )
}
