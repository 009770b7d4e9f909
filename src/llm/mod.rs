//! LLM 层：模型回合驱动抽象与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod deepseek;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::ChatError;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT};
pub use mock::{MockModelClient, ScriptedModelClient};
pub use openai::{wire_name, OpenAiClient, TokenUsage};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use traits::{ModelClient, TurnInput, TurnResult};

/// 根据配置与环境变量选择模型后端（DeepSeek / OpenAI 兼容 / Mock）
pub fn create_model_from_config(cfg: &AppConfig) -> Result<Arc<dyn ModelClient>, ChatError> {
    create_model_with_env(cfg, |key| std::env::var(key).ok())
}

/// 同 [`create_model_from_config`]，环境变量经 `env` 读取
pub fn create_model_with_env<F>(cfg: &AppConfig, env: F) -> Result<Arc<dyn ModelClient>, ChatError>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = cfg.llm.provider.to_lowercase();
    let system_prompt = cfg.orchestrator.resolve_system_prompt();
    let timeout = Duration::from_secs(cfg.llm.timeouts.request);

    if provider == "mock" {
        tracing::info!("Using Mock LLM");
        return Ok(Arc::new(MockModelClient));
    }

    if provider == "deepseek" {
        let api_key = env("DEEPSEEK_API_KEY").or_else(|| env(cfg.llm.api_key_env.as_str()));
        if let Some(key) = api_key {
            let model = cfg
                .llm
                .deepseek
                .model
                .clone()
                .or_else(|| env("DEEPSEEK_MODEL"))
                .unwrap_or_else(|| DEEPSEEK_CHAT.to_string());
            tracing::info!("Using DeepSeek LLM ({})", model);
            let client = create_deepseek_client(&key, Some(&model), &system_prompt, timeout)?;
            return Ok(Arc::new(client));
        }
        tracing::warn!(
            "DEEPSEEK_API_KEY and {} not set, using Mock LLM",
            cfg.llm.api_key_env
        );
        return Ok(Arc::new(MockModelClient));
    }

    match env(cfg.llm.api_key_env.as_str()) {
        Some(key) => {
            let model = &cfg.llm.openai.model;
            tracing::info!("Using OpenAI-compatible LLM ({})", model);
            let client = OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                model,
                Some(key.as_str()),
                system_prompt,
                timeout,
            )?;
            Ok(Arc::new(client))
        }
        None => {
            tracing::warn!(
                "{} not set or provider unknown, using Mock LLM",
                cfg.llm.api_key_env
            );
            Ok(Arc::new(MockModelClient))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_deepseek_provider_uses_deepseek_model_by_default() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "deepseek".to_string();
        let model = create_model_with_env(&cfg, env_with(&[("DEEPSEEK_API_KEY", "sk-x")])).unwrap();
        assert_eq!(model.model_name(), "deepseek-chat");
    }

    #[test]
    fn test_deepseek_model_from_config_and_env() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "deepseek".to_string();
        let env = env_with(&[("DEEPSEEK_API_KEY", "sk-x"), ("DEEPSEEK_MODEL", "deepseek-v3")]);
        let model = create_model_with_env(&cfg, &env).unwrap();
        assert_eq!(model.model_name(), "deepseek-v3");

        cfg.llm.deepseek.model = Some("deepseek-custom".to_string());
        let model = create_model_with_env(&cfg, &env).unwrap();
        assert_eq!(model.model_name(), "deepseek-custom");
    }

    #[test]
    fn test_openai_provider_uses_openai_model() {
        let cfg = AppConfig::default();
        let model = create_model_with_env(&cfg, env_with(&[("OPENAI_API_KEY", "sk-x")])).unwrap();
        assert_eq!(model.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_missing_key_falls_back_to_mock() {
        let mut cfg = AppConfig::default();
        let mock = MockModelClient.model_name().to_string();
        let model = create_model_with_env(&cfg, |_| None).unwrap();
        assert_eq!(model.model_name(), mock);

        cfg.llm.provider = "deepseek".to_string();
        let model = create_model_with_env(&cfg, |_| None).unwrap();
        assert_eq!(model.model_name(), mock);
    }
}
