//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SQLCHAT__*` 覆盖（双下划线表示嵌套，如 `SQLCHAT__ORCHESTRATOR__MAX_ROUNDS=4`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::{OrchestratorConfig, DEFAULT_FALLBACK_MESSAGE, DEFAULT_MAX_ROUNDS};
use crate::llm::DEFAULT_SYSTEM_PROMPT;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub orchestrator: OrchestratorSection,
    pub mcp: McpSection,
    pub web: WebSection,
    pub tools: ToolsSection,
}

/// [llm] 段：后端选择、OpenAI 兼容端点与超时；模型名按后端分别配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// openai / deepseek / mock
    pub provider: String,
    /// 仅 openai 后端使用；deepseek 固定走官方端点
    pub base_url: Option<String>,
    /// 从哪个环境变量读取 API Key（deepseek 后端优先读 DEEPSEEK_API_KEY）
    pub api_key_env: String,
    pub openai: LlmOpenAiSection,
    pub deepseek: LlmDeepSeekSection,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            openai: LlmOpenAiSection::default(),
            deepseek: LlmDeepSeekSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

/// [llm.openai]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmOpenAiSection {
    pub model: String,
}

impl Default for LlmOpenAiSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// [llm.deepseek]；model 缺省时依次取环境变量 DEEPSEEK_MODEL、deepseek-chat
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次模型请求超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [orchestrator] 段：轮数上限、行为指令、工具目录刷新策略、轮内并发
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSection {
    pub max_rounds: usize,
    /// 覆盖内置行为指令
    pub system_prompt: Option<String>,
    /// 从文件读取行为指令（优先级低于 system_prompt）
    pub system_prompt_path: Option<PathBuf>,
    /// true：每次请求都重新拉取工具目录；false：首次成功后缓存
    pub refresh_catalog: bool,
    /// 同一轮内的工具调用是否并发执行（结果仍按请求顺序回传）
    pub parallel_tools: bool,
    /// 达到轮数上限时返回给用户的固定文案
    pub fallback_message: String,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            system_prompt: None,
            system_prompt_path: None,
            refresh_catalog: true,
            parallel_tools: false,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl OrchestratorSection {
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_rounds: self.max_rounds,
            refresh_catalog: self.refresh_catalog,
            parallel_tools: self.parallel_tools,
            fallback_message: self.fallback_message.clone(),
        }
    }

    /// 行为指令：system_prompt > system_prompt_path 文件内容 > 内置默认
    pub fn resolve_system_prompt(&self) -> String {
        if let Some(prompt) = self.system_prompt.as_ref().filter(|p| !p.trim().is_empty()) {
            return prompt.clone();
        }
        if let Some(path) = &self.system_prompt_path {
            match std::fs::read_to_string(path) {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => tracing::warn!("System prompt file {} is empty, using default", path.display()),
                Err(e) => tracing::warn!("Cannot read system prompt {}: {}", path.display(), e),
            }
        }
        DEFAULT_SYSTEM_PROMPT.to_string()
    }
}

/// [mcp] 段：工具执行服务地址与单次调用超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct McpSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for McpSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3002".to_string(),
            timeout_secs: 30,
        }
    }
}

/// [web] 段：聊天 API 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSection {
    pub host: String,
    pub port: u16,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// [tools] 段：工具服务的数据库、超时与返回行数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub database_path: PathBuf,
    /// 单次工具调用超时（秒）
    pub tool_timeout_secs: u64,
    /// sql:listEmployees 返回的最大员工数
    pub row_limit: usize,
    /// 数据库为空时写入演示数据
    pub seed_demo: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("employees.db"),
            tool_timeout_secs: 30,
            row_limit: 50,
            seed_demo: true,
            host: "127.0.0.1".to_string(),
            port: 3002,
        }
    }
}

/// 从 config 目录加载配置，环境变量 SQLCHAT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SQLCHAT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SQLCHAT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
