//! OpenAI 兼容 API 客户端（原生 function calling）
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）。请求体自行组装为 JSON（byot），
//! 以便精确控制 tool_calls / tool 消息的形态：
//! - 历史中的 ToolCalls 轮 -> assistant 消息 + tool_calls
//! - ToolResults 轮 -> 每个结果一条 tool 消息（按 call_id 对应）
//!
//! 工具名中的 `:` 等字符不被 function calling 接受，发送前映射为 `__`，解析响应时再映射回来。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::Client;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::conversation::{ConversationTurn, Role, ToolInvocationRequest, TurnContent};
use crate::core::ChatError;
use crate::llm::{ModelClient, TurnInput, TurnResult};
use crate::mcp::ToolDescriptor;

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// OpenAI 兼容客户端：持有 Client、model 名与行为指令
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    system_prompt: String,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        api_key: Option<&str>,
        system_prompt: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client: Client::with_config(config).with_http_client(http),
            model: model.to_string(),
            system_prompt: system_prompt.into(),
            usage: TokenUsage::new(),
        })
    }

    /// 组装 chat completions 请求体
    fn build_request(
        &self,
        history: &[ConversationTurn],
        catalog: &[ToolDescriptor],
        input: &TurnInput,
    ) -> Value {
        let mut messages = vec![json!({ "role": "system", "content": self.system_prompt })];
        for turn in history {
            push_turn(&mut messages, turn);
        }
        push_turn(&mut messages, &input.to_turn());

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if !catalog.is_empty() {
            let tools: Vec<Value> = catalog
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": wire_name(&t.name),
                            "description": t.description,
                            "parameters": t.input_schema,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = json!("auto");
        }
        body
    }

    fn record_usage(&self, response: &Value) {
        let usage = &response["usage"];
        let prompt = usage["prompt_tokens"].as_u64().unwrap_or(0);
        let completion = usage["completion_tokens"].as_u64().unwrap_or(0);
        self.usage.add(prompt, completion);
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn next_turn(
        &self,
        history: &[ConversationTurn],
        catalog: &[ToolDescriptor],
        input: &TurnInput,
    ) -> Result<TurnResult, ChatError> {
        let request = self.build_request(history, catalog, input);

        let response: Value = self
            .client
            .chat()
            .create_byot(request)
            .await
            .map_err(|e| ChatError::ModelUnavailable(e.to_string()))?;

        self.record_usage(&response);

        let names: HashMap<String, String> = catalog
            .iter()
            .map(|t| (wire_name(&t.name), t.name.clone()))
            .collect();
        parse_response(&response, &names)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }
}

/// function calling 可接受的名称：`:` -> `__`，其余非 [A-Za-z0-9_-] 字符 -> `_`
pub fn wire_name(name: &str) -> String {
    name.replace(':', "__")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn push_turn(messages: &mut Vec<Value>, turn: &ConversationTurn) {
    match &turn.content {
        TurnContent::Text(text) => {
            messages.push(json!({ "role": role_str(turn.role), "content": text }));
        }
        TurnContent::ToolCalls(calls) => {
            let tool_calls: Vec<Value> = calls
                .iter()
                .map(|c| {
                    json!({
                        "id": c.call_id,
                        "type": "function",
                        "function": {
                            "name": wire_name(&c.tool_name),
                            "arguments": Value::Object(c.arguments.clone()).to_string(),
                        }
                    })
                })
                .collect();
            messages.push(json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": tool_calls,
            }));
        }
        TurnContent::ToolResults(results) => {
            for r in results {
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": r.call_id,
                    "content": r.to_payload().to_string(),
                }));
            }
        }
    }
}

/// 解析首个 choice：有 tool_calls 则为工具调用请求，否则 content 为最终回答
fn parse_response(
    response: &Value,
    names: &HashMap<String, String>,
) -> Result<TurnResult, ChatError> {
    let message = response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| ChatError::MalformedResponse("response has no choices".to_string()))?;

    let tool_calls = message
        .get("tool_calls")
        .and_then(|v| v.as_array())
        .filter(|calls| !calls.is_empty());

    if let Some(calls) = tool_calls {
        let requests = calls
            .iter()
            .map(|call| parse_tool_call(call, names))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(TurnResult::ToolCallsRequested(requests));
    }

    let text = match message.get("content") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => {
            return Err(ChatError::MalformedResponse(format!(
                "unexpected message content: {}",
                other
            )))
        }
    };
    Ok(TurnResult::FinalAnswer(text))
}

fn parse_tool_call(
    call: &Value,
    names: &HashMap<String, String>,
) -> Result<ToolInvocationRequest, ChatError> {
    let function = call
        .get("function")
        .ok_or_else(|| ChatError::MalformedResponse("tool call without function".to_string()))?;
    let wire = function
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ChatError::MalformedResponse("tool call without name".to_string()))?;
    let name = names.get(wire).cloned().unwrap_or_else(|| wire.to_string());

    let arguments = match function.get("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(raw)) if raw.trim().is_empty() => Map::new(),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                return Err(ChatError::MalformedResponse(format!(
                    "arguments for {} are not an object: {}",
                    name, other
                )))
            }
            Err(e) => {
                return Err(ChatError::MalformedResponse(format!(
                    "arguments for {} are not valid JSON: {}",
                    name, e
                )))
            }
        },
        Some(other) => {
            return Err(ChatError::MalformedResponse(format!(
                "arguments for {} have unexpected type: {}",
                name, other
            )))
        }
    };

    let request = ToolInvocationRequest::new(name, arguments);
    Ok(match call.get("id").and_then(|v| v.as_str()) {
        Some(id) if !id.is_empty() => request.with_call_id(id),
        _ => request,
    })
}
