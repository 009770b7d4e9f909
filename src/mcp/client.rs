//! 工具执行服务客户端
//!
//! ToolService 抽象「列出工具 / 按名调用工具 / 可达性探测」；McpClient 为基于 reqwest 的 HTTP 实现。
//! 不做重试，单次调用超时由 reqwest Client 施加。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::McpSection;
use crate::core::ChatError;
use crate::mcp::{CallToolRequest, CallToolResponse, ToolCatalog, ToolDescriptor};

/// 工具执行服务 trait：编排循环只依赖此接口，测试中可替换为进程内实现
#[async_trait]
pub trait ToolService: Send + Sync {
    /// 拉取当前可调用的工具列表；不可达或负载异常时返回 CatalogUnavailable
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError>;

    /// 调用一次工具；传输错误、非 2xx、工具侧错误均返回 Err
    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<CallToolResponse, ChatError>;

    /// 服务是否可达（健康检查用，从不报错）
    async fn ping(&self) -> bool {
        self.list_tools().await.is_ok()
    }
}

/// HTTP 客户端：GET {base}/tools，POST {base}/call-tool
pub struct McpClient {
    http: reqwest::Client,
    base_url: String,
}

impl McpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(section: &McpSection) -> Result<Self, ChatError> {
        Self::new(section.base_url.clone(), Duration::from_secs(section.timeout_secs))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ToolService for McpClient {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError> {
        let response = self
            .http
            .get(self.url("tools"))
            .send()
            .await
            .map_err(|e| ChatError::CatalogUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::CatalogUnavailable(format!("HTTP {}", status)));
        }

        let catalog: ToolCatalog = response
            .json()
            .await
            .map_err(|e| ChatError::CatalogUnavailable(format!("malformed catalog: {}", e)))?;
        Ok(catalog.tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<CallToolResponse, ChatError> {
        let failed = |message: String| ChatError::ToolInvocationFailed {
            tool: name.to_string(),
            message,
        };

        let request = CallToolRequest {
            name: name.to_string(),
            arguments: arguments.clone(),
        };
        let response = self
            .http
            .post(self.url("call-tool"))
            .json(&request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;

        if !status.is_success() {
            // 错误负载里的 error 字段比状态码更有信息量
            let detail = serde_json::from_str::<CallToolResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| preview(&body, 200));
            return Err(failed(format!("HTTP {}: {}", status, detail)));
        }

        let parsed: CallToolResponse = serde_json::from_str(&body).map_err(|e| {
            ChatError::MalformedResponse(format!("tool {} returned invalid JSON: {}", name, e))
        })?;
        if let Some(error) = parsed.error {
            return Err(failed(error));
        }
        Ok(parsed)
    }

    async fn ping(&self) -> bool {
        match self.list_tools().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("tool service unavailable: {}", e);
                false
            }
        }
    }
}

pub(crate) fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = McpClient::new("http://localhost:3002/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("tools"), "http://localhost:3002/tools");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("plača", 3), "pla...");
        assert_eq!(preview("ok", 3), "ok");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // 端口 1 上通常没有服务，连接会被立即拒绝
        let client = McpClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        assert!(!client.ping().await);
        assert!(matches!(
            client.list_tools().await,
            Err(ChatError::CatalogUnavailable(_))
        ));
        assert!(matches!(
            client.call_tool("sql:listEmployees", &Map::new()).await,
            Err(ChatError::ToolInvocationFailed { .. })
        ));
    }
}
