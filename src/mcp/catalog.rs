//! 工具目录来源：每次请求重新拉取，或首次成功后缓存

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::ChatError;
use crate::mcp::{ToolDescriptor, ToolService};

pub struct CatalogSource {
    service: Arc<dyn ToolService>,
    refresh: bool,
    cached: RwLock<Option<Arc<Vec<ToolDescriptor>>>>,
}

impl CatalogSource {
    /// refresh 为 true 时每次 fetch 都访问工具服务
    pub fn new(service: Arc<dyn ToolService>, refresh: bool) -> Self {
        Self {
            service,
            refresh,
            cached: RwLock::new(None),
        }
    }

    pub async fn fetch(&self) -> Result<Arc<Vec<ToolDescriptor>>, ChatError> {
        if !self.refresh {
            if let Some(tools) = self.cached.read().await.as_ref() {
                return Ok(Arc::clone(tools));
            }
        }

        let tools = Arc::new(self.service.list_tools().await?);
        tracing::debug!(count = tools.len(), "tool catalog fetched");
        if !self.refresh {
            *self.cached.write().await = Some(Arc::clone(&tools));
        }
        Ok(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::CallToolResponse;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl ToolService for Counting {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ToolDescriptor {
                name: "sql:listEmployees".into(),
                description: String::new(),
                input_schema: serde_json::json!({"type": "object"}),
            }])
        }

        async fn call_tool(
            &self,
            _name: &str,
            _arguments: &Map<String, Value>,
        ) -> Result<CallToolResponse, ChatError> {
            Ok(CallToolResponse::default())
        }
    }

    #[tokio::test]
    async fn test_refresh_fetches_every_time() {
        let service = Arc::new(Counting::default());
        let source = CatalogSource::new(service.clone(), true);
        source.fetch().await.unwrap();
        source.fetch().await.unwrap();
        assert_eq!(service.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_fetches_once() {
        let service = Arc::new(Counting::default());
        let source = CatalogSource::new(service.clone(), false);
        source.fetch().await.unwrap();
        let tools = source.fetch().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(service.0.load(Ordering::SeqCst), 1);
    }
}
