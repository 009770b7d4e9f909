//! 工具执行服务接入层：线格式、HTTP 客户端、目录缓存策略、调用结果归一

pub mod catalog;
pub mod client;
pub mod invoker;
pub mod types;

pub use catalog::CatalogSource;
pub use client::{McpClient, ToolService};
pub use invoker::invoke;
pub use types::{CallToolRequest, CallToolResponse, ToolCatalog, ToolContent, ToolDescriptor};
