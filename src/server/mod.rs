//! HTTP 面：聊天 API（web）与工具执行服务（tool-server）

#[cfg(feature = "web")]
pub mod chat;
#[cfg(feature = "tool-server")]
pub mod tool_service;
