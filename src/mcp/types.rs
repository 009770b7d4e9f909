//! 工具执行服务的 HTTP 线格式
//!
//! GET /tools 返回 `{ "tools": [...] }`；POST /call-tool 接收 `{ name, arguments }`，
//! 返回 `{ content: [{ type, text? }] }`，失败时附带 `error`。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 可调用工具的描述（名称全局唯一，带命名空间，如 `sql:listEmployees`）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolCatalog {
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// 工具返回的一段内容；只有 type == "text" 的条目会回传给模型
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CallToolResponse {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            content: vec![ToolContent::text(format!("Error: {}", message))],
            error: Some(message),
        }
    }

    /// 按原顺序拼接所有文本条目（换行分隔），非文本条目丢弃
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.kind == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_camel_case() {
        let raw = r#"{"name":"sql:salaryFor","description":"d","inputSchema":{"type":"object","required":["name"]}}"#;
        let d: ToolDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(d.name, "sql:salaryFor");
        assert_eq!(d.input_schema["required"][0], "name");

        let back = serde_json::to_value(&d).unwrap();
        assert!(back.get("inputSchema").is_some());
    }

    #[test]
    fn test_descriptor_missing_schema_defaults_to_object() {
        let d: ToolDescriptor = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(d.input_schema["type"], "object");
    }

    #[test]
    fn test_joined_text_keeps_only_text_entries_in_order() {
        let resp: CallToolResponse = serde_json::from_str(
            r#"{"content":[
                {"type":"text","text":"first"},
                {"type":"image","data":"..."},
                {"type":"text"},
                {"type":"text","text":"second"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(resp.joined_text(), "first\nsecond");
    }
}
