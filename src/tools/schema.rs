//! 工具参数 JSON Schema 生成（schemars）
//!
//! 参数结构体派生 JsonSchema，既用于目录中的 inputSchema，也用于反序列化时的边界校验。

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 生成参数结构体的 schema；去掉 `$schema` / `title` 等对模型无用的顶层键
pub fn input_schema<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(&schema).unwrap_or_else(|_| {
        serde_json::json!({ "type": "object", "properties": {} })
    });
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.entry("properties").or_insert_with(|| serde_json::json!({}));
    }
    value
}

/// 将模型给出的参数解析为强类型结构体；null 视为空对象
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    let args = if args.is_null() {
        serde_json::json!({})
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| format!("invalid arguments: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    /// 测试参数
    #[allow(dead_code)]
    #[derive(Debug, Deserialize, JsonSchema)]
    struct NameArgs {
        /// 全名
        name: String,
    }

    #[derive(Deserialize, JsonSchema)]
    struct NoArgs {}

    #[test]
    fn test_input_schema_shape() {
        let schema = input_schema::<NameArgs>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"][0], "name");
        assert_eq!(schema["properties"]["name"]["type"], "string");
        assert!(schema.get("$schema").is_none());

        let empty = input_schema::<NoArgs>();
        assert!(empty["properties"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_parse_args() {
        assert!(parse_args::<NameArgs>(serde_json::json!({"name": "Ana"})).is_ok());
        assert!(parse_args::<NameArgs>(serde_json::json!({})).unwrap_err().contains("invalid arguments"));
        assert!(parse_args::<NoArgs>(Value::Null).is_ok());
    }
}
