//! 最终回复后处理
//!
//! 依次尝试（先命中者生效）：
//! 1. 含 ```json 代码块：原样返回块内文本
//! 2. 整段文本可解析为 JSON：返回其紧凑序列化
//! 3. 原样返回

use std::sync::OnceLock;

use regex::Regex;

fn fenced_json() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```json\r?\n(.*?)\r?\n```").expect("fenced json pattern is valid")
    })
}

/// 从模型最终回复中剥离对话式包装，使工具返回的结构化数据原样透传
pub fn normalize(raw: &str) -> String {
    if let Some(inner) = fenced_json().captures(raw).and_then(|c| c.get(1)) {
        return inner.as_str().to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        return value.to_string();
    }

    raw.to_string()
}
