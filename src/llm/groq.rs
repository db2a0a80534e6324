//! Groq API 客户端（OpenAI 兼容格式）
//!
//! Groq 提供与 OpenAI 兼容的 chat completions 接口（含 tools / tool_calls）。
//! - Base URL: https://api.groq.com/openai/v1
//! - 默认模型: llama-3.3-70b-versatile

use crate::llm::OpenAiClient;

/// Groq API 常量
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_LLAMA_70B: &str = "llama-3.3-70b-versatile";

/// 创建 Groq 客户端
///
/// - 使用环境变量 `GROQ_API_KEY`
/// - 模型可通过 `model` 参数或 `GROQ_MODEL` 环境变量指定，缺省为 llama-3.3-70b-versatile
pub fn create_groq_client(model: Option<&str>, timeout_secs: u64) -> OpenAiClient {
    let api_key = std::env::var("GROQ_API_KEY").unwrap_or_else(|_| "gsk-placeholder".to_string());

    let model = model
        .map(String::from)
        .or_else(|| std::env::var("GROQ_MODEL").ok())
        .unwrap_or_else(|| GROQ_LLAMA_70B.to_string());

    OpenAiClient::new(Some(GROQ_BASE_URL), &model, Some(api_key.as_str())).with_timeout(timeout_secs)
}
