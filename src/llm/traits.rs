//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Groq / 离线规则 / 脚本）实现 LlmClient：
//! 给定 system 文本、完整对话轮次与能力目录，返回一条助手回复（可能带能力请求）。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::{CapabilityRequest, Turn};
use crate::tools::CapabilitySpec;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// 脚本客户端的预设回复已用完（仅测试）
    #[error("Script exhausted")]
    ScriptExhausted,
}

/// 一次补全请求
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub turns: &'a [Turn],
    pub capabilities: &'a [CapabilitySpec],
    pub temperature: f32,
}

/// 模型返回的助手消息：capability_requests 为空即最终回复
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantReply {
    pub text: String,
    pub capability_requests: Vec<CapabilityRequest>,
}

impl AssistantReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            capability_requests: Vec::new(),
        }
    }

    pub fn calls(requests: Vec<CapabilityRequest>) -> Self {
        Self {
            text: String::new(),
            capability_requests: requests,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<AssistantReply, LlmError>;

    /// 模型标识（日志用）
    fn model_id(&self) -> &str;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
