//! 编排层错误类型
//!
//! 只有「结构性」失败才会成为 AgentError：未知能力名、超出往返上限、模型调用失败、能力执行超时。
//! 「找不到披萨」「数据库出错」这类内容级失败由能力层转成文本交给模型，不会出现在这里。

use thiserror::Error;

use crate::llm::LlmError;
use crate::store::StoreError;

/// 单次对话请求中的致命错误：中止当前请求，线程状态保持请求开始前的样子
#[derive(Error, Debug)]
pub enum AgentError {
    /// 模型请求了能力目录之外的名字
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Round-trip limit exceeded ({0} capability rounds without a final reply)")]
    RoundTripLimitExceeded(usize),

    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),

    #[error("Capability timeout: {0}")]
    CapabilityTimeout(String),

    /// 启动期：能力目录与注册表不一致
    #[error("Capability catalog error: {0}")]
    CatalogError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    ConfigError(String),

    /// 执行任务被中止（如 spawn 的请求任务 panic）
    #[error("Request aborted: {0}")]
    Aborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_human_readable() {
        let err = AgentError::UnknownCapability("order_drink".to_string());
        assert_eq!(err.to_string(), "Unknown capability: order_drink");

        let err = AgentError::RoundTripLimitExceeded(8);
        assert!(err.to_string().contains('8'));
    }

    #[test]
    fn test_llm_error_converts() {
        let err: AgentError = LlmError::Api("rate limited".to_string()).into();
        assert!(matches!(err, AgentError::LlmError(_)));
        assert_eq!(err.to_string(), "LLM error: API error: rate limited");
    }
}
