//! 循环过程事件：供 CLI 等前端展示决策、能力调用、观察与回复

use serde::Serialize;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// 正在调用模型决策（第几次往返）
    Thinking { round_trip: usize, max: usize },
    /// 调用能力
    CapabilityCall {
        capability: String,
        args: serde_json::Value,
    },
    /// 能力返回（预览，避免过长）
    Observation { capability: String, preview: String },
    /// 最终回复（已经过回显处理）
    Reply { text: String },
    Error { text: String },
}
