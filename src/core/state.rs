//! 编排循环的阶段
//!
//! Deciding → Executing → Deciding … → Done；阶段变化同时投影给事件通道（CLI 展示用）。

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    /// 等待模型决策
    Deciding,
    /// 正在执行能力请求
    Executing,
    /// 已得到最终回复
    Done,
}

impl LoopPhase {
    /// 根据助手轮次是否带能力请求决定下一阶段
    pub fn after_decision(has_requests: bool) -> Self {
        if has_requests {
            Self::Executing
        } else {
            Self::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_after_decision() {
        assert_eq!(LoopPhase::after_decision(true), LoopPhase::Executing);
        assert_eq!(LoopPhase::after_decision(false), LoopPhase::Done);
    }
}
