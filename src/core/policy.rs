//! Policy：每次决策前置的固定指令，以及循环上限、采样温度、菜单回显规则
//!
//! 启动时构建一次，之后只读，随 Orchestrator 构造传入。

use regex::Regex;

use crate::core::AgentError;
use crate::tools::DEFAULT_MENU_MARKER;

/// 默认往返上限：超过即视为模型陷入循环
pub const DEFAULT_MAX_ROUND_TRIPS: usize = 8;

/// 判定最终回复是否已经展示了菜单
#[derive(Clone, Debug)]
pub enum Anchor {
    /// 回复须原样包含菜单文本
    Verbatim,
    /// 回复匹配该正则（忽略大小写）即视为已展示
    Pattern(Regex),
}

/// 菜单回显规则：marker 标识菜单结果，anchor 判定回复是否已包含菜单
#[derive(Clone, Debug)]
pub struct MenuEchoRule {
    pub marker: String,
    pub anchor: Anchor,
}

impl MenuEchoRule {
    pub fn new(marker: impl Into<String>, anchor_pattern: Option<&str>) -> Result<Self, AgentError> {
        let anchor = match anchor_pattern.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Anchor::Pattern(
                Regex::new(&format!("(?i){}", p))
                    .map_err(|e| AgentError::ConfigError(format!("reply.anchor_pattern: {}", e)))?,
            ),
            None => Anchor::Verbatim,
        };
        Ok(Self {
            marker: marker.into(),
            anchor,
        })
    }

    pub fn is_menu(&self, capability_text: &str) -> bool {
        capability_text.contains(&self.marker)
    }

    pub fn is_satisfied(&self, reply: &str, menu_text: &str) -> bool {
        match &self.anchor {
            Anchor::Verbatim => reply.contains(menu_text.trim()),
            Anchor::Pattern(re) => re.is_match(reply),
        }
    }
}

impl Default for MenuEchoRule {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MENU_MARKER.to_string(),
            anchor: Anchor::Verbatim,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Policy {
    pub instructions: String,
    pub max_round_trips: usize,
    pub temperature: f32,
    pub menu_echo: MenuEchoRule,
}

impl Policy {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
            temperature: 0.0,
            menu_echo: MenuEchoRule::default(),
        }
    }

    pub fn with_max_round_trips(mut self, n: usize) -> Self {
        self.max_round_trips = n.max(1);
        self
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_menu_echo(mut self, rule: MenuEchoRule) -> Self {
        self.menu_echo = rule;
        self
    }

    /// 决策时的 system 文本：固定指令 + 当前订单（非空时）
    pub fn system_text(&self, order_section: &str) -> String {
        if order_section.is_empty() {
            self.instructions.clone()
        } else {
            format!("{}\n\n{}", self.instructions, order_section)
        }
    }
}
