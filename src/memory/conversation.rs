//! 对话状态：按时间顺序追加的轮次（用户 / 助手 / 能力结果）与订单记账
//!
//! 追加顺序即时间顺序，这是系统唯一的顺序保证；历史只追加、不剪枝。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 助手请求调用的一项能力；id 在所属轮次内唯一
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    pub id: String,
    pub capability_name: String,
    pub arguments: serde_json::Value,
}

impl CapabilityRequest {
    pub fn new(
        id: impl Into<String>,
        capability_name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            capability_name: capability_name.into(),
            arguments,
        }
    }
}

/// 对话中的一轮
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    Human {
        text: String,
    },
    /// capability_requests 非空表示「继续循环」，为空表示最终回复
    Assistant {
        text: String,
        capability_requests: Vec<CapabilityRequest>,
    },
    CapabilityResult {
        request_id: String,
        capability_name: String,
        text: String,
    },
}

impl Turn {
    pub fn human(text: impl Into<String>) -> Self {
        Self::Human { text: text.into() }
    }

    /// 不带能力请求的助手回复
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            text: text.into(),
            capability_requests: Vec::new(),
        }
    }

    pub fn capability_result(request: &CapabilityRequest, text: impl Into<String>) -> Self {
        Self::CapabilityResult {
            request_id: request.id.clone(),
            capability_name: request.capability_name.clone(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Human { text } | Self::Assistant { text, .. } | Self::CapabilityResult { text, .. } => {
                text
            }
        }
    }

    pub fn capability_requests(&self) -> &[CapabilityRequest] {
        match self {
            Self::Assistant {
                capability_requests,
                ..
            } => capability_requests,
            _ => &[],
        }
    }

    pub fn is_capability_result(&self) -> bool {
        matches!(self, Self::CapabilityResult { .. })
    }
}

/// 一次下单产生的结构化订单行（由 add_to_order 与文本一起返回）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_name: String,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// 单个线程的对话状态
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: String,
    turns: Vec<Turn>,
    pub order_items: Vec<String>,
    pub total_cost: Decimal,
}

impl ConversationState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            turns: Vec::new(),
            order_items: Vec::new(),
            total_cost: Decimal::ZERO,
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// 记入订单行并累加总价
    pub fn record_order(&mut self, line: &OrderLine) {
        self.order_items
            .push(format!("{}x {}", line.quantity, line.item_name));
        self.total_cost += line.subtotal;
    }

    /// 当前订单摘要（拼入 system prompt）；订单为空时返回空字符串
    pub fn order_section(&self) -> String {
        if self.order_items.is_empty() {
            return String::new();
        }
        let mut s = String::from("## Pedido atual\n");
        for item in &self.order_items {
            s.push_str(&format!("- {}\n", item));
        }
        s.push_str(&format!("Total: R$ {:.2}\n", self.total_cost));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_append_in_order() {
        let mut state = ConversationState::new("t1");
        state.push(Turn::human("oi"));
        state.push(Turn::assistant("Olá!"));
        assert_eq!(state.len(), 2);
        assert_eq!(state.turns()[0].text(), "oi");
        assert!(state.turns()[1].capability_requests().is_empty());
    }

    #[test]
    fn test_capability_result_copies_request_identity() {
        let req = CapabilityRequest::new("call_1", "lookup_price", serde_json::json!({"item_name": "calabresa"}));
        let turn = Turn::capability_result(&req, "R$ 40.00");
        match turn {
            Turn::CapabilityResult {
                request_id,
                capability_name,
                ..
            } => {
                assert_eq!(request_id, "call_1");
                assert_eq!(capability_name, "lookup_price");
            }
            _ => panic!("Expected CapabilityResult"),
        }
    }

    #[test]
    fn test_record_order_accumulates_total() {
        let mut state = ConversationState::new("t1");
        assert!(state.order_section().is_empty());

        state.record_order(&OrderLine {
            item_name: "Mussarela".to_string(),
            quantity: 2,
            subtotal: Decimal::new(7000, 2),
        });
        state.record_order(&OrderLine {
            item_name: "Calabresa".to_string(),
            quantity: 1,
            subtotal: Decimal::new(4000, 2),
        });

        assert_eq!(state.order_items, vec!["2x Mussarela", "1x Calabresa"]);
        assert_eq!(state.total_cost, Decimal::new(11000, 2));
        assert!(state.order_section().contains("Total: R$ 110.00"));
    }

    #[test]
    fn test_turn_serializes_with_kind_tag() {
        let json = serde_json::to_value(Turn::human("oi")).unwrap();
        assert_eq!(json["kind"], "human");
    }
}
