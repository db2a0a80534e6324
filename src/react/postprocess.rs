//! 回复后处理：菜单回显
//!
//! 从最终助手轮次的前一轮开始向前，只看紧邻的那一串能力结果；
//! 其中带菜单标记的结果若未被回复满足，则把该结果全文加在回复前面（空行分隔）。
//! 只改返回给用户的文本，存储的助手轮次保持模型原文。

use crate::core::MenuEchoRule;
use crate::memory::Turn;

/// turns 的最后一个元素须为最终助手轮次
pub fn apply_menu_echo(turns: &[Turn], reply: &str, rule: &MenuEchoRule) -> String {
    let preceding = match turns.split_last() {
        Some((Turn::Assistant { .. }, rest)) => rest,
        _ => return reply.to_string(),
    };

    let menu = preceding
        .iter()
        .rev()
        .take_while(|t| t.is_capability_result())
        .map(Turn::text)
        .find(|text| rule.is_menu(text));

    match menu {
        Some(menu) if !rule.is_satisfied(reply, menu) => {
            tracing::debug!("Reply omitted the menu; echoing it");
            if reply.trim().is_empty() {
                menu.to_string()
            } else {
                format!("{}\n\n{}", menu, reply)
            }
        }
        _ => reply.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CapabilityRequest;
    use serde_json::json;

    const MENU: &str = "🍕 CARDÁPIO 🍕\n\n- Calabresa (R$ 40.00): a\n- Mussarela (R$ 35.00): b";

    fn menu_turns(reply: &str) -> Vec<Turn> {
        let req = CapabilityRequest::new("c1", "list_menu", json!({}));
        vec![
            Turn::human("cardápio"),
            Turn::Assistant {
                text: String::new(),
                capability_requests: vec![req.clone()],
            },
            Turn::capability_result(&req, MENU),
            Turn::assistant(reply),
        ]
    }

    #[test]
    fn test_prepends_menu_when_omitted() {
        let turns = menu_turns("Temos Calabresa!");
        let out = apply_menu_echo(&turns, "Temos Calabresa!", &MenuEchoRule::default());
        assert_eq!(out, format!("{}\n\nTemos Calabresa!", MENU));
    }

    #[test]
    fn test_leaves_reply_that_contains_menu() {
        let reply = format!("Aqui está:\n{}", MENU);
        let turns = menu_turns(&reply);
        assert_eq!(apply_menu_echo(&turns, &reply, &MenuEchoRule::default()), reply);
    }

    #[test]
    fn test_empty_reply_becomes_menu() {
        let turns = menu_turns("");
        assert_eq!(apply_menu_echo(&turns, "", &MenuEchoRule::default()), MENU);
    }

    #[test]
    fn test_ignores_menu_from_earlier_cycle() {
        let mut turns = menu_turns("Temos Calabresa!");
        turns.push(Turn::human("obrigado"));
        turns.push(Turn::assistant("De nada!"));
        assert_eq!(
            apply_menu_echo(&turns, "De nada!", &MenuEchoRule::default()),
            "De nada!"
        );
    }

    #[test]
    fn test_ignores_non_menu_results() {
        let req = CapabilityRequest::new("c1", "lookup_price", json!({"item_name": "x"}));
        let turns = vec![
            Turn::human("preço"),
            Turn::Assistant {
                text: String::new(),
                capability_requests: vec![req.clone()],
            },
            Turn::capability_result(&req, "A pizza de Calabresa custa R$ 40.00"),
            Turn::assistant("Custa 40."),
        ];
        assert_eq!(
            apply_menu_echo(&turns, "Custa 40.", &MenuEchoRule::default()),
            "Custa 40."
        );
    }
}
