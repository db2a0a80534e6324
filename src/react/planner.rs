//! Planner：决策步
//!
//! 以 Policy 为 system、完整对话为上下文、能力目录为可选工具调用模型，
//! 得到一条助手轮次：无能力请求即最终回复，有则继续循环。不重试，模型失败即致命。

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{AgentError, Policy};
use crate::llm::{CompletionRequest, LlmClient};
use crate::memory::{CapabilityRequest, ConversationState, Turn};
use crate::tools::CapabilitySpec;

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    capabilities: Vec<CapabilitySpec>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, capabilities: Vec<CapabilitySpec>) -> Self {
        Self { llm, capabilities }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    pub fn capabilities(&self) -> &[CapabilitySpec] {
        &self.capabilities
    }

    pub async fn decide(&self, policy: &Policy, state: &ConversationState) -> Result<Turn, AgentError> {
        let system = policy.system_text(&state.order_section());
        let reply = self
            .llm
            .complete(CompletionRequest {
                system: &system,
                turns: state.turns(),
                capabilities: &self.capabilities,
                temperature: policy.temperature,
            })
            .await?;

        Ok(Turn::Assistant {
            text: reply.text,
            capability_requests: normalize_ids(reply.capability_requests),
        })
    }
}

/// 空 id 或同轮重复的 id 换成新生成的 call_<uuid>，保证结果能一一对应
fn normalize_ids(requests: Vec<CapabilityRequest>) -> Vec<CapabilityRequest> {
    let mut seen = HashSet::new();
    requests
        .into_iter()
        .map(|mut r| {
            if r.id.trim().is_empty() || !seen.insert(r.id.clone()) {
                let id = format!("call_{}", uuid::Uuid::new_v4().simple());
                tracing::debug!(old = %r.id, new = %id, "Replaced capability request id");
                seen.insert(id.clone());
                r.id = id;
            }
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{AssistantReply, ScriptedLlmClient};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn spec(name: &str) -> CapabilitySpec {
        CapabilitySpec {
            name: name.to_string(),
            description: String::new(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    #[test]
    fn test_normalize_ids() {
        let ids: Vec<String> = normalize_ids(vec![
            CapabilityRequest::new("a", "list_menu", json!({})),
            CapabilityRequest::new("a", "list_menu", json!({})),
            CapabilityRequest::new("", "list_menu", json!({})),
        ])
        .into_iter()
        .map(|r| r.id)
        .collect();
        assert_eq!(ids[0], "a");
        assert!(ids[1].starts_with("call_"));
        assert!(ids[2].starts_with("call_"));
        assert_ne!(ids[1], ids[2]);
    }

    #[tokio::test]
    async fn test_decide_sends_policy_history_and_catalog() {
        let llm = Arc::new(ScriptedLlmClient::new([AssistantReply::text("Olá!")]));
        let planner = Planner::new(llm.clone(), vec![spec("lookup_price"), spec("list_menu")]);
        let policy = Policy::new("Seja gentil.");

        let mut state = ConversationState::new("t");
        state.push(Turn::human("oi"));
        state.record_order(&crate::memory::OrderLine {
            item_name: "Calabresa".to_string(),
            quantity: 1,
            subtotal: Decimal::new(4000, 2),
        });

        let turn = planner.decide(&policy, &state).await.unwrap();
        assert_eq!(turn, Turn::assistant("Olá!"));

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system.starts_with("Seja gentil."));
        assert!(calls[0].system.contains("1x Calabresa"));
        assert_eq!(calls[0].turns, state.turns().to_vec());
        assert_eq!(calls[0].capability_names, vec!["lookup_price", "list_menu"]);
        assert_eq!(calls[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn test_model_failure_is_fatal() {
        let llm = Arc::new(ScriptedLlmClient::default());
        let planner = Planner::new(llm, Vec::new());
        let err = planner
            .decide(&Policy::new("x"), &ConversationState::new("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::LlmError(_)));
    }

    struct Metered;

    #[async_trait::async_trait]
    impl LlmClient for Metered {
        async fn complete(
            &self,
            _request: CompletionRequest<'_>,
        ) -> Result<AssistantReply, crate::llm::LlmError> {
            Ok(AssistantReply::text("ok"))
        }

        fn model_id(&self) -> &str {
            "metered"
        }

        fn token_usage(&self) -> (u64, u64, u64) {
            (120, 30, 150)
        }
    }

    #[test]
    fn test_token_usage_comes_from_model() {
        let planner = Planner::new(Arc::new(Metered), Vec::new());
        assert_eq!(planner.token_usage(), (120, 30, 150));
        assert_eq!(planner.model_id(), "metered");

        let scripted = Planner::new(Arc::new(ScriptedLlmClient::default()), Vec::new());
        assert_eq!(scripted.token_usage(), (0, 0, 0));
    }
}
