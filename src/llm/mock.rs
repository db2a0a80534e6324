//! 离线 / 测试用 LLM 客户端（无需 API）
//!
//! - MockLlmClient：按关键词把葡语点餐消息映射为能力请求，拿到能力结果后原样转述，
//!   便于本地跑通「查价 / 下单 / 看菜单」流程。
//! - ScriptedLlmClient：按顺序返回预设回复，并记录每次调用收到的上下文（测试断言用）。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::llm::{AssistantReply, CompletionRequest, LlmClient, LlmError};
use crate::memory::{CapabilityRequest, Turn};

const GREETING: &str =
    "Olá! Posso mostrar o cardápio, informar o preço de uma pizza ou anotar o seu pedido.";

/// 提取商品名时忽略的词
const STOP_WORDS: &[&str] = &[
    "a", "o", "as", "os", "de", "da", "do", "uma", "um", "pizza", "pizzas", "quero", "pedir",
    "custa", "quanto", "qual", "preço", "preco", "valor", "adiciona", "adicionar", "por", "favor",
    "me", "vê", "ve", "e",
];

fn new_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn quantity_of(word: &str) -> Option<u32> {
    match word {
        "um" | "uma" => Some(1),
        "dois" | "duas" => Some(2),
        "três" | "tres" => Some(3),
        "quatro" => Some(4),
        "cinco" => Some(5),
        _ => word.parse().ok(),
    }
}

/// 最后一个非停用词、非数量的词，去掉复数 s
fn item_of(words: &[String]) -> Option<String> {
    let word = words
        .iter()
        .rev()
        .find(|w| !STOP_WORDS.contains(&w.as_str()) && w.parse::<u32>().is_err())?;
    let item = match word.strip_suffix('s') {
        Some(singular) if singular.chars().count() > 3 => singular.to_string(),
        _ => word.clone(),
    };
    Some(item)
}

/// 关键词规则客户端：没有 API Key 时的离线后备
#[derive(Debug, Default)]
pub struct MockLlmClient;

impl MockLlmClient {
    fn decide_for_message(message: &str) -> AssistantReply {
        let lower = message.to_lowercase();
        let words = words(&lower);

        if lower.contains("cardápio") || lower.contains("cardapio") || lower.contains("menu") {
            return AssistantReply::calls(vec![CapabilityRequest::new(
                new_call_id(),
                "list_menu",
                json!({}),
            )]);
        }

        let ordering = ["quero", "pedir", "adiciona", "adicionar"]
            .iter()
            .any(|k| words.iter().any(|w| w == k));
        let asking_price = lower.contains("quanto custa")
            || ["preço", "preco", "valor"]
                .iter()
                .any(|k| words.iter().any(|w| w == k));

        if ordering || asking_price {
            let Some(item) = item_of(&words) else {
                return AssistantReply::text("Qual pizza você gostaria?");
            };
            let request = if ordering {
                let quantity = words.iter().find_map(|w| quantity_of(w)).unwrap_or(1);
                CapabilityRequest::new(
                    new_call_id(),
                    "add_to_order",
                    json!({ "item_name": item, "quantity": quantity }),
                )
            } else {
                CapabilityRequest::new(new_call_id(), "lookup_price", json!({ "item_name": item }))
            };
            return AssistantReply::calls(vec![request]);
        }

        AssistantReply::text(GREETING)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<AssistantReply, LlmError> {
        // 末尾是能力结果：把这一批结果原样转述给用户
        let results: Vec<&str> = request
            .turns
            .iter()
            .rev()
            .take_while(|t| t.is_capability_result())
            .map(|t| t.text())
            .collect();
        if !results.is_empty() {
            let text = results.into_iter().rev().collect::<Vec<_>>().join("\n\n");
            return Ok(AssistantReply::text(text));
        }

        match request.turns.last() {
            Some(Turn::Human { text }) => Ok(Self::decide_for_message(text)),
            _ => Ok(AssistantReply::text(GREETING)),
        }
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

/// 测试断言用：一次调用收到的上下文
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub turns: Vec<Turn>,
    pub capability_names: Vec<String>,
    pub temperature: f32,
}

/// 按顺序返回预设结果的客户端；用完后返回 LlmError::ScriptExhausted
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Result<AssistantReply, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlmClient {
    pub fn new(replies: impl IntoIterator<Item = AssistantReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 追加一条预设结果（可以是错误，用于模拟模型调用失败）
    pub fn push(&self, result: Result<AssistantReply, LlmError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<AssistantReply, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                system: request.system.to_string(),
                turns: request.turns.to_vec(),
                capability_names: request.capabilities.iter().map(|c| c.name.clone()).collect(),
                temperature: request.temperature,
            });
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Err(LlmError::ScriptExhausted))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn decide(turns: &[Turn]) -> AssistantReply {
        MockLlmClient
            .complete(CompletionRequest {
                system: "",
                turns,
                capabilities: &[],
                temperature: 0.0,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_mock_price_question() {
        let reply = decide(&[Turn::human("quanto custa a calabresa?")]).await;
        let req = &reply.capability_requests[0];
        assert_eq!(req.capability_name, "lookup_price");
        assert_eq!(req.arguments["item_name"], "calabresa");
    }

    #[tokio::test]
    async fn test_mock_order_with_quantity_and_plural() {
        let reply = decide(&[Turn::human("quero 2 mussarelas")]).await;
        let req = &reply.capability_requests[0];
        assert_eq!(req.capability_name, "add_to_order");
        assert_eq!(req.arguments["item_name"], "mussarela");
        assert_eq!(req.arguments["quantity"], 2);

        let reply = decide(&[Turn::human("quero duas portuguesas")]).await;
        assert_eq!(reply.capability_requests[0].arguments["quantity"], 2);
        assert_eq!(reply.capability_requests[0].arguments["item_name"], "portuguesa");
    }

    #[tokio::test]
    async fn test_mock_menu_request() {
        let reply = decide(&[Turn::human("me mostra o cardápio")]).await;
        assert_eq!(reply.capability_requests[0].capability_name, "list_menu");
    }

    #[tokio::test]
    async fn test_mock_relays_capability_results() {
        let req = CapabilityRequest::new("c1", "lookup_price", json!({"item_name": "calabresa"}));
        let turns = vec![
            Turn::human("quanto custa a calabresa?"),
            Turn::Assistant {
                text: String::new(),
                capability_requests: vec![req.clone()],
            },
            Turn::capability_result(&req, "A pizza de Calabresa custa R$ 40.00"),
        ];
        let reply = decide(&turns).await;
        assert!(reply.capability_requests.is_empty());
        assert_eq!(reply.text, "A pizza de Calabresa custa R$ 40.00");
    }

    #[tokio::test]
    async fn test_mock_greets_otherwise() {
        let reply = decide(&[Turn::human("boa noite")]).await;
        assert_eq!(reply.text, GREETING);
    }

    #[tokio::test]
    async fn test_scripted_replays_then_exhausts() {
        let client = ScriptedLlmClient::new(vec![AssistantReply::text("primeira")]);
        let request = CompletionRequest {
            system: "policy",
            turns: &[],
            capabilities: &[],
            temperature: 0.0,
        };
        assert_eq!(client.complete(request).await.unwrap().text, "primeira");
        assert!(matches!(
            client.complete(request).await,
            Err(LlmError::ScriptExhausted)
        ));
        assert_eq!(client.calls().len(), 2);
        assert_eq!(client.calls()[0].system, "policy");
    }
}
