//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；支持 Groq、OpenAI、自建代理等。
//! 请求与响应使用自带的 serde 结构（byot），只取用到的字段：消息、tools、tool_calls、usage。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::Client;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::{AssistantReply, CompletionRequest, LlmClient, LlmError};
use crate::memory::{CapabilityRequest, Turn};
use crate::tools::CapabilitySpec;

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// OpenAI 兼容客户端：持有 Client、model 名与请求超时
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new()
                .with_api_base(url)
                .with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            timeout: Duration::from_secs(60),
            usage: TokenUsage::new(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs.max(1));
        self
    }

    fn build_request(&self, request: &CompletionRequest<'_>) -> Value {
        let mut messages = vec![json!({ "role": "system", "content": request.system })];
        messages.extend(request.turns.iter().map(turn_to_message));

        let mut body = json!({
            "model": self.model,
            "temperature": request.temperature,
            "messages": messages,
        });
        if !request.capabilities.is_empty() {
            body["tools"] = Value::Array(request.capabilities.iter().map(spec_to_tool).collect());
            body["tool_choice"] = json!("auto");
        }
        body
    }
}

fn turn_to_message(turn: &Turn) -> Value {
    match turn {
        Turn::Human { text } => json!({ "role": "user", "content": text }),
        Turn::Assistant {
            text,
            capability_requests,
        } => {
            if capability_requests.is_empty() {
                return json!({ "role": "assistant", "content": text });
            }
            let tool_calls: Vec<Value> = capability_requests
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "type": "function",
                        "function": {
                            "name": r.capability_name,
                            "arguments": r.arguments.to_string(),
                        }
                    })
                })
                .collect();
            let content = if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.clone())
            };
            json!({ "role": "assistant", "content": content, "tool_calls": tool_calls })
        }
        Turn::CapabilityResult {
            request_id, text, ..
        } => json!({ "role": "tool", "tool_call_id": request_id, "content": text }),
    }
}

fn spec_to_tool(spec: &CapabilitySpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": spec.description,
            "parameters": spec.parameters,
        }
    })
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    #[serde(default)]
    id: String,
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// arguments 是 JSON 字符串；解析失败时原样保留，由能力层报告「参数无效」
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn into_reply(response: ChatResponse) -> Result<AssistantReply, LlmError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| LlmError::InvalidResponse("no choices".to_string()))?;

    let capability_requests = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| CapabilityRequest::new(tc.id, tc.function.name, parse_arguments(&tc.function.arguments)))
        .collect();

    Ok(AssistantReply {
        text: message.content.unwrap_or_default(),
        capability_requests,
    })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<AssistantReply, LlmError> {
        let body = self.build_request(&request);

        let response: ChatResponse =
            tokio::time::timeout(self.timeout, self.client.chat().create_byot(body))
                .await
                .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))?
                .map_err(|e| LlmError::Api(e.to_string()))?;

        // 提取 token 使用统计
        if let Some(usage) = &response.usage {
            self.usage.add(usage.prompt_tokens, usage.completion_tokens);
        }

        into_reply(response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }
}
