//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Groq / 离线规则 / 脚本）

pub mod groq;
pub mod mock;
pub mod openai;
pub mod traits;

pub use groq::{create_groq_client, GROQ_BASE_URL, GROQ_LLAMA_70B};
pub use mock::{MockLlmClient, RecordedCall, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{AssistantReply, CompletionRequest, LlmClient, LlmError};
