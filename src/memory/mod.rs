//! 记忆层：单线程对话状态与按 thread_id 的线程记忆

pub mod conversation;
pub mod threads;

pub use conversation::{CapabilityRequest, ConversationState, OrderLine, Turn};
pub use threads::{ThreadGuard, ThreadMemory};
