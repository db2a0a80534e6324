//! 核心编排层：错误、Policy、循环阶段、请求周期、优雅关闭

pub mod error;
pub mod orchestrator;
pub mod policy;
pub mod shutdown;
pub mod state;

pub use error::AgentError;
pub use orchestrator::Orchestrator;
pub use policy::{Anchor, MenuEchoRule, Policy, DEFAULT_MAX_ROUND_TRIPS};
pub use shutdown::{ShutdownManager, ShutdownReason};
pub use state::LoopPhase;
