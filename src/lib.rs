//! Pizza Bot - 披萨店对话点餐智能体
//!
//! 模块划分：
//! - **agent**: 运行时装配（模型后端、菜单存储、能力目录、Policy）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、Policy、请求周期编排、优雅关闭
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Groq / 离线规则 / 脚本）
//! - **memory**: 对话状态与按线程的记忆
//! - **react**: 决策步、主循环、菜单回显后处理
//! - **store**: 菜单存储（内存 / SQLite）
//! - **tools**: 能力目录、注册表、执行器与菜单能力
//! - **server**: HTTP 接口（feature `web`）

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
#[cfg(feature = "web")]
pub mod server;
pub mod store;
pub mod tools;

pub use crate::core::{AgentError, Orchestrator, Policy};
