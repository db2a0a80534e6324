//! Orchestrator：一次对话请求的完整周期
//!
//! 锁线程 -> 取出状态副本 -> 跑循环 -> 成功才写回 -> 释放锁（守卫离开作用域，出错也会释放）。
//! 失败的请求不写回任何部分状态；线程保持请求开始前的样子。

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use crate::core::{AgentError, Policy};
use crate::memory::{ConversationState, ThreadMemory};
use crate::react::{LoopEvent, LoopSession, Planner};
use crate::tools::CapabilityExecutor;

/// 多线程共享的编排器；Policy 构造后不可变
pub struct Orchestrator {
    planner: Planner,
    executor: CapabilityExecutor,
    policy: Policy,
    threads: Arc<ThreadMemory>,
}

impl Orchestrator {
    pub fn new(planner: Planner, executor: CapabilityExecutor, policy: Policy) -> Self {
        Self {
            planner,
            executor,
            policy,
            threads: Arc::new(ThreadMemory::new()),
        }
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// 当前已保存的线程状态（副本）
    pub async fn snapshot(&self, thread_id: &str) -> ConversationState {
        self.threads.get(thread_id).await
    }

    pub async fn chat(&self, thread_id: &str, message: &str) -> Result<String, AgentError> {
        self.chat_with_events(thread_id, message, None).await
    }

    pub async fn chat_with_events(
        &self,
        thread_id: &str,
        message: &str,
        event_tx: Option<&UnboundedSender<LoopEvent>>,
    ) -> Result<String, AgentError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("chat", thread_id = %thread_id, request_id = %request_id);
        self.run_cycle(thread_id, message, event_tx)
            .instrument(span)
            .await
    }

    async fn run_cycle(
        &self,
        thread_id: &str,
        message: &str,
        event_tx: Option<&UnboundedSender<LoopEvent>>,
    ) -> Result<String, AgentError> {
        let _guard = self.threads.lock(thread_id).await;
        let mut state = self.threads.get(thread_id).await;
        tracing::info!(turns = state.len(), "Processing message");

        let mut session = LoopSession::new(&self.planner, &self.executor, &self.policy);
        if let Some(tx) = event_tx {
            session = session.with_event_tx(tx);
        }

        match session.run(&mut state, message).await {
            Ok(outcome) => {
                self.threads.put(thread_id, state).await;
                let (prompt_tokens, completion_tokens, total_tokens) = self.planner.token_usage();
                tracing::info!(
                    round_trips = outcome.round_trips,
                    prompt_tokens,
                    completion_tokens,
                    total_tokens,
                    "Reply ready"
                );
                Ok(outcome.reply)
            }
            Err(e) => {
                tracing::error!(error = %e, "Request failed, thread state left untouched");
                Err(e)
            }
        }
    }
}
