//! 编排主循环
//!
//! Deciding -> Executing -> Deciding … -> Done。能力请求按请求顺序分派、结果按请求顺序追加；
//! 连续能力往返超过 Policy 上限即致命。循环只修改调用方传入的状态副本，是否写回由调用方决定。
//! 可选 event_tx：向 CLI 推送 Thinking / CapabilityCall / Observation / Reply / Error。

use tokio::sync::mpsc::UnboundedSender;

use crate::core::{AgentError, LoopPhase, Policy};
use crate::memory::{ConversationState, Turn};
use crate::react::{apply_menu_echo, LoopEvent, Planner};
use crate::tools::CapabilityExecutor;

/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 一次循环的结果：后处理后的回复与本次用掉的能力往返数
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub reply: String,
    pub round_trips: usize,
}

/// 循环配置：必需的 planner / executor / policy，可选事件通道
pub struct LoopSession<'a> {
    pub planner: &'a Planner,
    pub executor: &'a CapabilityExecutor,
    pub policy: &'a Policy,
    pub event_tx: Option<&'a UnboundedSender<LoopEvent>>,
}

impl<'a> LoopSession<'a> {
    pub fn new(planner: &'a Planner, executor: &'a CapabilityExecutor, policy: &'a Policy) -> Self {
        Self {
            planner,
            executor,
            policy,
            event_tx: None,
        }
    }

    pub fn with_event_tx(mut self, tx: &'a UnboundedSender<LoopEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, ev: LoopEvent) {
        if let Some(tx) = self.event_tx {
            let _ = tx.send(ev);
        }
    }

    /// 追加用户消息并运行到 Done；出错时 state 可能含部分轮次，调用方应丢弃
    pub async fn run(
        &self,
        state: &mut ConversationState,
        message: &str,
    ) -> Result<LoopOutcome, AgentError> {
        let result = self.run_inner(state, message).await;
        if let Err(e) = &result {
            self.send_event(LoopEvent::Error { text: e.to_string() });
        }
        result
    }

    async fn run_inner(
        &self,
        state: &mut ConversationState,
        message: &str,
    ) -> Result<LoopOutcome, AgentError> {
        let max = self.policy.max_round_trips;
        state.push(Turn::human(message));

        let mut phase = LoopPhase::Deciding;
        let mut round_trips = 0;

        loop {
            match phase {
                LoopPhase::Deciding => {
                    self.send_event(LoopEvent::Thinking {
                        round_trip: round_trips,
                        max,
                    });
                    let turn = self.planner.decide(self.policy, state).await?;
                    let has_requests = !turn.capability_requests().is_empty();
                    if has_requests && round_trips >= max {
                        tracing::warn!(round_trips, "Model kept requesting capabilities");
                        return Err(AgentError::RoundTripLimitExceeded(max));
                    }
                    state.push(turn);
                    phase = LoopPhase::after_decision(has_requests);
                }
                LoopPhase::Executing => {
                    let requests = match state.turns().last() {
                        Some(turn) => turn.capability_requests().to_vec(),
                        None => Vec::new(),
                    };
                    for r in &requests {
                        self.send_event(LoopEvent::CapabilityCall {
                            capability: r.capability_name.clone(),
                            args: r.arguments.clone(),
                        });
                    }

                    let outputs = self.executor.execute_all(&requests).await?;

                    for (request, output) in requests.iter().zip(outputs) {
                        self.send_event(LoopEvent::Observation {
                            capability: request.capability_name.clone(),
                            preview: preview(&output.text),
                        });
                        if let Some(line) = &output.order_line {
                            state.record_order(line);
                        }
                        state.push(Turn::capability_result(request, output.text));
                    }
                    round_trips += 1;
                    phase = LoopPhase::Deciding;
                }
                LoopPhase::Done => {
                    let candidate = state.turns().last().map(Turn::text).unwrap_or_default();
                    let reply = apply_menu_echo(state.turns(), candidate, &self.policy.menu_echo);
                    self.send_event(LoopEvent::Reply {
                        text: reply.clone(),
                    });
                    return Ok(LoopOutcome { reply, round_trips });
                }
            }
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > OBSERVATION_PREVIEW_CHARS {
        let head: String = text.chars().take(OBSERVATION_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
