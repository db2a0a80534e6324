//! 能力执行器
//!
//! 持有 CapabilityRegistry 与单次调用超时；按请求顺序返回结果。
//! 未知能力名、超时为致命错误（AgentError）；其余失败已由能力自身转成文本。
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::time::timeout;

use crate::core::AgentError;
use crate::memory::CapabilityRequest;
use crate::tools::{Capability, CapabilityOutput, CapabilityRegistry, CapabilitySpec};

pub struct CapabilityExecutor {
    registry: CapabilityRegistry,
    timeout: Duration,
    /// 同一轮多个请求是否并发执行（结果仍按请求顺序返回）
    concurrent: bool,
}

impl CapabilityExecutor {
    pub fn new(registry: CapabilityRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs.max(1)),
            concurrent: false,
        }
    }

    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn specs(&self) -> Vec<CapabilitySpec> {
        self.registry.specs()
    }

    /// 执行一轮中的全部请求；先解析全部名字，任何一个未知则整轮不执行
    pub async fn execute_all(
        &self,
        requests: &[CapabilityRequest],
    ) -> Result<Vec<CapabilityOutput>, AgentError> {
        let resolved = requests
            .iter()
            .map(|r| self.registry.resolve(&r.capability_name).map(|c| (r, c)))
            .collect::<Result<Vec<_>, _>>()?;

        if self.concurrent {
            // join_all 的输出顺序与输入一致，与完成先后无关
            join_all(resolved.iter().map(|(r, c)| self.run_one(r, c.as_ref())))
                .await
                .into_iter()
                .collect()
        } else {
            let mut outputs = Vec::with_capacity(resolved.len());
            for (r, c) in &resolved {
                outputs.push(self.run_one(r, c.as_ref()).await?);
            }
            Ok(outputs)
        }
    }

    async fn run_one(
        &self,
        request: &CapabilityRequest,
        capability: &dyn Capability,
    ) -> Result<CapabilityOutput, AgentError> {
        let start = Instant::now();
        let result = timeout(self.timeout, capability.execute(request.arguments.clone())).await;

        let outcome = if result.is_ok() { "ok" } else { "timeout" };
        let audit = serde_json::json!({
            "event": "capability_audit",
            "capability": request.capability_name,
            "request_id": request.id,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(&request.arguments),
        });
        tracing::info!(audit = %audit, "capability");

        result.map_err(|_| AgentError::CapabilityTimeout(request.capability_name.clone()))
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::CapabilityKind;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// 按参数中的 delay_ms 延迟后回显 tag
    struct Delayed(CapabilityKind);

    #[async_trait]
    impl Capability for Delayed {
        fn kind(&self) -> CapabilityKind {
            self.0
        }

        fn description(&self) -> &str {
            "delayed echo"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, args: Value) -> CapabilityOutput {
            let ms = args["delay_ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            CapabilityOutput::text(args["tag"].as_str().unwrap_or_default())
        }
    }

    fn executor(timeout_secs: u64) -> CapabilityExecutor {
        let mut registry = CapabilityRegistry::new();
        registry.register(Delayed(CapabilityKind::LookupPrice));
        registry.register(Delayed(CapabilityKind::AddToOrder));
        registry.register(Delayed(CapabilityKind::ListMenu));
        CapabilityExecutor::new(registry, timeout_secs)
    }

    fn requests() -> Vec<CapabilityRequest> {
        vec![
            CapabilityRequest::new("r1", "lookup_price", json!({"tag": "first", "delay_ms": 80})),
            CapabilityRequest::new("r2", "list_menu", json!({"tag": "second", "delay_ms": 0})),
        ]
    }

    #[tokio::test]
    async fn test_results_follow_request_order_when_concurrent() {
        let exec = executor(5).with_concurrency(true);
        let outputs = exec.execute_all(&requests()).await.unwrap();
        let texts: Vec<&str> = outputs.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_results_follow_request_order_when_sequential() {
        let exec = executor(5);
        let outputs = exec.execute_all(&requests()).await.unwrap();
        assert_eq!(outputs[0].text, "first");
        assert_eq!(outputs[1].text, "second");
    }

    #[tokio::test]
    async fn test_unknown_capability_is_fatal() {
        let exec = executor(5);
        let mut reqs = requests();
        reqs.push(CapabilityRequest::new("r3", "order_drink", json!({})));
        let err = exec.execute_all(&reqs).await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownCapability(name) if name == "order_drink"));
    }

    #[tokio::test]
    async fn test_timeout_is_fatal() {
        let exec = executor(1);
        let reqs = vec![CapabilityRequest::new(
            "r1",
            "lookup_price",
            json!({"tag": "slow", "delay_ms": 1500}),
        )];
        let err = exec.execute_all(&reqs).await.unwrap_err();
        assert!(matches!(err, AgentError::CapabilityTimeout(_)));
    }
}
