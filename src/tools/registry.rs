//! 能力注册表
//!
//! 能力名是封闭枚举 CapabilityKind：名字 → 能力的映射在启动时由 validate 检查完整性，
//! 模型给出的名字先解析为 CapabilityKind，解析失败即为致命的 UnknownCapability。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::memory::OrderLine;
use crate::tools::CapabilitySpec;

/// 全部能力；名字同时是模型侧的工具名与分发键，须保持稳定
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    LookupPrice,
    AddToOrder,
    ListMenu,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 3] = [Self::LookupPrice, Self::AddToOrder, Self::ListMenu];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LookupPrice => "lookup_price",
            Self::AddToOrder => "add_to_order",
            Self::ListMenu => "list_menu",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityKind {
    type Err = AgentError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| AgentError::UnknownCapability(name.to_string()))
    }
}

/// 能力执行结果：给模型看的文本，以及（仅下单时）结构化订单行
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityOutput {
    pub text: String,
    pub order_line: Option<OrderLine>,
}

impl CapabilityOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            order_line: None,
        }
    }
}

/// 能力 trait：内容级失败（找不到、存储出错、参数无效）一律以文本返回，不返回错误
#[async_trait]
pub trait Capability: Send + Sync {
    fn kind(&self) -> CapabilityKind;

    /// 能力描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema（供 LLM 生成正确的参数格式）
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> CapabilityOutput;
}

/// 能力注册表：按 CapabilityKind 存储 Arc<dyn Capability>
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<CapabilityKind, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: impl Capability + 'static) {
        self.capabilities
            .insert(capability.kind(), Arc::new(capability));
    }

    /// 启动检查：每个 CapabilityKind 都必须有实现
    pub fn validate(&self) -> Result<(), AgentError> {
        let missing: Vec<&str> = CapabilityKind::ALL
            .iter()
            .filter(|k| !self.capabilities.contains_key(*k))
            .map(|k| k.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AgentError::CatalogError(format!(
                "missing capabilities: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn get(&self, kind: CapabilityKind) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(&kind).cloned()
    }

    /// 由模型给出的名字解析出能力；未知名字为致命错误
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Capability>, AgentError> {
        let kind: CapabilityKind = name.parse()?;
        self.get(kind)
            .ok_or_else(|| AgentError::UnknownCapability(name.to_string()))
    }

    /// 能力目录，按 CapabilityKind::ALL 的固定顺序
    pub fn specs(&self) -> Vec<CapabilitySpec> {
        CapabilityKind::ALL
            .iter()
            .filter_map(|k| self.capabilities.get(k))
            .map(|c| CapabilitySpec {
                name: c.kind().as_str().to_string(),
                description: c.description().to_string(),
                parameters: c.parameters_schema(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(CapabilityKind);

    #[async_trait]
    impl Capability for Fixed {
        fn kind(&self) -> CapabilityKind {
            self.0
        }

        fn description(&self) -> &str {
            "fixed"
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value) -> CapabilityOutput {
            CapabilityOutput::text(self.0.as_str())
        }
    }

    #[test]
    fn test_kind_round_trips_names() {
        for kind in CapabilityKind::ALL {
            assert_eq!(kind.as_str().parse::<CapabilityKind>().unwrap(), kind);
        }
        assert!(matches!(
            "order_drink".parse::<CapabilityKind>(),
            Err(AgentError::UnknownCapability(name)) if name == "order_drink"
        ));
    }

    #[test]
    fn test_validate_reports_missing() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Fixed(CapabilityKind::LookupPrice));
        let err = registry.validate().unwrap_err();
        assert!(err.to_string().contains("add_to_order"));
        assert!(err.to_string().contains("list_menu"));

        registry.register(Fixed(CapabilityKind::AddToOrder));
        registry.register(Fixed(CapabilityKind::ListMenu));
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_specs_in_stable_order() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Fixed(CapabilityKind::ListMenu));
        registry.register(Fixed(CapabilityKind::LookupPrice));
        registry.register(Fixed(CapabilityKind::AddToOrder));
        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["lookup_price", "add_to_order", "list_menu"]);
    }

    #[tokio::test]
    async fn test_resolve_dispatches_by_name() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Fixed(CapabilityKind::ListMenu));
        let capability = registry.resolve("list_menu").unwrap();
        assert_eq!(capability.execute(Value::Null).await.text, "list_menu");
        assert!(registry.resolve("lookup_price").is_err());
    }
}
