//! 运行时装配
//!
//! 按配置选择模型后端与菜单存储、播种菜单、注册并校验能力目录、构建 Policy，
//! 最后得到可被 HTTP 与 CLI 共享的 Orchestrator。这里的任何失败都是启动失败。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::config::{AppConfig, StoreBackend};
use crate::core::{MenuEchoRule, Orchestrator, Policy};
use crate::llm::{create_groq_client, LlmClient, MockLlmClient, OpenAiClient};
use crate::react::Planner;
use crate::store::{default_menu, seed_menu, InMemoryMenuStore, MenuStore, SqliteMenuStore};
use crate::tools::{menu_registry, CapabilityExecutor};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// 内置的 system prompt（找不到 config/prompts/system.md 时使用）
const FALLBACK_POLICY: &str = "Você é o atendente virtual de uma pizzaria. \
Responda sempre em português, de forma breve e simpática. \
Use as ferramentas para consultar preços, mostrar o cardápio e adicionar pizzas ao pedido; \
nunca invente preços ou sabores. \
Quando mostrar o cardápio, copie o resultado da ferramenta exatamente como veio.";

/// 根据配置与环境变量选择 LLM 后端（Groq / OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_groq = std::env::var("GROQ_API_KEY").is_ok();
    let has_openai = std::env::var("OPENAI_API_KEY").is_ok();
    let timeout = cfg.llm.timeout_secs;

    match provider.as_str() {
        "mock" => {
            tracing::info!("Using offline rules LLM");
            Arc::new(MockLlmClient)
        }
        "groq" if has_groq => {
            let client = create_groq_client(cfg.llm.model.as_deref(), timeout);
            tracing::info!("Using Groq LLM ({})", client.model_id());
            Arc::new(client)
        }
        "openai" | "groq" if has_openai => {
            let model = cfg.llm.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
            tracing::info!("Using OpenAI LLM ({})", model);
            Arc::new(
                OpenAiClient::new(
                    cfg.llm.base_url.as_deref(),
                    model,
                    std::env::var("OPENAI_API_KEY").ok().as_deref(),
                )
                .with_timeout(timeout),
            )
        }
        _ => {
            tracing::warn!("No API key set or provider unknown, using offline rules LLM");
            Arc::new(MockLlmClient)
        }
    }
}

/// 打开菜单存储；按配置在为空时播种默认菜单
pub async fn open_store(cfg: &AppConfig) -> anyhow::Result<Arc<dyn MenuStore>> {
    let store: Arc<dyn MenuStore> = match cfg.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryMenuStore::new()),
        StoreBackend::Sqlite => Arc::new(
            SqliteMenuStore::open(&cfg.store.sqlite_path).with_context(|| {
                format!("opening menu database {}", cfg.store.sqlite_path.display())
            })?,
        ),
    };
    if cfg.store.seed {
        seed_menu(store.as_ref(), &default_menu())
            .await
            .context("seeding menu")?;
    }
    Ok(store)
}

/// 读取 system prompt：配置路径 > config/prompts/system.md > ../config/prompts/system.md > 内置
pub fn load_system_prompt(cfg: &AppConfig) -> anyhow::Result<String> {
    if let Some(path) = &cfg.app.policy_path {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading policy {}", path.display()));
    }
    let found = ["config/prompts/system.md", "../config/prompts/system.md"]
        .into_iter()
        .map(PathBuf::from)
        .find_map(|p| std::fs::read_to_string(p).ok());
    Ok(found.unwrap_or_else(|| FALLBACK_POLICY.to_string()))
}

pub fn build_policy(cfg: &AppConfig) -> anyhow::Result<Policy> {
    let rule = MenuEchoRule::new(cfg.reply.menu_marker.clone(), cfg.reply.anchor_pattern.as_deref())?;
    Ok(Policy::new(load_system_prompt(cfg)?.trim())
        .with_max_round_trips(cfg.app.max_round_trips)
        .with_temperature(cfg.llm.temperature)
        .with_menu_echo(rule))
}

/// 用给定的模型与存储装配 Orchestrator（测试可直接注入）
pub fn assemble(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn MenuStore>,
) -> anyhow::Result<Orchestrator> {
    let registry = menu_registry(store, &cfg.reply.menu_marker);
    registry.validate()?;
    let executor = CapabilityExecutor::new(registry, cfg.capabilities.timeout_secs)
        .with_concurrency(cfg.capabilities.concurrent);
    let planner = Planner::new(llm, executor.specs());
    Ok(Orchestrator::new(planner, executor, build_policy(cfg)?))
}

/// 启动入口：配置 -> 模型 -> 存储 -> Orchestrator
pub async fn build_orchestrator(cfg: &AppConfig) -> anyhow::Result<Arc<Orchestrator>> {
    let llm = create_llm_from_config(cfg);
    let store = open_store(cfg).await?;
    let orchestrator = assemble(cfg, llm, store)?;
    tracing::info!(
        app = %cfg.app.name,
        model = orchestrator.planner().model_id(),
        capabilities = orchestrator.planner().capabilities().len(),
        "Orchestrator ready"
    );
    Ok(Arc::new(orchestrator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;

    #[test]
    fn test_mock_provider_is_explicit() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        assert_eq!(create_llm_from_config(&cfg).model_id(), "mock");
    }

    #[test]
    fn test_policy_path_must_exist_when_set() {
        let mut cfg = AppConfig::default();
        cfg.app.policy_path = Some(PathBuf::from("/nonexistent/system.md"));
        assert!(load_system_prompt(&cfg).is_err());
    }

    #[test]
    fn test_bad_anchor_pattern_fails_startup() {
        let mut cfg = AppConfig::default();
        cfg.reply.anchor_pattern = Some("[".to_string());
        assert!(build_policy(&cfg).is_err());
    }

    #[tokio::test]
    async fn test_build_with_sqlite_seeds_menu() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        cfg.store.backend = StoreBackend::Sqlite;
        cfg.store.sqlite_path = dir.path().join("menu.db");

        let store = open_store(&cfg).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 3);

        let orch = build_orchestrator(&cfg).await.unwrap();
        let reply = orch.chat("t", "quanto custa a calabresa?").await.unwrap();
        assert!(reply.contains("40.00"));
    }
}
