//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PIZZABOT__*` 覆盖（双下划线表示嵌套，如 `PIZZABOT__LLM__PROVIDER=openai`）。
//! 每个字段都有默认值，缺少配置文件时也能直接运行。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub store: StoreSection,
    pub capabilities: CapabilitiesSection,
    pub reply: ReplySection,
    pub server: ServerSection,
}

/// [app] 段：应用名、往返上限、system prompt 路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// 单次请求内允许的能力往返次数
    pub max_round_trips: usize,
    /// 未设置时依次尝试 config/prompts/system.md、../config/prompts/system.md
    pub policy_path: Option<PathBuf>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "Pizza Bot".to_string(),
            max_round_trips: crate::core::DEFAULT_MAX_ROUND_TRIPS,
            policy_path: None,
        }
    }
}

/// [llm] 段：后端选择、模型、温度与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// groq / openai / mock；有对应 API Key 时才生效，否则退回 mock
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    /// 单次模型请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: None,
            base_url: None,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

/// [store] 段：菜单存储
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
    pub sqlite_path: PathBuf,
    /// 存储为空时写入默认菜单
    pub seed: bool,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            sqlite_path: PathBuf::from("data/pizzabot.db"),
            seed: true,
        }
    }
}

/// [capabilities] 段：单次能力调用超时、同轮请求是否并发
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CapabilitiesSection {
    pub timeout_secs: u64,
    pub concurrent: bool,
}

impl Default for CapabilitiesSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            concurrent: false,
        }
    }
}

/// [reply] 段：菜单回显规则
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplySection {
    pub menu_marker: String,
    /// 为空时要求回复原样包含菜单；否则为忽略大小写的正则
    pub anchor_pattern: Option<String>,
}

impl Default for ReplySection {
    fn default() -> Self {
        Self {
            menu_marker: crate::tools::DEFAULT_MENU_MARKER.to_string(),
            anchor_pattern: None,
        }
    }
}

/// [server] 段：监听地址与允许的前端来源
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// 从 config 目录加载配置，环境变量 PIZZABOT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PIZZABOT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PIZZABOT")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.max_round_trips, 8);
        assert_eq!(cfg.llm.temperature, 0.0);
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.reply.menu_marker, "CARDÁPIO");
        assert_eq!(cfg.store.backend, StoreBackend::Sqlite);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[app]\nmax_round_trips = 3\n\n[store]\nbackend = \"memory\"\n\n[capabilities]\nconcurrent = true"
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.app.max_round_trips, 3);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert!(cfg.capabilities.concurrent);
        assert_eq!(cfg.capabilities.timeout_secs, 10);
    }

    #[test]
    fn test_unknown_store_backend_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[store]\nbackend = \"postgres\"\n\n[server]\nport = 9000").unwrap();

        let err = load_config(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("postgres"), "{}", err);
    }
}
