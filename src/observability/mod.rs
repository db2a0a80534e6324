//! 可观测性：tracing 订阅器

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// RUST_LOG 未设置或无效时使用；HTTP 客户端相关 crate 压到 warn
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn,h2=warn";

pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // 测试或重复初始化时已有全局订阅器，忽略即可
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}
