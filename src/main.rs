//! Pizza Bot HTTP 服务
//!
//! 入口：初始化日志、加载配置、装配 Orchestrator，启动 axum；Ctrl+C / SIGTERM 时优雅关闭。

use std::sync::Arc;

use anyhow::Context;
use pizzabot::{
    agent::build_orchestrator,
    config::load_config,
    core::ShutdownManager,
    observability,
    server::create_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let cfg = load_config(config_path).context("loading config")?;

    let orchestrator = build_orchestrator(&cfg)
        .await
        .context("Failed to start pizzabot")?;
    let app = create_router(orchestrator, &cfg.server.cors_origins);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(cfg.server.port);
    let addr = format!("{}:{}", cfg.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("Pizza Bot API: http://{}", addr);

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();
    let token = shutdown.token();
    let mut reasons = shutdown.subscribe();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    match reasons.try_recv() {
        Ok(reason) => tracing::info!(?reason, "Server stopped"),
        Err(_) => tracing::info!("Server stopped"),
    }
    Ok(())
}
