//! 交互式命令行：在单个线程上与 Pizza Bot 对话，打印循环事件
//!
//! 输入 `sair` 或 Ctrl+D 退出。

use std::sync::Arc;

use anyhow::Context;
use pizzabot::{
    agent::build_orchestrator,
    config::load_config,
    core::{ShutdownManager, ShutdownReason},
    observability,
    react::LoopEvent,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

const THREAD_ID: &str = "cli";

fn render(event: &LoopEvent) -> Option<String> {
    match event {
        LoopEvent::Thinking { round_trip, max } => Some(format!("  … pensando ({}/{})", round_trip, max)),
        LoopEvent::CapabilityCall { capability, args } => {
            Some(format!("  → {} {}", capability, args))
        }
        LoopEvent::Observation { capability, preview } => {
            Some(format!("  ← {}: {}", capability, preview.replace('\n', " ")))
        }
        LoopEvent::Error { text } => Some(format!("  ✗ {}", text)),
        LoopEvent::Reply { .. } => None,
    }
}

fn exit_note(reason: &ShutdownReason) -> Option<&'static str> {
    match reason {
        ShutdownReason::UserInitiated => None,
        ShutdownReason::Signal => Some("Encerrado por SIGTERM."),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(std::env::args().nth(1).map(std::path::PathBuf::from))
        .context("loading config")?;
    let orchestrator = build_orchestrator(&cfg)
        .await
        .context("Failed to start pizzabot")?;

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();
    let mut reasons = shutdown.subscribe();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout
        .write_all(format!("🍕 {} (digite 'sair' para encerrar)\n", cfg.app.name).as_bytes())
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = shutdown.wait_for_shutdown() => None,
        };
        let Some(line) = line else { break };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("sair") {
            shutdown.shutdown(ShutdownReason::UserInitiated);
            break;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                if let Some(line) = render(&ev) {
                    eprintln!("{}", line);
                }
            }
        });

        let result = orchestrator
            .chat_with_events(THREAD_ID, input, Some(&tx))
            .await;
        drop(tx);
        let _ = printer.await;

        match result {
            Ok(reply) => stdout.write_all(format!("{}\n\n", reply).as_bytes()).await?,
            Err(e) => stdout.write_all(format!("Erro: {}\n\n", e).as_bytes()).await?,
        }
    }

    if let Ok(reason) = reasons.try_recv() {
        tracing::info!(?reason, "REPL closed");
        if let Some(note) = exit_note(&reason) {
            stdout.write_all(format!("\n{}\n", note).as_bytes()).await?;
        }
    }
    stdout.write_all("Até logo!\n".as_bytes()).await?;
    Ok(())
}
