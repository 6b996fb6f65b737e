use anyhow::Result;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use query_router::RouterService;
use query_router::config::Config;
use query_router::error::RouterError;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the REPL output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();
    let service = RouterService::new(&config)?;
    tracing::info!(
        transcript = %service.transcript().path().display(),
        "Router service initialised"
    );

    let mode = std::env::var("ROUTER_MODE").unwrap_or_else(|_| "http".to_string());
    match mode.as_str() {
        "repl" | "stdin" => run_repl(&service).await,
        _ => {
            let bind: SocketAddr = config.server.bind.parse().map_err(|e| {
                RouterError::Config(format!("Invalid server.bind '{}': {e}", config.server.bind))
            })?;
            let listener = tokio::net::TcpListener::bind(bind).await?;
            tracing::info!(%bind, "Starting HTTP query server");
            axum::serve(listener, service.router()).await?;
            Ok(())
        }
    }
}

/// Interactive loop: one query per line, `[type] response` per answer
async fn run_repl(service: &RouterService) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b">>> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let output = match service.handle(&line).await {
            Ok(resp) => format!("[{}] {}\n", resp.kind.as_str(), resp.response),
            Err(RouterError::Validation { reason, .. }) => format!("{reason}\n"),
            Err(e) => format!("[error] {e}\n"),
        };
        stdout.write_all(output.as_bytes()).await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
