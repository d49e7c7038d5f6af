//! crossrank HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use crossrank::config::{Config, ModelSource};
use crossrank::gateway::{HandlerState, create_router_with_state};
use crossrank::model::{device_label, fetch_model};
use crossrank::reranker::Reranker;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        max_pairs = config.max_pairs,
        inference_concurrency = config.inference_concurrency,
        "crossrank starting"
    );

    let model_dir = match config.model_source() {
        ModelSource::Stub => None,
        ModelSource::Local(path) => Some(path),
        ModelSource::Hub { model_id, revision } => {
            Some(fetch_model(&model_id, revision.as_deref()).await?)
        }
    };

    let reranker_config = config.reranker_config(model_dir);
    let reranker = tokio::task::spawn_blocking(move || Reranker::load(reranker_config)).await??;

    tracing::info!(
        model_loaded = reranker.is_model_loaded(),
        device = device_label(reranker.device()),
        max_seq_len = reranker.max_seq_len(),
        "Reranker ready"
    );

    let state = HandlerState::new(
        Arc::new(reranker),
        config.inference_concurrency,
        config.max_pairs,
    );

    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("crossrank shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("CROSSRANK_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(crossrank::constants::DEFAULT_PORT);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
