use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use textgen_server::build_router;
use textgen_server::config::Args;
use textgen_server::inference::{LlamaGenerator, TextGenerator};
use textgen_server::secret::SecretValidator;
use textgen_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("textgen_server=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // load once, before accepting traffic
    let load_args = args.clone();
    let generator = tokio::task::spawn_blocking(move || {
        LlamaGenerator::download(
            &load_args.model_id,
            &load_args.revision,
            load_args.hf_token,
            load_args.cpu,
        )
    })
    .await
    .context("model loader panicked")?
    .with_context(|| format!("failed to load model {}", args.model_id))?;

    let generator: Arc<dyn TextGenerator> = Arc::new(generator);
    let state = AppState::new(
        generator,
        SecretValidator::new(&args.secret),
        args.generation_params(),
    );

    let app = build_router(state);

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        address = %addr,
        model = %args.model_id,
        max_length = args.max_length,
        "textgen server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
