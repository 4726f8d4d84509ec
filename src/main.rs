use anyhow::Context;
use tracing_subscriber::EnvFilter;

use iotricity_api::{router, AppConfig, ModelStore, PredictionService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env();

    // Startup is the only place models are read; failing here keeps us off the network.
    let store = ModelStore::load(&cfg.model_h_path, &cfg.model_v_path)
        .context("failed to load models; refusing to serve")?;
    let (h_kind, v_kind) = store.describe();
    tracing::info!(
        "loaded models: horizontal={} ({}) vertical={} ({})",
        cfg.model_h_path.display(),
        h_kind,
        cfg.model_v_path.display(),
        v_kind
    );
    if cfg.log_predictions {
        tracing::info!("LOG_PRED=1: per-request prediction logging enabled");
    }

    let svc = PredictionService::new(store).with_prediction_logging(cfg.log_predictions);
    let app = router(svc);

    let (host, port) = cfg.bind_target();
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("ctrl-c handler failed: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler failed: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
