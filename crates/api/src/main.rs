//! Emotion Session Server - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_forever, AppState, ServerConfig};
use emotion_detect::OnnxEmotionClassifier;
use metrics_exporter_prometheus::PrometheusBuilder;
use report::ReportRenderer;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("loading server configuration")?;
    init_logging(&config.log_level);

    info!("=== Emotion Session Server v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;

    let classifier = OnnxEmotionClassifier::load_with_retry(&config.detector)
        .await
        .context("initializing emotion classifier")?;
    let renderer = ReportRenderer::new(config.report.clone());
    info!("Reports are written to {}", renderer.config().output_dir.display());

    let state = Arc::new(
        AppState::new(config, Arc::new(classifier), Arc::new(renderer)).with_metrics(metrics),
    );

    tokio::select! {
        _ = run_forever(state) => {}
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
    }

    Ok(())
}
