use anyhow::Context;
use delay_api::{app, config::ServiceConfig, AppState};
use delay_model::{DelayModel, Features};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServiceConfig::from_env()?;
    let paths = cfg.model_paths();

    let model = DelayModel::load(&paths).with_context(|| {
        format!(
            "failed to load model artifacts ({}, {})",
            paths.encoder.display(),
            paths.classifier.display()
        )
    })?;

    // Warmup to make sure the classifier accepts the feature width
    let _ = model.predict(&Features::zeros(1))?;
    tracing::info!("warmup predict ok");
    tracing::info!(
        "loaded model; {} encoder outputs, {} classifier inputs",
        model.encoder().n_features(),
        model.classifier().n_features()
    );

    let state = AppState {
        model: Arc::new(model),
        log_pred: cfg.log_pred,
    };

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
