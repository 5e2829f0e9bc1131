use anyhow::{bail, Context, Result};
use delay_model::{
    default_paths, DelayModel, FlightRecord, LogisticRegressionParams, ModelPaths, TARGET_COLUMN,
};
use rand::{rngs::StdRng, SeedableRng};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

// Offline trainer:
// 1. Read raw flights (JSON lines) from DATA_PATH
// 2. Fit encoder + class-balanced logistic regression
// 3. Write both artifacts

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| "data/data.jsonl".to_string());
    let seed: u64 = std::env::var("SHUFFLE_SEED").ok().and_then(|s| s.parse().ok()).unwrap_or(42);
    let defaults = default_paths("artifacts");
    let paths = ModelPaths {
        encoder: std::env::var("ENCODER_PATH").map(PathBuf::from).unwrap_or(defaults.encoder),
        classifier: std::env::var("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.classifier),
    };

    let records = read_records(&data_path)?;
    if records.is_empty() {
        bail!("no records in {}", data_path);
    }
    tracing::info!("read {} flights from {}", records.len(), data_path);

    let mut rng = StdRng::seed_from_u64(seed);
    let model = DelayModel::train(&records, &LogisticRegressionParams::default(), &mut rng)
        .context("training failed")?;

    let (features, target) = model.preprocess_with_target(&records)?;
    let predicted = model.predict(&features)?;
    let hits = predicted.iter().zip(&target).filter(|(p, t)| p == t).count();
    let delayed = target.iter().filter(|v| **v == 1).count();
    tracing::info!(
        "{}: {} delayed / {} on time; training accuracy {:.3}",
        TARGET_COLUMN,
        delayed,
        target.len() - delayed,
        hits as f64 / target.len() as f64
    );

    for path in [&paths.encoder, &paths.classifier] {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }
    model.save(&paths).context("failed to write artifacts")?;
    tracing::info!(
        "wrote encoder to {} and model to {}",
        paths.encoder.display(),
        paths.classifier.display()
    );
    Ok(())
}

fn read_records(path: &str) -> Result<Vec<FlightRecord>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read data at {}", path))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("{}:{}: invalid flight record", path, i + 1))
        })
        .collect()
}
