use ndarray::{Array2, Axis};
use rand::{seq::SliceRandom, Rng};
use std::path::{Path, PathBuf};

use crate::classifier::{LogisticRegression, LogisticRegressionParams};
use crate::encoder::OneHotEncoder;
use crate::error::{Error, Result};
use crate::label::{delay_minutes, label_for_minutes, parse_timestamp};
use crate::record::{check_required_columns, FlightRecord, RawColumn};

/// Encoder outputs the classifier consumes, in training order.
pub const FEATURE_COLS: [&str; 10] = [
    "OPERA_Latin American Wings",
    "MES_7",
    "MES_10",
    "OPERA_Grupo LATAM",
    "MES_12",
    "TIPOVUELO_I",
    "MES_4",
    "MES_11",
    "OPERA_Sky Airline",
    "OPERA_Copa Air",
];

pub const TARGET_COLUMN: &str = "delay";

/// Named feature matrix, row-major, columns in `FEATURE_COLS` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl Features {
    pub fn zeros(rows: usize) -> Self {
        Self {
            columns: FEATURE_COLS.iter().map(|c| c.to_string()).collect(),
            values: Array2::zeros((rows, FEATURE_COLS.len())),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.values.get((row, col)).copied()
    }
}

/// Artifact locations for the two fitted parts.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub encoder: PathBuf,
    pub classifier: PathBuf,
}

/// Fitted encoder plus classifier. Immutable once built; share behind `Arc`.
#[derive(Debug, Clone)]
pub struct DelayModel {
    encoder: OneHotEncoder,
    classifier: LogisticRegression,
}

impl DelayModel {
    pub fn new(encoder: OneHotEncoder, classifier: LogisticRegression) -> Result<Self> {
        if classifier.n_features() != FEATURE_COLS.len() {
            return Err(Error::FeatureWidth {
                got: classifier.n_features(),
                expected: FEATURE_COLS.len(),
            });
        }
        Ok(Self { encoder, classifier })
    }

    pub fn load(paths: &ModelPaths) -> Result<Self> {
        let encoder = OneHotEncoder::load(&paths.encoder)?;
        let classifier = LogisticRegression::load(&paths.classifier)?;
        tracing::debug!(
            encoder = %paths.encoder.display(),
            classifier = %paths.classifier.display(),
            "loaded model artifacts"
        );
        Self::new(encoder, classifier)
    }

    pub fn save(&self, paths: &ModelPaths) -> Result<()> {
        self.encoder.save(&paths.encoder)?;
        self.classifier.save(&paths.classifier)
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    /// One-hot encode and keep only `FEATURE_COLS`.
    pub fn preprocess(&self, records: &[FlightRecord]) -> Result<Features> {
        encode_features(&self.encoder, records)
    }

    /// Like `preprocess`, also deriving the delay label from `Fecha-I`/`Fecha-O`.
    pub fn preprocess_with_target(&self, records: &[FlightRecord]) -> Result<(Features, Vec<u8>)> {
        check_required_columns(records, &required_with_target())?;
        let features = self.preprocess(records)?;
        let target = derive_target(records)?;
        Ok((features, target))
    }

    /// Shuffle rows, then refit the classifier.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        features: &Features,
        target: &[u8],
        params: &LogisticRegressionParams,
        rng: &mut R,
    ) -> Result<()> {
        self.classifier = fit_shuffled(features, target, params, rng)?;
        Ok(())
    }

    pub fn predict(&self, features: &Features) -> Result<Vec<u8>> {
        self.classifier.predict(features.values.view())
    }

    /// Fit encoder and classifier from labelled raw records.
    pub fn train<R: Rng + ?Sized>(
        records: &[FlightRecord],
        params: &LogisticRegressionParams,
        rng: &mut R,
    ) -> Result<Self> {
        check_required_columns(records, &required_with_target())?;
        let encoder = OneHotEncoder::fit(records)?;
        let features = encode_features(&encoder, records)?;
        let target = derive_target(records)?;
        let classifier = fit_shuffled(&features, &target, params, rng)?;
        tracing::info!(
            rows = records.len(),
            delayed = target.iter().filter(|v| **v == 1).count(),
            n_iter = classifier.n_iter(),
            "trained delay model"
        );
        Ok(Self { encoder, classifier })
    }
}

fn required_with_target() -> Vec<RawColumn> {
    RawColumn::CATEGORICAL
        .iter()
        .chain(RawColumn::TIMESTAMPS.iter())
        .copied()
        .collect()
}

fn encode_features(encoder: &OneHotEncoder, records: &[FlightRecord]) -> Result<Features> {
    let encoded = encoder.transform(records)?;
    let names = encoder.feature_names();

    let mut indices = Vec::with_capacity(FEATURE_COLS.len());
    for col in FEATURE_COLS {
        let idx = names
            .iter()
            .position(|n| n == col)
            .ok_or_else(|| Error::MissingFeature(col.to_string()))?;
        indices.push(idx);
    }

    Ok(Features {
        columns: FEATURE_COLS.iter().map(|c| c.to_string()).collect(),
        values: encoded.select(Axis(1), &indices),
    })
}

fn derive_target(records: &[FlightRecord]) -> Result<Vec<u8>> {
    records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            let scheduled = r.scheduled.as_deref().ok_or(Error::NullValue {
                column: RawColumn::Scheduled.name(),
                row,
            })?;
            let actual = r.actual.as_deref().ok_or(Error::NullValue {
                column: RawColumn::Actual.name(),
                row,
            })?;
            let s = parse_timestamp(RawColumn::Scheduled, scheduled)?;
            let a = parse_timestamp(RawColumn::Actual, actual)?;
            Ok(label_for_minutes(delay_minutes(s, a)))
        })
        .collect()
}

fn fit_shuffled<R: Rng + ?Sized>(
    features: &Features,
    target: &[u8],
    params: &LogisticRegressionParams,
    rng: &mut R,
) -> Result<LogisticRegression> {
    if features.n_rows() != target.len() {
        return Err(Error::ShapeMismatch {
            features: features.n_rows(),
            labels: target.len(),
        });
    }
    let mut order: Vec<usize> = (0..target.len()).collect();
    order.shuffle(rng);

    let x = features.values.select(Axis(0), &order);
    let y: Vec<u8> = order.iter().map(|i| target[*i]).collect();
    LogisticRegression::fit(params, x.view(), &y)
}

/// Default artifact locations relative to the working directory.
pub fn default_paths(dir: impl AsRef<Path>) -> ModelPaths {
    let dir = dir.as_ref();
    ModelPaths {
        encoder: dir.join("onehot_encoder.bin"),
        classifier: dir.join("logistic_model.bin"),
    }
}
