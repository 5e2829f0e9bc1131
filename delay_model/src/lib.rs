//! Flight delay prediction core: raw records, one-hot feature encoding,
//! delay labels and a class-balanced logistic regression.

mod artifact;
pub mod classifier;
pub mod encoder;
pub mod error;
pub mod label;
pub mod model;
pub mod record;

pub use classifier::{ClassWeight, LogisticRegression, LogisticRegressionParams};
pub use encoder::OneHotEncoder;
pub use error::{Error, Result};
pub use label::{derive_label, DATETIME_FORMAT, DELAY_THRESHOLD_MINUTES};
pub use model::{default_paths, DelayModel, Features, ModelPaths, FEATURE_COLS, TARGET_COLUMN};
pub use record::{CategoryValue, FlightRecord, RawColumn};
