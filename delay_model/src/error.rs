use thiserror::Error;

/// Errors raised by preprocessing, fitting and inference.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    #[error("Unknown categories '{value}' found in column '{column}'")]
    UnknownCategory { value: String, column: &'static str },

    #[error("Missing value in column '{column}' at row {row}")]
    NullValue { column: &'static str, row: usize },

    #[error("Missing expected feature column '{0}' in encoder output")]
    MissingFeature(String),

    #[error("failed to parse '{value}' in column '{column}' as '%Y-%m-%d %H:%M:%S': {source}")]
    TimestampParse {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("shape mismatch: {features} feature rows but {labels} labels")]
    ShapeMismatch { features: usize, labels: usize },

    #[error("feature width mismatch: got {got}, expected {expected}")]
    FeatureWidth { got: usize, expected: usize },

    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("training labels contain a single class ({0}); need both 0 and 1")]
    SingleClass(u8),

    #[error("optimizer failed: {0}")]
    Optimizer(String),

    #[error("artifact i/o failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {path} is not a valid model file: {source}")]
    Artifact {
        path: String,
        #[source]
        source: bincode::Error,
    },
}

impl Error {
    /// True for errors caused by the caller's data rather than by the
    /// service itself. These map to a client error at the HTTP boundary.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::MissingColumns(_)
                | Error::UnknownCategory { .. }
                | Error::NullValue { .. }
                | Error::MissingFeature(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_every_column() {
        let e = Error::MissingColumns(vec!["TIPOVUELO", "MES"]);
        assert_eq!(e.to_string(), "Missing required columns: TIPOVUELO, MES");
        assert!(e.is_input_error());
    }

    #[test]
    fn unknown_category_names_value_and_column() {
        let e = Error::UnknownCategory {
            value: "Nonexistent Airline".into(),
            column: "OPERA",
        };
        assert_eq!(
            e.to_string(),
            "Unknown categories 'Nonexistent Airline' found in column 'OPERA'"
        );
        assert!(e.is_input_error());
    }

    #[test]
    fn fit_errors_are_not_input_errors() {
        assert!(!Error::ShapeMismatch { features: 3, labels: 2 }.is_input_error());
        assert!(!Error::FeatureWidth { got: 9, expected: 10 }.is_input_error());
        assert!(!Error::EmptyTrainingSet.is_input_error());
        assert!(!Error::Optimizer("line search failed".into()).is_input_error());
    }
}
