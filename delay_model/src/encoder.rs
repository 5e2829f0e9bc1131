use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::artifact;
use crate::error::{Error, Result};
use crate::record::{check_required_columns, CategoryValue, FlightRecord, RawColumn};

/// One-hot encoder over the categorical raw columns (`OPERA`, `TIPOVUELO`,
/// `MES`). Unknown categories are rejected rather than ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted categories, one list per entry of `RawColumn::CATEGORICAL`.
    categories: Vec<Vec<CategoryValue>>,
}

impl OneHotEncoder {
    pub fn fit(records: &[FlightRecord]) -> Result<Self> {
        check_required_columns(records, &RawColumn::CATEGORICAL)?;

        let mut seen: Vec<BTreeSet<CategoryValue>> = vec![BTreeSet::new(); RawColumn::CATEGORICAL.len()];
        for (row, record) in records.iter().enumerate() {
            for (i, column) in RawColumn::CATEGORICAL.iter().enumerate() {
                let value = record.category(*column).ok_or(Error::NullValue {
                    column: column.name(),
                    row,
                })?;
                seen[i].insert(value);
            }
        }

        let categories = seen.into_iter().map(|s| s.into_iter().collect()).collect();
        Ok(Self { categories })
    }

    /// Output column names, `"{COLUMN}_{category}"`.
    pub fn feature_names(&self) -> Vec<String> {
        RawColumn::CATEGORICAL
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, cats)| cats.iter().map(move |c| format!("{}_{}", column.name(), c)))
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Dense indicator matrix, one row per record and one column per
    /// entry of `feature_names()`.
    ///
    /// Columns are checked in order. The first column holding values
    /// outside its fitted categories fails the batch, listing each of its
    /// distinct unknown values once in order of first appearance.
    pub fn transform(&self, records: &[FlightRecord]) -> Result<Array2<f64>> {
        check_required_columns(records, &RawColumn::CATEGORICAL)?;

        let mut out = Array2::<f64>::zeros((records.len(), self.n_features()));
        let mut offset = 0;
        for (column, cats) in RawColumn::CATEGORICAL.iter().zip(&self.categories) {
            let mut unknown: Vec<String> = Vec::new();
            for (row, record) in records.iter().enumerate() {
                let value = record.category(*column).ok_or(Error::NullValue {
                    column: column.name(),
                    row,
                })?;
                match cats.binary_search(&value) {
                    Ok(idx) => out[(row, offset + idx)] = 1.0,
                    Err(_) => {
                        let text = value.to_string();
                        if !unknown.contains(&text) {
                            unknown.push(text);
                        }
                    }
                }
            }
            if !unknown.is_empty() {
                return Err(Error::UnknownCategory {
                    value: unknown.join(", "),
                    column: column.name(),
                });
            }
            offset += cats.len();
        }
        Ok(out)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        artifact::save(self, path.as_ref())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let enc: Self = artifact::load(path)?;
        if enc.categories.len() != RawColumn::CATEGORICAL.len() {
            return Err(artifact::invalid(
                path,
                format!(
                    "encoder has {} category lists, expected {}",
                    enc.categories.len(),
                    RawColumn::CATEGORICAL.len()
                ),
            ));
        }
        Ok(enc)
    }
}
