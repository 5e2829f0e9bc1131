use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// One raw flight row. Every column is optional so that batches with
/// absent columns can be represented and rejected with a precise error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "OPERA", default, skip_serializing_if = "Option::is_none")]
    pub opera: Option<String>,
    #[serde(rename = "TIPOVUELO", default, skip_serializing_if = "Option::is_none")]
    pub tipo_vuelo: Option<String>,
    #[serde(rename = "MES", default, skip_serializing_if = "Option::is_none")]
    pub mes: Option<i64>,
    #[serde(rename = "Fecha-I", default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<String>,
    #[serde(rename = "Fecha-O", default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl FlightRecord {
    /// Record carrying only the three categorical columns, as seen at
    /// inference time.
    pub fn new(opera: impl Into<String>, tipo_vuelo: impl Into<String>, mes: i64) -> Self {
        Self {
            opera: Some(opera.into()),
            tipo_vuelo: Some(tipo_vuelo.into()),
            mes: Some(mes),
            scheduled: None,
            actual: None,
        }
    }

    pub fn with_times(mut self, scheduled: impl Into<String>, actual: impl Into<String>) -> Self {
        self.scheduled = Some(scheduled.into());
        self.actual = Some(actual.into());
        self
    }

    /// Categorical value of `column`, `None` when the cell is empty.
    /// Timestamp columns are not categorical and always yield `None`.
    pub fn category(&self, column: RawColumn) -> Option<CategoryValue> {
        match column {
            RawColumn::Opera => self.opera.clone().map(CategoryValue::Text),
            RawColumn::TipoVuelo => self.tipo_vuelo.clone().map(CategoryValue::Text),
            RawColumn::Mes => self.mes.map(CategoryValue::Int),
            RawColumn::Scheduled | RawColumn::Actual => None,
        }
    }

    fn has(&self, column: RawColumn) -> bool {
        match column {
            RawColumn::Opera => self.opera.is_some(),
            RawColumn::TipoVuelo => self.tipo_vuelo.is_some(),
            RawColumn::Mes => self.mes.is_some(),
            RawColumn::Scheduled => self.scheduled.is_some(),
            RawColumn::Actual => self.actual.is_some(),
        }
    }
}

/// Columns of the raw flight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawColumn {
    Opera,
    TipoVuelo,
    Mes,
    Scheduled,
    Actual,
}

impl RawColumn {
    pub const CATEGORICAL: [RawColumn; 3] = [RawColumn::Opera, RawColumn::TipoVuelo, RawColumn::Mes];
    pub const TIMESTAMPS: [RawColumn; 2] = [RawColumn::Scheduled, RawColumn::Actual];

    pub fn name(self) -> &'static str {
        match self {
            RawColumn::Opera => "OPERA",
            RawColumn::TipoVuelo => "TIPOVUELO",
            RawColumn::Mes => "MES",
            RawColumn::Scheduled => "Fecha-I",
            RawColumn::Actual => "Fecha-O",
        }
    }
}

impl fmt::Display for RawColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A categorical cell. Integers order before text and numerically among
/// themselves, so month categories sort 1..=12 rather than lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Int(v) => write!(f, "{v}"),
            CategoryValue::Text(s) => f.write_str(s),
        }
    }
}

/// A column is present when at least one row carries a value for it.
pub fn is_present(records: &[FlightRecord], column: RawColumn) -> bool {
    records.iter().any(|r| r.has(column))
}

/// Fails with every absent column, in the order given.
pub fn check_required_columns(records: &[FlightRecord], required: &[RawColumn]) -> Result<()> {
    let missing: Vec<&'static str> = required
        .iter()
        .filter(|c| !is_present(records, **c))
        .map(|c| c.name())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingColumns(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_raw_column_names() {
        let r: FlightRecord = serde_json::from_str(
            r#"{"OPERA":"Grupo LATAM","TIPOVUELO":"I","MES":7,"Fecha-I":"2017-01-01 23:30:00"}"#,
        )
        .unwrap();
        assert_eq!(r.opera.as_deref(), Some("Grupo LATAM"));
        assert_eq!(r.tipo_vuelo.as_deref(), Some("I"));
        assert_eq!(r.mes, Some(7));
        assert_eq!(r.scheduled.as_deref(), Some("2017-01-01 23:30:00"));
        assert_eq!(r.actual, None);
    }

    #[test]
    fn months_sort_numerically() {
        let mut v = vec![CategoryValue::Int(10), CategoryValue::Int(2), CategoryValue::Int(1)];
        v.sort();
        assert_eq!(v, vec![CategoryValue::Int(1), CategoryValue::Int(2), CategoryValue::Int(10)]);
        assert_eq!(CategoryValue::Int(7).to_string(), "7");
    }

    #[test]
    fn missing_columns_reported_in_declared_order() {
        let records = vec![FlightRecord {
            opera: Some("Copa Air".into()),
            ..Default::default()
        }];
        let err = check_required_columns(&records, &RawColumn::CATEGORICAL).unwrap_err();
        assert_eq!(err.to_string(), "Missing required columns: TIPOVUELO, MES");
    }

    #[test]
    fn empty_batch_has_no_columns() {
        let err = check_required_columns(&[], &RawColumn::CATEGORICAL).unwrap_err();
        assert!(matches!(err, Error::MissingColumns(ref c) if c.len() == 3));
    }

    #[test]
    fn column_present_if_any_row_has_it() {
        let records = vec![
            FlightRecord::new("Sky Airline", "N", 3),
            FlightRecord::default(),
        ];
        assert!(check_required_columns(&records, &RawColumn::CATEGORICAL).is_ok());
        assert!(!is_present(&records, RawColumn::Scheduled));
    }
}
