use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::record::RawColumn;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DELAY_THRESHOLD_MINUTES: f64 = 15.0;

pub fn parse_timestamp(column: RawColumn, text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).map_err(|source| Error::TimestampParse {
        column: column.name(),
        value: text.to_string(),
        source,
    })
}

/// Signed minutes from `scheduled` to `actual`; negative for early departures.
pub fn delay_minutes(scheduled: NaiveDateTime, actual: NaiveDateTime) -> f64 {
    (actual - scheduled).num_milliseconds() as f64 / 60_000.0
}

/// 1 when strictly more than 15 minutes late, else 0.
pub fn label_for_minutes(minutes: f64) -> u8 {
    u8::from(minutes > DELAY_THRESHOLD_MINUTES)
}

pub fn derive_label(scheduled: &str, actual: &str) -> Result<u8> {
    let scheduled = parse_timestamp(RawColumn::Scheduled, scheduled)?;
    let actual = parse_timestamp(RawColumn::Actual, actual)?;
    Ok(label_for_minutes(delay_minutes(scheduled, actual)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_fifteen_minutes_is_on_time() {
        assert_eq!(derive_label("2017-01-01 23:30:00", "2017-01-01 23:45:00").unwrap(), 0);
        assert_eq!(label_for_minutes(15.0), 0);
    }

    #[test]
    fn just_over_threshold_is_delayed() {
        assert_eq!(label_for_minutes(15.000001), 1);
        assert_eq!(derive_label("2017-01-01 23:30:00", "2017-01-01 23:45:01").unwrap(), 1);
    }

    #[test]
    fn early_or_punctual_is_on_time() {
        assert_eq!(label_for_minutes(0.0), 0);
        assert_eq!(label_for_minutes(-42.0), 0);
        assert_eq!(derive_label("2017-01-01 23:30:00", "2017-01-01 23:10:00").unwrap(), 0);
    }

    #[test]
    fn delay_crosses_midnight() {
        let s = parse_timestamp(RawColumn::Scheduled, "2017-01-01 23:55:00").unwrap();
        let a = parse_timestamp(RawColumn::Actual, "2017-01-02 00:20:00").unwrap();
        assert_eq!(delay_minutes(s, a), 25.0);
    }

    #[test]
    fn malformed_timestamp_names_column() {
        let err = derive_label("2017-01-01 23:30:00", "01/01/2017 23:45").unwrap_err();
        assert!(matches!(err, Error::TimestampParse { column: "Fecha-O", .. }));
        assert!(!err.is_input_error());
    }
}
