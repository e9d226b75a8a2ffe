//! Text column encodings: decimals as canonical decimal strings, dates as
//! `YYYY-MM-DD`, timestamps as RFC3339 UTC with milliseconds.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::store::{StoreError, StoreResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trailing fractional zeros are dropped so equal amounts encode identically.
pub fn decimal_text(d: Decimal) -> String {
    d.normalize().to_string()
}

pub fn date_text(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Same shape as the `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` column defaults.
pub fn now_text() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

pub fn read_decimal(column: &'static str, value: Option<&str>) -> StoreResult<Option<Decimal>> {
    value
        .map(|v| {
            Decimal::from_str(v).map_err(|_| StoreError::CorruptValue {
                column,
                value: v.to_string(),
            })
        })
        .transpose()
}

pub fn read_date(column: &'static str, value: Option<&str>) -> StoreResult<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, DATE_FORMAT).map_err(|_| StoreError::CorruptValue {
                column,
                value: v.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn equal_amounts_encode_identically() {
        assert_eq!(decimal_text(dec!(8.40)), decimal_text(dec!(8.4)));
        assert_eq!(decimal_text(dec!(160000000)), "160000000");
    }

    #[test]
    fn unreadable_values_are_corrupt() {
        assert!(matches!(
            read_decimal("budget", Some("lots")),
            Err(StoreError::CorruptValue { column: "budget", .. })
        ));
        assert!(matches!(
            read_date("release_date", Some("15/07/2010")),
            Err(StoreError::CorruptValue { .. })
        ));
        assert_eq!(read_decimal("budget", None).unwrap(), None);
    }
}
