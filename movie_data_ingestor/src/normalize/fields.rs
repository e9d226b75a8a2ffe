//! Field-level coercions shared by the provider mappings.
//!
//! Every helper is total: unusable input maps to `None`, never to an error.
//! Only structurally required fields (title, external id) can fail a record,
//! and that decision belongs to the provider mapping, not to these helpers.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Number, Value};

/// Marker OMDb uses for every absent field.
const NOT_AVAILABLE: &str = "N/A";

/// Trims `s` and drops empty and `N/A` values.
pub fn present(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    (!s.is_empty() && !s.eq_ignore_ascii_case(NOT_AVAILABLE)).then_some(s)
}

pub fn parse_date(s: Option<&str>, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(present(s)?, format).ok()
}

/// A reported amount of zero (or less) is "no data".
pub fn positive(d: Decimal) -> Option<Decimal> {
    (d > Decimal::ZERO).then_some(d)
}

pub fn decimal_from_f64(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    Decimal::from_str(&f.to_string()).ok()
}

pub fn decimal_from_number(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    decimal_from_f64(n.as_f64()?)
}

/// Money reported as a JSON number (TMDb `budget`, `revenue`).
pub fn money_from_number(n: Option<&Number>) -> Option<Decimal> {
    positive(decimal_from_number(n?)?)
}

/// Money reported as display text (OMDb `BoxOffice`: `"$292,587,330"`).
pub fn money_from_text(s: Option<&str>) -> Option<Decimal> {
    let cleaned: String = present(s)?
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    positive(Decimal::from_str(&cleaned).ok()?)
}

/// Vote counts with thousands separators: `"2,345,678"`.
pub fn parse_count(s: Option<&str>) -> Option<i64> {
    let cleaned: String = present(s)?.chars().filter(|c| *c != ',').collect();
    cleaned.parse().ok()
}

/// OMDb runtimes look like `"148 min"`.
pub fn parse_runtime(s: Option<&str>) -> Option<i32> {
    let minutes: i32 = present(s)?.split_whitespace().next()?.parse().ok()?;
    (minutes > 0).then_some(minutes)
}

/// Identifiers may arrive as numbers (TMDb) or strings (OMDb).
pub fn id_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => present(Some(s)).map(str::to_string),
        _ => None,
    }
}

/// Parses a score as `(value, scale_max)`.
///
/// Accepts `"8.8/10"`, `"84/100"`, `"94%"` and bare numbers; a bare number is
/// read on `default_scale`.
pub fn parse_score(s: Option<&str>, default_scale: Decimal) -> Option<(Decimal, Decimal)> {
    let s = present(s)?;
    if let Some((value, scale)) = s.split_once('/') {
        let value = Decimal::from_str(value.trim()).ok()?;
        let scale = Decimal::from_str(scale.trim()).ok()?;
        return (scale > Decimal::ZERO).then_some((value, scale));
    }
    if let Some(value) = s.strip_suffix('%') {
        return Some((Decimal::from_str(value.trim()).ok()?, Decimal::ONE_HUNDRED));
    }
    Some((Decimal::from_str(s).ok()?, default_scale))
}
