//! `Retry-After` header parsing.
//!
//! The header is either delta-seconds (`"2"`) or an HTTP-date
//! (`"Wed, 21 Oct 2015 07:28:00 GMT"`). Anything else is treated as absent
//! and the governor falls back to its configured default.

use std::time::Duration;

use chrono::{DateTime, Utc};

pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        // Too large for u64; the governor caps it anyway.
        return Some(value.parse::<u64>().map_or(Duration::MAX, Duration::from_secs));
    }

    // Some proxies send fractional seconds.
    if let Ok(secs) = value.parse::<f64>() {
        if secs >= 0.0 {
            return Duration::try_from_secs_f64(secs).ok();
        }
        return None;
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    let delta = at.signed_duration_since(now);
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}
