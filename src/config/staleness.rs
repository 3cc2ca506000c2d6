//! Staleness policy for the cached configuration.
//!
//! Pure functions, no I/O. Anything that cannot be interpreted counts as stale so
//! a broken document is always refreshed rather than trusted.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::time::Duration;

/// Parse a TTL such as `"5m"`, `"90s"`, `"1h30m"` or `"250ms"`.
///
/// Returns `None` for empty input, unknown units, or trailing garbage.
pub fn parse_ttl(ttl: &str) -> Option<Duration> {
    let ttl = ttl.trim();
    if ttl.is_empty() {
        return None;
    }

    let pattern = Regex::new(r"(\d+)(ms|s|m|h|d)").ok()?;
    let mut total = Duration::ZERO;
    let mut consumed = 0;
    for caps in pattern.captures_iter(ttl) {
        let whole = caps.get(0)?;
        if whole.start() != consumed {
            return None;
        }
        consumed = whole.end();

        let amount: u64 = caps[1].parse().ok()?;
        let unit = match &caps[2] {
            "ms" => Duration::from_millis(amount),
            "s" => Duration::from_secs(amount),
            "m" => Duration::from_secs(amount.checked_mul(60)?),
            "h" => Duration::from_secs(amount.checked_mul(3600)?),
            "d" => Duration::from_secs(amount.checked_mul(86_400)?),
            _ => return None,
        };
        total = total.checked_add(unit)?;
    }

    (consumed == ttl.len()).then_some(total)
}

/// Decide whether a document last refreshed at `last_checked` is due at `now`.
///
/// `last_checked` is an RFC 3339 timestamp. An empty or unparseable timestamp or
/// TTL is stale. A timestamp in the future counts as fresh.
pub fn is_stale(last_checked: &str, ttl: &str, now: DateTime<Utc>) -> bool {
    let Ok(checked_at) = DateTime::parse_from_rfc3339(last_checked.trim()) else {
        return true;
    };
    let Some(ttl) = parse_ttl(ttl) else {
        return true;
    };
    let Ok(ttl) = chrono::Duration::from_std(ttl) else {
        return true;
    };

    now.signed_duration_since(checked_at.with_timezone(&Utc)) > ttl
}
