// SPDX-License-Identifier: MIT OR Apache-2.0
//! RFC-3339 parsing tolerant of the server's non-standard trimmed form.
//!
//! The server trims trailing zero microseconds from timestamps before
//! sending them back (e.g. `2023-01-01T12:00:00.12Z` instead of
//! `2023-01-01T12:00:00.120000Z`), which `chrono`'s strict RFC-3339 parser
//! rejects. §9 open question (c) asks us to reproduce the original
//! client's workaround rather than "fix" it: right-pad the fractional
//! seconds to 9 digits before parsing, and accept both `Z` and a numeric
//! offset as the timezone suffix.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced while parsing a server-supplied timestamp.
#[derive(Debug, Clone, Error)]
pub enum DateTimeParseError {
    /// The string did not contain a recognizable date/time/offset shape.
    #[error("not a valid timestamp: {0}")]
    Malformed(String),
}

/// Parse a timestamp as the server emits it: RFC-3339 with possibly
/// truncated fractional seconds and either `Z` or a `+HH:MM`/`-HH:MM` offset.
pub fn parse_server_datetime(raw: &str) -> Result<DateTime<Utc>, DateTimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let normalized = normalize_fractional_seconds(raw);
    DateTime::parse_from_rfc3339(&normalized)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DateTimeParseError::Malformed(raw.to_string()))
}

/// Render a `DateTime<Utc>` the way the client sends it upstream: full
/// RFC-3339 with `Z` suffix, no trimming (trimming is a server-side
/// behavior we only need to *parse*, never produce).
#[must_use]
pub fn to_server_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Splits `raw` into `(body, tz_suffix)` where `tz_suffix` is `Z` or a
/// `+HH:MM`/`-HH:MM` offset, then pads a short fractional-seconds segment
/// in `body` out to 9 digits so `chrono` accepts it.
fn normalize_fractional_seconds(raw: &str) -> String {
    let (body, suffix) = split_timezone_suffix(raw);
    let Some(dot) = body.find('.') else {
        return format!("{body}{suffix}");
    };
    let (date_time, frac) = body.split_at(dot + 1);
    let padded = format!("{frac:0<9}");
    let padded = if padded.len() > 9 { &padded[..9] } else { &padded };
    format!("{date_time}{padded}{suffix}")
}

fn split_timezone_suffix(raw: &str) -> (&str, &str) {
    if let Some(stripped) = raw.strip_suffix('Z') {
        return (stripped, "Z");
    }
    // Look for a `+HH:MM` or `-HH:MM` suffix after the time portion (i.e.
    // after the `T`), so we don't mistake the date's dashes for an offset.
    if let Some(t_pos) = raw.find('T') {
        let (_, after_t) = raw.split_at(t_pos);
        if let Some(rel) = after_t.rfind(['+', '-']) {
            let split_at = t_pos + rel;
            return (&raw[..split_at], &raw[split_at..]);
        }
    }
    (raw, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_precision() {
        let dt = parse_server_datetime("2023-01-01T12:00:00.123456789Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-01-01T12:00:00.123456789+00:00");
    }

    #[test]
    fn parses_trimmed_microseconds() {
        let dt = parse_server_datetime("2023-01-01T12:00:00.12Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-01-01T12:00:00.120000000+00:00");
    }

    #[test]
    fn parses_trimmed_with_offset() {
        let dt = parse_server_datetime("2023-01-01T12:00:00.1+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-01-01T10:00:00.100000000+00:00");
    }

    #[test]
    fn parses_with_no_fraction() {
        let dt = parse_server_datetime("2023-01-01T12:00:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-01-01T12:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_server_datetime("not-a-date").is_err());
    }
}
