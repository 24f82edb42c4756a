// SPDX-License-Identifier: MIT OR Apache-2.0
//! Header redaction for the DEBUG request/response logger (§6, §8 item 9).
//!
//! Header *names* are matched case-insensitively against a fixed set;
//! matching values are replaced with the literal `[...]` rather than
//! merely truncated, so no prefix of a secret ever reaches a log line.

/// Header names (case-insensitive) whose values must never be logged.
const REDACTED_HEADER_NAMES: &[&str] = &["authorization", "cookie", "set-cookie", "api-key"];

/// Header name *prefixes* (case-insensitive) whose values must never be
/// logged, covering custom secret/token headers.
const REDACTED_HEADER_PREFIXES: &[&str] = &["secret-", "token"];

/// Returns `true` if a header with this name must have its value redacted.
#[must_use]
pub fn is_sensitive_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    REDACTED_HEADER_NAMES.contains(&lower.as_str())
        || REDACTED_HEADER_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
}

/// Redact a single `(name, value)` header pair for logging, replacing the
/// value with `[...]` when sensitive.
#[must_use]
pub fn redact_header<'a>(name: &str, value: &'a str) -> &'a str {
    if is_sensitive_header(name) {
        "[...]"
    } else {
        value
    }
}

/// Redact an ordered list of headers, preserving names for correlation but
/// replacing sensitive values.
#[must_use]
pub fn redact_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let redacted = if is_sensitive_header(name) {
                "[...]".to_string()
            } else {
                value.clone()
            };
            (name.clone(), redacted)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_known_sensitive_headers() {
        for name in ["Authorization", "COOKIE", "Set-Cookie", "Api-Key", "Secret-Value", "Token"] {
            assert!(is_sensitive_header(name), "{name} should be sensitive");
        }
    }

    #[test]
    fn leaves_ordinary_headers_untouched() {
        assert!(!is_sensitive_header("Content-Type"));
        assert_eq!(redact_header("Content-Type", "application/json"), "application/json");
    }

    #[test]
    fn redact_headers_preserves_names() {
        let headers = vec![
            ("Authorization".to_string(), "Bearer abc123".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let redacted = redact_headers(&headers);
        assert_eq!(redacted[0].0, "Authorization");
        assert_eq!(redacted[0].1, "[...]");
        assert_eq!(redacted[1].1, "application/json");
        assert!(!redacted.iter().any(|(_, v)| v.contains("abc123")));
    }
}
