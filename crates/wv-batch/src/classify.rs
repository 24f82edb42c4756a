// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-item error classification (§4.8 "Error classification").
//!
//! A per-item response is retried unless it has no errors, an empty error
//! list, a message matching a configured `exclude` filter, or (when no
//! `exclude` filter is set) a configured `include` filter that matches
//! nothing. Everything else is retriable.

/// Configures which per-item errors should be retried versus treated as
/// fatal (surfaced directly in `BatchResult::errors`).
#[derive(Clone, Debug, Default)]
pub struct ErrorClassifier {
    /// Error messages containing any of these substrings are never retried.
    exclude: Option<Vec<String>>,
    /// When set (and `exclude` is not), only messages containing one of
    /// these substrings are retried.
    include: Option<Vec<String>>,
}

impl ErrorClassifier {
    /// A classifier that retries every non-empty error (no filters).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Never retry errors whose message contains any of `patterns`.
    #[must_use]
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = Some(patterns);
        self
    }

    /// Only retry errors whose message contains one of `patterns`.
    #[must_use]
    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        self.include = Some(patterns);
        self
    }

    /// Decide whether a per-item response with the given error messages
    /// should be retried (re-enqueued) rather than treated as fatal.
    ///
    /// `messages` is the list of error strings reported for this item; an
    /// empty slice means the item succeeded or carried no error detail.
    #[must_use]
    pub fn should_retry(&self, messages: &[String]) -> bool {
        if messages.is_empty() {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            let excluded = messages
                .iter()
                .any(|m| exclude.iter().any(|pattern| m.contains(pattern.as_str())));
            return !excluded;
        }
        if let Some(include) = &self.include {
            return messages
                .iter()
                .any(|m| include.iter().any(|pattern| m.contains(pattern.as_str())));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_errors_never_retries() {
        let classifier = ErrorClassifier::new();
        assert!(!classifier.should_retry(&[]));
    }

    #[test]
    fn unfiltered_errors_always_retry() {
        let classifier = ErrorClassifier::new();
        assert!(classifier.should_retry(&["boom".to_string()]));
    }

    #[test]
    fn excluded_message_skips_retry() {
        let classifier = ErrorClassifier::new().with_exclude(vec!["already exists".to_string()]);
        assert!(!classifier.should_retry(&["object already exists".to_string()]));
        assert!(classifier.should_retry(&["connection reset".to_string()]));
    }

    #[test]
    fn include_filter_retries_only_matching_messages() {
        let classifier = ErrorClassifier::new().with_include(vec!["timeout".to_string()]);
        assert!(classifier.should_retry(&["read timeout".to_string()]));
        assert!(!classifier.should_retry(&["validation failed".to_string()]));
    }

    #[test]
    fn exclude_takes_precedence_over_include() {
        let classifier = ErrorClassifier::new()
            .with_exclude(vec!["already exists".to_string()])
            .with_include(vec!["anything".to_string()]);
        assert!(!classifier.should_retry(&["object already exists".to_string()]));
    }
}
