// SPDX-License-Identifier: MIT OR Apache-2.0
//! `BatchRequest`/`BatchResult` — ordered ingestion and its partitioned
//! outcome (§3, §8 item 2).

use crate::object::{Object, Reference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single object queued for batch insertion, tagged with its original
/// submission index so results can be attributed back to it (§4.8
/// "Ordering").
#[derive(Clone, Debug, PartialEq)]
pub struct BatchObject {
    /// Index within the originating `insert_many` call.
    pub index: usize,
    /// The object to insert.
    pub object: Object,
    /// Collection this object belongs to.
    pub collection: String,
}

/// A single reference queued for batch insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchReference {
    /// Index within the originating call.
    pub index: usize,
    /// Source object UUID.
    pub from_uuid: Uuid,
    /// Source reference property name.
    pub from_property: String,
    /// The reference target(s).
    pub to: Reference,
    /// Collection the source object belongs to.
    pub collection: String,
}

/// An ordered batch of objects and/or references submitted together.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchRequest {
    /// Queued objects, in submission order.
    pub objects: Vec<BatchObject>,
    /// Queued references, in submission order.
    pub references: Vec<BatchReference>,
}

/// A per-item error surfaced as data, never raised (§4.9, §7).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemError {
    /// Human-readable error message as reported by the server or client.
    pub message: String,
    /// HTTP/RPC status code, when the error originated from a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl BatchItemError {
    /// Construct an error with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

/// One entry of [`BatchResult::all_responses`]: every input item produces
/// exactly one of these, preserving input order (§8 item 3).
#[derive(Clone, Debug, PartialEq)]
pub enum BatchItemOutcome {
    /// The item was accepted; carries its (possibly server-generated) UUID.
    Success(Uuid),
    /// The item was rejected; carries the classified error.
    Failure(BatchItemError),
}

/// The outcome of a batch submission.
///
/// Invariants (§8 item 2): `all_responses.len() == objects submitted`;
/// `uuids.keys()` and `errors.keys()` partition `0..n` (disjoint union).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchResult {
    /// Per-item outcome, indexed by original submission order.
    pub all_responses: Vec<BatchItemOutcome>,
    /// Indices that succeeded, mapped to their UUID.
    pub uuids: BTreeMap<usize, Uuid>,
    /// Indices that failed, mapped to their error.
    pub errors: BTreeMap<usize, BatchItemError>,
    /// Wall-clock time spent processing the batch, in seconds.
    pub elapsed_seconds: f64,
}

impl BatchResult {
    /// Whether any item in this result failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Build a result from ordered per-item outcomes, deriving `uuids`,
    /// `errors`, and the partition invariant.
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<BatchItemOutcome>, elapsed_seconds: f64) -> Self {
        let mut uuids = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for (index, outcome) in outcomes.iter().enumerate() {
            match outcome {
                BatchItemOutcome::Success(uuid) => {
                    uuids.insert(index, *uuid);
                }
                BatchItemOutcome::Failure(err) => {
                    errors.insert(index, err.clone());
                }
            }
        }
        Self {
            all_responses: outcomes,
            uuids,
            errors,
            elapsed_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_disjoint_and_total() {
        let outcomes = vec![
            BatchItemOutcome::Failure(BatchItemError::new("wrong_name")),
            BatchItemOutcome::Success(Uuid::new_v4()),
            BatchItemOutcome::Failure(BatchItemError::new("wrong_name")),
        ];
        let result = BatchResult::from_outcomes(outcomes, 0.01);
        assert_eq!(result.all_responses.len(), 3);
        assert_eq!(result.uuids.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(
            result.errors.keys().copied().collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert!(result.has_errors());
        let mut all_keys: Vec<usize> =
            result.uuids.keys().chain(result.errors.keys()).copied().collect();
        all_keys.sort_unstable();
        assert_eq!(all_keys, vec![0, 1, 2]);
    }

    #[test]
    fn no_errors_when_all_succeed() {
        let outcomes = vec![BatchItemOutcome::Success(Uuid::new_v4())];
        let result = BatchResult::from_outcomes(outcomes, 0.0);
        assert!(!result.has_errors());
    }

    proptest::proptest! {
        #[test]
        fn partition_law_holds_for_any_mix(successes in proptest::collection::vec(proptest::bool::ANY, 0..50)) {
            let outcomes: Vec<BatchItemOutcome> = successes
                .iter()
                .map(|&ok| {
                    if ok {
                        BatchItemOutcome::Success(Uuid::new_v4())
                    } else {
                        BatchItemOutcome::Failure(BatchItemError::new("err"))
                    }
                })
                .collect();
            let n = outcomes.len();
            let result = BatchResult::from_outcomes(outcomes, 0.0);
            assert_eq!(result.all_responses.len(), n);
            assert_eq!(result.has_errors(), !result.errors.is_empty());
            for i in 0..n {
                let in_uuids = result.uuids.contains_key(&i);
                let in_errors = result.errors.contains_key(&i);
                assert!(in_uuids ^ in_errors);
            }
        }
    }
}
