// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire encoding for [`ConsistencyLevel`] (§5: "expands to the server's
//! wire encoding"), carried as an HTTP query parameter or RPC field.

use wv_core::collection::ConsistencyLevel;

/// Render a consistency level the way both transports expect it:
/// `ONE`/`QUORUM`/`ALL`.
#[must_use]
pub fn consistency_level_str(level: ConsistencyLevel) -> &'static str {
    match level {
        ConsistencyLevel::One => "ONE",
        ConsistencyLevel::Quorum => "QUORUM",
        ConsistencyLevel::All => "ALL",
    }
}
