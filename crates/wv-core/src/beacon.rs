// SPDX-License-Identifier: MIT OR Apache-2.0
//! Beacon URIs: `weaviate://localhost/[<Collection>/]<uuid>`.

use std::fmt;
use uuid::Uuid;

/// A parsed beacon reference, pointing at one object by UUID and an
/// optional target collection.
///
/// Multi-target references always carry a collection name; legacy
/// single-target references may omit it (the implicit-single-target form
/// described in §3/§6 of the spec).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Beacon {
    /// Target collection name, when known (multi-target references).
    pub collection: Option<String>,
    /// Target object UUID.
    pub uuid: Uuid,
}

/// Errors produced while parsing a beacon URI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BeaconParseError {
    /// The string did not start with the `weaviate://` scheme.
    #[error("not a weaviate beacon: {0}")]
    BadScheme(String),
    /// The path segment could not be parsed as a UUID.
    #[error("invalid beacon uuid: {0}")]
    BadUuid(String),
    /// The beacon had no path segments at all.
    #[error("empty beacon path")]
    EmptyPath,
}

const SCHEME_HOST: &str = "weaviate://localhost/";

impl Beacon {
    /// Construct a beacon for a multi-target reference.
    #[must_use]
    pub fn multi_target(collection: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            collection: Some(collection.into()),
            uuid,
        }
    }

    /// Construct a beacon for an implicit single-target reference.
    #[must_use]
    pub fn single_target(uuid: Uuid) -> Self {
        Self {
            collection: None,
            uuid,
        }
    }

    /// Render the wire form, e.g. `weaviate://localhost/Article/0f1e...`.
    #[must_use]
    pub fn to_uri(&self) -> String {
        match &self.collection {
            Some(collection) => format!("{SCHEME_HOST}{collection}/{}", self.uuid),
            None => format!("{SCHEME_HOST}{}", self.uuid),
        }
    }

    /// Parse a beacon URI in either the collection-qualified or the legacy
    /// implicit-single-target form.
    pub fn parse(uri: &str) -> Result<Self, BeaconParseError> {
        let rest = uri
            .strip_prefix(SCHEME_HOST)
            .ok_or_else(|| BeaconParseError::BadScheme(uri.to_string()))?;
        let mut segments = rest.split('/').filter(|s| !s.is_empty());
        let first = segments.next().ok_or(BeaconParseError::EmptyPath)?;
        match segments.next() {
            Some(uuid_segment) => {
                let uuid = Uuid::parse_str(uuid_segment)
                    .map_err(|_| BeaconParseError::BadUuid(uuid_segment.to_string()))?;
                Ok(Self {
                    collection: Some(first.to_string()),
                    uuid,
                })
            }
            None => {
                let uuid = Uuid::parse_str(first)
                    .map_err(|_| BeaconParseError::BadUuid(first.to_string()))?;
                Ok(Self {
                    collection: None,
                    uuid,
                })
            }
        }
    }
}

impl fmt::Display for Beacon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_multi_target() {
        let uuid = Uuid::new_v4();
        let beacon = Beacon::multi_target("Article", uuid);
        let uri = beacon.to_uri();
        assert_eq!(uri, format!("weaviate://localhost/Article/{uuid}"));
        assert_eq!(Beacon::parse(&uri).unwrap(), beacon);
    }

    #[test]
    fn round_trips_single_target() {
        let uuid = Uuid::new_v4();
        let beacon = Beacon::single_target(uuid);
        let uri = beacon.to_uri();
        assert_eq!(uri, format!("weaviate://localhost/{uuid}"));
        assert_eq!(Beacon::parse(&uri).unwrap(), beacon);
    }

    #[test]
    fn rejects_foreign_scheme() {
        assert!(matches!(
            Beacon::parse("https://localhost/Article/abc"),
            Err(BeaconParseError::BadScheme(_))
        ));
    }

    #[test]
    fn rejects_bad_uuid() {
        assert!(matches!(
            Beacon::parse("weaviate://localhost/Article/not-a-uuid"),
            Err(BeaconParseError::BadUuid(_))
        ));
    }
}
