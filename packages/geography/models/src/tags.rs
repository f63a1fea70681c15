//! Open-ended `OpenStreetMap` tag mappings.
//!
//! OSM features carry arbitrary `key=value` annotations and no key is
//! guaranteed to be present. [`Tags`] gives them lookup-with-default
//! semantics: asking for a key that is not there is an ordinary `None`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A single tag value.
///
/// Overpass always returns strings; `GeoJSON` snapshots may carry booleans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Textual value (`building=yes`, `amenity=cafe`, ...).
    Text(String),
    /// Boolean value.
    Flag(bool),
}

impl TagValue {
    /// Returns the value as a string slice if it is textual.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }

    /// Exact comparison against a requested feature value.
    ///
    /// Booleans compare against `"true"` / `"false"`.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Text(s) => s == value,
            Self::Flag(b) => (if *b { "true" } else { "false" }) == value,
        }
    }
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Tag mapping of one geographic record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, TagValue>);

impl Tags {
    /// Creates an empty tag mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets a tag, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TagValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up a tag value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.0.get(key)
    }

    /// Looks up a textual tag value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(TagValue::as_str)
    }

    /// Whether the key is present with any value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether the mapping contains exactly `key=value`.
    #[must_use]
    pub fn has(&self, key: &str, value: &str) -> bool {
        self.0.get(key).is_some_and(|v| v.matches(value))
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<TagValue>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Which values of a tag an OSM fetch should select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagFilter {
    /// Any value, as long as the tag is present.
    Any,
    /// One of the listed values.
    Values(BTreeSet<String>),
}

/// Tag selection for an OSM fetch, keyed by tag name.
///
/// A feature is selected when it matches any one entry.
pub type TagQuery = BTreeMap<String, TagFilter>;
