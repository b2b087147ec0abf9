//! Attributes and attribute paths.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Delimiter joining attribute URIs into a canonical path string.
///
/// The generated script advertises the same character as its entity marker,
/// so canonical path strings double as source selectors in the script.
pub const ATTRIBUTE_DELIMITER: char = '\u{1e}';

/// One attribute of a record schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Globally unique identifier of the attribute.
    pub uri: String,
    /// Human-readable name, display only.
    pub name: String,
}

impl Attribute {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
        }
    }
}

/// An ordered sequence of attributes addressing one leaf of a record.
///
/// Equality and hashing are defined over the canonical string (the URIs),
/// never over object identity or display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributePath {
    pub attributes: Vec<Attribute>,
}

impl AttributePath {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Builds a path from bare URIs, reusing each URI as its display name.
    pub fn from_uris<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes = uris
            .into_iter()
            .map(|uri| {
                let uri = uri.into();
                Attribute::new(uri.clone(), uri)
            })
            .collect();
        Self { attributes }
    }

    /// Canonical string form: attribute URIs joined by [`ATTRIBUTE_DELIMITER`].
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for (idx, attribute) in self.attributes.iter().enumerate() {
            if idx > 0 {
                out.push(ATTRIBUTE_DELIMITER);
            }
            out.push_str(&attribute.uri);
        }
        out
    }

    /// Number of attributes in the path.
    pub fn depth(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl PartialEq for AttributePath {
    fn eq(&self, other: &Self) -> bool {
        self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .zip(&other.attributes)
                .all(|(a, b)| a.uri == b.uri)
    }
}

impl Eq for AttributePath {}

impl Hash for AttributePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for attribute in &self.attributes {
            attribute.uri.hash(state);
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
