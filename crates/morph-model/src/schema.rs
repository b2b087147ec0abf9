//! Data models, schemas and content schemas.

use serde::{Deserialize, Serialize};

use crate::attribute::AttributePath;

/// Storage types whose records carry an XML value-marker leaf segment.
const XML_STORAGE_TYPES: [&str; 8] = [
    "xml",
    "mabxml",
    "marcxml",
    "pnx",
    "oai-pmh+dce",
    "oai-pmh+dct",
    "oai-pmh+marcxml",
    "sru+pica+xml",
];

/// A data model reference: a schema plus the storage type it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub schema: Option<Schema>,
}

impl DataModel {
    /// True when the underlying storage produces XML-shaped records.
    pub fn is_xml_shape(&self) -> bool {
        self.storage_type
            .as_deref()
            .is_some_and(|storage_type| XML_STORAGE_TYPES.contains(&storage_type))
    }
}

/// A record schema: the attribute paths it declares, plus an optional
/// content schema describing repeating sub-records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub attribute_paths: Vec<AttributePath>,
    #[serde(default)]
    pub content_schema: Option<ContentSchema>,
}

impl Schema {
    /// Depth of `path` as the schema ranks it: the declared path's segment
    /// count when the schema lists it, the path's own count otherwise.
    pub fn rank_depth(&self, path: &AttributePath) -> usize {
        self.attribute_paths
            .iter()
            .find(|declared| *declared == path)
            .map_or_else(|| path.depth(), AttributePath::depth)
    }
}

/// Key/value structure of repeating sub-records within one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSchema {
    #[serde(default)]
    pub key_attribute_paths: Vec<AttributePath>,
    #[serde(default)]
    pub value_attribute_path: Option<AttributePath>,
}
