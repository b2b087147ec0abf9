//! Mappings and attribute path instances.

use serde::{Deserialize, Serialize};

use crate::attribute::AttributePath;
use crate::component::Component;
use crate::filter::Filter;

/// An attribute path bound into a mapping role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingAttributePathInstance {
    /// Alias under which transformation parameters reference this instance.
    pub name: String,
    pub attribute_path: AttributePath,
    /// Selects the Nth occurrence of the path within one record; ≥ 1.
    #[serde(default)]
    pub ordinal: Option<u32>,
    #[serde(default)]
    pub filter: Option<Filter>,
}

impl MappingAttributePathInstance {
    pub fn new(name: impl Into<String>, attribute_path: AttributePath) -> Self {
        Self {
            name: name.into(),
            attribute_path,
            ordinal: None,
            filter: None,
        }
    }

    /// The raw filter expression payload, if a non-blank one is attached.
    pub fn filter_expression(&self) -> Option<&str> {
        self.filter.as_ref().and_then(Filter::expression)
    }
}

/// One mapping rule: 1..n inputs to exactly one output, optionally wired
/// through a transformation component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub inputs: Vec<MappingAttributePathInstance>,
    pub output: MappingAttributePathInstance,
    #[serde(default)]
    pub transformation: Option<Component>,
}
