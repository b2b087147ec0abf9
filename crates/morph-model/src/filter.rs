//! Record filters.

use serde::{Deserialize, Serialize};

/// A filter attached to a mapping attribute path instance or to a whole job.
///
/// The expression payload is persisted as a serialized JSON document: an
/// ordered list of `{attributePathString: {type, expression}}` objects. The
/// compiler decodes it; the model only carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub expression: Option<String>,
}

impl Filter {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: Some(expression.into()),
        }
    }

    /// The raw expression payload, if any non-blank payload is present.
    pub fn expression(&self) -> Option<&str> {
        self.expression
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
    }
}
