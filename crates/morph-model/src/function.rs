//! Functions and transformations.

use serde::{Deserialize, Serialize};

use crate::component::Component;

/// A function bound into a component: either an atomic builtin identified by
/// name, or a transformation implemented as a closed component DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Function {
    Function {
        name: String,
        #[serde(default)]
        parameters: Vec<String>,
    },
    Transformation(Transformation),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Function { name, .. } => name,
            Function::Transformation(transformation) => &transformation.name,
        }
    }

    pub fn as_transformation(&self) -> Option<&Transformation> {
        match self {
            Function::Transformation(transformation) => Some(transformation),
            Function::Function { .. } => None,
        }
    }
}

/// A function implemented as a component DAG.
///
/// When the component set is non-empty, exactly one member has no output
/// edges; that sink produces the transformation's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub name: String,
    #[serde(default)]
    pub components: Vec<Component>,
}
