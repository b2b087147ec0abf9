//! Jobs and tasks.

use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::mapping::Mapping;
use crate::schema::DataModel;

/// An ordered set of mappings plus an optional record-level skip filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub mappings: Vec<Mapping>,
    /// Records failing this filter are skipped by every mapping of the job.
    #[serde(default)]
    pub skip_filter: Option<Filter>,
}

/// One executable unit: a job and the data models it reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub job: Job,
    #[serde(default)]
    pub input_data_model: Option<DataModel>,
    #[serde(default)]
    pub output_data_model: Option<DataModel>,
}

impl Task {
    /// The input schema, when an input data model with a schema is attached.
    pub fn input_schema(&self) -> Option<&crate::schema::Schema> {
        self.input_data_model
            .as_ref()
            .and_then(|model| model.schema.as_ref())
    }

    /// True when the input data model reads XML-shaped records.
    pub fn input_is_xml_shape(&self) -> bool {
        self.input_data_model
            .as_ref()
            .is_some_and(DataModel::is_xml_shape)
    }
}
