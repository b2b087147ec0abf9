//! Read-only model view of mapping tasks.
//!
//! These types mirror the persisted task structure: a job of mappings, each
//! wiring attribute-path instances through an optional transformation
//! component DAG. The compiler treats the whole tree as an immutable
//! snapshot; nothing here mutates or creates model state.

pub mod attribute;
pub mod component;
pub mod filter;
pub mod function;
pub mod mapping;
pub mod schema;
pub mod task;

pub use attribute::{ATTRIBUTE_DELIMITER, Attribute, AttributePath};
pub use component::{Component, ParameterMap};
pub use filter::Filter;
pub use function::{Function, Transformation};
pub use mapping::{Mapping, MappingAttributePathInstance};
pub use schema::{ContentSchema, DataModel, Schema};
pub use task::{Job, Task};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_path_equality_ignores_display_names() {
        let left = AttributePath::new(vec![Attribute::new("http://example.com/a", "a")]);
        let right = AttributePath::new(vec![Attribute::new("http://example.com/a", "other")]);
        assert_eq!(left, right);
        assert_eq!(left.canonical(), right.canonical());
    }

    #[test]
    fn canonical_joins_uris_with_delimiter() {
        let path = AttributePath::from_uris(["a", "b", "c"]);
        assert_eq!(path.canonical(), format!("a{0}b{0}c", ATTRIBUTE_DELIMITER));
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn parameter_map_preserves_insertion_order() {
        let mut map = ParameterMap::new();
        map.insert("zulu", "1");
        map.insert("alpha", "2");
        map.insert("mike", "3");
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike"]);

        map.insert("alpha", "updated");
        assert_eq!(map.get("alpha"), Some("updated"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn blank_filter_expression_reads_as_none() {
        let filter = Filter {
            expression: Some("   ".to_string()),
        };
        assert_eq!(filter.expression(), None);
        assert_eq!(Filter::new("x").expression(), Some("x"));
    }

    #[test]
    fn xml_shape_detection() {
        let mut model = DataModel {
            id: "dm1".to_string(),
            name: None,
            storage_type: Some("mabxml".to_string()),
            schema: None,
        };
        assert!(model.is_xml_shape());
        model.storage_type = Some("csv".to_string());
        assert!(!model.is_xml_shape());
        model.storage_type = None;
        assert!(!model.is_xml_shape());
    }
}
