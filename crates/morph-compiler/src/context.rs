//! Per-compile state and mapping-level scope analysis.

use std::collections::BTreeMap;

use morph_model::{MappingAttributePathInstance, Schema};
use tracing::debug;

use crate::filter::FilterMap;
use crate::path;

/// Mutable state of one compile run.
///
/// Each run owns its own context, so compiles never observe each other's
/// variable counters.
#[derive(Debug, Default)]
pub struct CompileContext {
    variable_counts: BTreeMap<String, usize>,
}

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh script variable for `path`, unique within this compile.
    ///
    /// Derived from the path's last URI fragment so generated scripts stay
    /// readable; a per-path counter keeps repeated requests distinct.
    pub fn next_variable(&mut self, path: &str) -> String {
        let base = variable_base(path);
        let count = self
            .variable_counts
            .entry(path.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
        format!("{base}_{count}")
    }
}

fn variable_base(path: &str) -> String {
    let last_segment = path::segments(path).last().copied().unwrap_or(path);
    let fragment = last_segment
        .rsplit(['/', '#'])
        .next()
        .unwrap_or(last_segment);
    let base: String = fragment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if base.chars().all(|c| c == '_') {
        "value".to_string()
    } else {
        base
    }
}

/// One mapping input with its canonical path and decoded conditions.
#[derive(Debug)]
pub struct PreparedInput<'a> {
    pub instance: &'a MappingAttributePathInstance,
    pub canonical: String,
    pub conditions: FilterMap,
}

/// Whether a mapping's inputs co-occur within one repeating sub-entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubEntity {
    Same,
    Different,
}

/// Flush-relevant geometry of one mapping's inputs.
#[derive(Debug)]
pub struct MappingScope {
    /// Longest shared prefix of all input paths; collectors flush on it.
    pub common_input_path: String,
    /// Deepest input path as the schema ranks depth.
    pub deepest_input_path: String,
    pub sub_entity: SubEntity,
}

/// Derives the mapping scope from its prepared inputs.
///
/// XML-shaped input records carry a value-marker leaf on every path; those
/// are trimmed before any prefix or depth comparison.
pub fn mapping_scope(
    inputs: &[PreparedInput<'_>],
    schema: Option<&Schema>,
    xml_shape: bool,
) -> MappingScope {
    let flush_paths: Vec<&str> = inputs
        .iter()
        .map(|input| flush_path(&input.canonical, xml_shape))
        .collect();

    let common_input_path = path::common_prefix(flush_paths.iter().copied());

    let deepest_input_path = deepest_path(inputs, schema, xml_shape)
        .unwrap_or_else(|| path::RECORD_IDENTIFIER.to_string());

    let sub_entity = sub_entity_decision(inputs, schema).unwrap_or(SubEntity::Same);

    MappingScope {
        common_input_path,
        deepest_input_path,
        sub_entity,
    }
}

fn flush_path(canonical: &str, xml_shape: bool) -> &str {
    if xml_shape {
        path::trim_value_marker(canonical)
    } else {
        canonical
    }
}

fn deepest_path(
    inputs: &[PreparedInput<'_>],
    schema: Option<&Schema>,
    xml_shape: bool,
) -> Option<String> {
    let mut deepest: Option<(&PreparedInput<'_>, usize)> = None;
    for input in inputs {
        let mut depth = schema.map_or_else(
            || input.instance.attribute_path.depth(),
            |schema| schema.rank_depth(&input.instance.attribute_path),
        );
        if xml_shape && path::trim_value_marker(&input.canonical) != input.canonical {
            depth = depth.saturating_sub(1);
        }
        // Strict comparison keeps the first of equally deep paths.
        if deepest.is_none_or(|(_, best)| depth > best) {
            deepest = Some((input, depth));
        }
    }
    deepest.map(|(input, _)| flush_path(&input.canonical, xml_shape).to_string())
}

/// Content-schema heuristic deciding whether all inputs address the same
/// repeating sub-entity.
///
/// Only applies when the schema declares a key/value content schema and at
/// least two inputs sit on the value path; the decision then compares the
/// literal conditions the inputs attach to the shortest key path. `None`
/// means the heuristic does not apply.
fn sub_entity_decision(
    inputs: &[PreparedInput<'_>],
    schema: Option<&Schema>,
) -> Option<SubEntity> {
    let content_schema = schema?.content_schema.as_ref()?;
    let value_path = content_schema.value_attribute_path.as_ref()?;
    if content_schema.key_attribute_paths.is_empty() {
        return None;
    }

    let value_canonical = value_path.canonical();
    let on_value: Vec<&PreparedInput<'_>> = inputs
        .iter()
        .filter(|input| input.canonical == value_canonical)
        .collect();
    if on_value.len() < 2 {
        return None;
    }

    let shortest_key = content_schema
        .key_attribute_paths
        .iter()
        .min_by_key(|key| key.depth())?
        .canonical();

    let literals: Vec<&str> = on_value
        .iter()
        .filter_map(|input| {
            input
                .conditions
                .iter()
                .find(|(path, _)| *path == shortest_key)
                .map(|(_, condition)| condition.text.as_str())
        })
        .collect();

    if literals.len() < 2 {
        debug!("value-path inputs lack comparable key conditions, treating as different sub-entities");
        return Some(SubEntity::Different);
    }
    let first = literals[0];
    if literals.iter().all(|literal| *literal == first) {
        Some(SubEntity::Same)
    } else {
        Some(SubEntity::Different)
    }
}

#[cfg(test)]
mod tests {
    use morph_model::{ATTRIBUTE_DELIMITER, AttributePath, ContentSchema};

    use crate::filter::{FilterExpression, FilterKind};

    use super::*;

    fn join(parts: &[&str]) -> String {
        parts.join(&ATTRIBUTE_DELIMITER.to_string())
    }

    fn prepared<'a>(
        instance: &'a MappingAttributePathInstance,
        conditions: FilterMap,
    ) -> PreparedInput<'a> {
        PreparedInput {
            canonical: instance.attribute_path.canonical(),
            instance,
            conditions,
        }
    }

    #[test]
    fn variables_are_readable_and_unique() {
        let mut ctx = CompileContext::new();
        let path = join(&["http://example.com/record", "http://example.com/title"]);
        assert_eq!(ctx.next_variable(&path), "title_1");
        assert_eq!(ctx.next_variable(&path), "title_2");
        assert_eq!(ctx.next_variable("http://example.com/ns#creator"), "creator_1");
        assert_eq!(ctx.next_variable("///"), "value_1");
    }

    #[test]
    fn scope_of_sibling_inputs() {
        let a = MappingAttributePathInstance::new(
            "a",
            AttributePath::from_uris(["r", "person", "givenName"]),
        );
        let b = MappingAttributePathInstance::new(
            "b",
            AttributePath::from_uris(["r", "person", "family", "name"]),
        );
        let inputs = vec![prepared(&a, Vec::new()), prepared(&b, Vec::new())];
        let scope = mapping_scope(&inputs, None, false);
        assert_eq!(scope.common_input_path, join(&["r", "person"]));
        assert_eq!(
            scope.deepest_input_path,
            join(&["r", "person", "family", "name"])
        );
        assert_eq!(scope.sub_entity, SubEntity::Same);
    }

    #[test]
    fn equally_deep_paths_keep_the_first() {
        let a = MappingAttributePathInstance::new("a", AttributePath::from_uris(["r", "x"]));
        let b = MappingAttributePathInstance::new("b", AttributePath::from_uris(["r", "y"]));
        let inputs = vec![prepared(&a, Vec::new()), prepared(&b, Vec::new())];
        let scope = mapping_scope(&inputs, None, false);
        assert_eq!(scope.deepest_input_path, join(&["r", "x"]));
    }

    fn content_schema_fixture() -> Schema {
        Schema {
            attribute_paths: Vec::new(),
            content_schema: Some(ContentSchema {
                key_attribute_paths: vec![
                    AttributePath::from_uris(["r", "field", "tag", "sub"]),
                    AttributePath::from_uris(["r", "field", "tag"]),
                ],
                value_attribute_path: Some(AttributePath::from_uris(["r", "field", "value"])),
            }),
        }
    }

    #[test]
    fn matching_key_literals_mean_same_sub_entity() {
        let schema = content_schema_fixture();
        let key = join(&["r", "field", "tag"]);
        let a = MappingAttributePathInstance::new(
            "a",
            AttributePath::from_uris(["r", "field", "value"]),
        );
        let b = MappingAttributePathInstance::new(
            "b",
            AttributePath::from_uris(["r", "field", "value"]),
        );
        let same = vec![
            prepared(&a, vec![(key.clone(), FilterExpression::regexp("331"))]),
            prepared(&b, vec![(key.clone(), FilterExpression::regexp("331"))]),
        ];
        assert_eq!(
            mapping_scope(&same, Some(&schema), false).sub_entity,
            SubEntity::Same
        );

        let different = vec![
            prepared(&a, vec![(key.clone(), FilterExpression::regexp("331"))]),
            prepared(&b, vec![(key, FilterExpression::regexp("335"))]),
        ];
        assert_eq!(
            mapping_scope(&different, Some(&schema), false).sub_entity,
            SubEntity::Different
        );
    }

    #[test]
    fn key_conditions_count_regardless_of_comparison_kind() {
        let schema = content_schema_fixture();
        let key = join(&["r", "field", "tag"]);
        let equals = |text: &str| FilterExpression {
            kind: FilterKind::Equals,
            text: text.to_string(),
        };
        let a = MappingAttributePathInstance::new(
            "a",
            AttributePath::from_uris(["r", "field", "value"]),
        );
        let b = MappingAttributePathInstance::new(
            "b",
            AttributePath::from_uris(["r", "field", "value"]),
        );
        let inputs = vec![
            prepared(&a, vec![(key.clone(), equals("331"))]),
            prepared(&b, vec![(key, equals("331"))]),
        ];
        assert_eq!(
            mapping_scope(&inputs, Some(&schema), false).sub_entity,
            SubEntity::Same
        );
    }

    #[test]
    fn missing_key_conditions_mean_different_sub_entities() {
        let schema = content_schema_fixture();
        let a = MappingAttributePathInstance::new(
            "a",
            AttributePath::from_uris(["r", "field", "value"]),
        );
        let b = MappingAttributePathInstance::new(
            "b",
            AttributePath::from_uris(["r", "field", "value"]),
        );
        let inputs = vec![prepared(&a, Vec::new()), prepared(&b, Vec::new())];
        assert_eq!(
            mapping_scope(&inputs, Some(&schema), false).sub_entity,
            SubEntity::Different
        );
    }

    #[test]
    fn heuristic_defaults_to_same_when_inapplicable() {
        let a = MappingAttributePathInstance::new("a", AttributePath::from_uris(["r", "x"]));
        let inputs = vec![prepared(&a, Vec::new())];
        assert_eq!(mapping_scope(&inputs, None, false).sub_entity, SubEntity::Same);
    }
}
