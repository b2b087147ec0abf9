//! Filtered value collection.
//!
//! A mapping input with filter conditions becomes a guarded `combine`: the
//! value is staged into an inner variable, and an `if`/`all` guard only lets
//! the combine fire when every condition matched within the same entity.

use crate::context::CompileContext;
use crate::error::Result;
use crate::filter::{FilterExpression, FilterKind, FilterMap};
use crate::path;
use crate::vocab;
use crate::xml::XmlElement;

/// Builds the guarded collector for one filtered input.
///
/// `value_path` is the input's canonical path, `target` the variable the
/// collector defines. A condition keyed by the value path itself is applied
/// directly to the staged value; all other conditions move into the guard.
pub fn build(
    ctx: &mut CompileContext,
    value_path: &str,
    conditions: &FilterMap,
    target: &str,
    xml_shape: bool,
) -> Result<XmlElement> {
    let inner_variable = ctx.next_variable(value_path);

    let mut combine = XmlElement::new(vocab::ELEMENT_COMBINE)
        .with_attr(vocab::ATTR_NAME, format!("@{target}"))
        .with_attr(vocab::ATTR_VALUE, format!("${{{inner_variable}}}"))
        .with_attr(vocab::ATTR_RESET, vocab::BOOLEAN_TRUE)
        .with_attr(vocab::ATTR_SAME_ENTITY, vocab::BOOLEAN_TRUE)
        .with_attr(vocab::ATTR_INCLUDE_SUB_ENTITIES, vocab::BOOLEAN_TRUE);

    let mut value_element = XmlElement::new(vocab::ELEMENT_DATA)
        .with_attr(vocab::ATTR_SOURCE, value_path)
        .with_attr(vocab::ATTR_NAME, inner_variable);

    // A condition on the value path itself tests the staged value directly;
    // only meaningful when other conditions remain for the guard.
    let mut guarded: Vec<&(String, FilterExpression)> = conditions.iter().collect();
    if conditions.len() >= 2
        && let Some(position) = guarded.iter().position(|(p, _)| p == value_path)
    {
        let (_, condition) = guarded.remove(position);
        value_element.push(test_element(condition));
    }

    if guarded.is_empty() {
        let flush = if xml_shape {
            path::trim_value_marker(value_path)
        } else {
            value_path
        };
        combine.set_attr(vocab::ATTR_FLUSH_WITH, flush);
        combine.push(value_element);
        return Ok(combine);
    }

    let mut guard_paths: Vec<&str> = guarded.iter().map(|(p, _)| p.as_str()).collect();
    guard_paths.push(value_path);
    let flush_paths: Vec<&str> = guard_paths
        .iter()
        .map(|p| if xml_shape { path::trim_value_marker(p) } else { p })
        .collect();
    let guard_flush = path::common_prefix(flush_paths.iter().copied());

    let mut all = XmlElement::new(vocab::ELEMENT_ALL)
        .with_attr(vocab::ATTR_RESET, vocab::BOOLEAN_TRUE)
        .with_attr(vocab::ATTR_FLUSH_WITH, guard_flush);
    for (condition_path, condition) in guarded {
        let mut data = XmlElement::new(vocab::ELEMENT_DATA)
            .with_attr(vocab::ATTR_SOURCE, condition_path.as_str());
        data.push(test_element(condition));
        all.push(data);
    }
    let mut guard = XmlElement::new(vocab::ELEMENT_IF);
    guard.push(all);

    combine.push(guard);
    combine.push(value_element);
    Ok(combine)
}

/// The test element a condition compiles to.
fn test_element(condition: &FilterExpression) -> XmlElement {
    match condition.kind {
        FilterKind::Regexp => XmlElement::new(vocab::ELEMENT_REGEXP)
            .with_attr(vocab::ATTR_MATCH, condition.text.as_str()),
        FilterKind::Numeric => XmlElement::new(vocab::ELEMENT_NUMERIC)
            .with_attr(vocab::ATTR_EXPRESSION, condition.text.as_str()),
        FilterKind::Equals => XmlElement::new(vocab::ELEMENT_EQUALS)
            .with_attr(vocab::ATTR_STRING, condition.text.as_str()),
        FilterKind::NotEquals => XmlElement::new(vocab::ELEMENT_NOT_EQUALS)
            .with_attr(vocab::ATTR_STRING, condition.text.as_str()),
    }
}
