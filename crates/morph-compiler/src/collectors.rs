//! Code generation for transformation components.
//!
//! Within a transformation every component reads and writes script
//! variables; single-input components become `data` elements wrapping the
//! function, multi-input ones become the engine's collector elements.

use morph_model::Component;

use crate::context::{MappingScope, SubEntity};
use crate::error::{CompileError, Result};
use crate::path::RECORD_IDENTIFIER;
use crate::vocab;
use crate::xml::XmlElement;

/// Functions with dedicated code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Concat,
    Collect,
    MultiCollect,
    IfElse,
    BooleanAll,
    Lookup,
    RegexLookup,
    SetReplace,
    Whitelist,
    Blacklist,
    SqlMap,
    Other,
}

impl FunctionKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            vocab::FUNCTION_CONCAT => FunctionKind::Concat,
            vocab::FUNCTION_COLLECT => FunctionKind::Collect,
            vocab::FUNCTION_MULTI_COLLECT => FunctionKind::MultiCollect,
            vocab::FUNCTION_IFELSE => FunctionKind::IfElse,
            vocab::FUNCTION_ALL => FunctionKind::BooleanAll,
            vocab::FUNCTION_LOOKUP => FunctionKind::Lookup,
            vocab::FUNCTION_REGEXLOOKUP => FunctionKind::RegexLookup,
            vocab::FUNCTION_SETREPLACE => FunctionKind::SetReplace,
            vocab::FUNCTION_WHITELIST => FunctionKind::Whitelist,
            vocab::FUNCTION_BLACKLIST => FunctionKind::Blacklist,
            vocab::FUNCTION_SQLMAP => FunctionKind::SqlMap,
            _ => FunctionKind::Other,
        }
    }

    /// True for the functions backed by a table in the maps section.
    pub fn is_lookup(self) -> bool {
        matches!(
            self,
            FunctionKind::Lookup
                | FunctionKind::RegexLookup
                | FunctionKind::SetReplace
                | FunctionKind::Whitelist
                | FunctionKind::Blacklist
                | FunctionKind::SqlMap
        )
    }

    /// Attribute through which the generated element references its table.
    pub fn table_reference_attribute(self) -> Option<&'static str> {
        match self {
            FunctionKind::Lookup | FunctionKind::SqlMap => Some(vocab::ATTR_LOOKUP_IN),
            FunctionKind::RegexLookup | FunctionKind::SetReplace | FunctionKind::Whitelist
            | FunctionKind::Blacklist => Some(vocab::ATTR_LOOKUP_MAP),
            _ => None,
        }
    }
}

fn variable_ref(name: &str) -> String {
    format!("@{name}")
}

fn is_reserved_parameter(key: &str) -> bool {
    key == vocab::PARAM_INPUT_STRING
        || key == vocab::PARAM_LOOKUP_STRING
        || key.starts_with(vocab::OUTPUT_VARIABLE_PREFIX)
}

/// `data` element reading one variable and applying the wrapped function.
pub fn build_single_source(component: &Component, source: &str, target: &str) -> XmlElement {
    let mut data = XmlElement::new(vocab::ELEMENT_DATA)
        .with_attr(vocab::ATTR_SOURCE, variable_ref(source))
        .with_attr(vocab::ATTR_NAME, variable_ref(target));

    let kind = FunctionKind::from_name(component.function_name());
    let mut function = XmlElement::new(component.function_name());
    // A sqlmap's whole parameter set is table configuration; it lives in the
    // maps section and is only referenced by name here.
    if kind != FunctionKind::SqlMap {
        for (key, value) in component.parameter_mappings.iter() {
            if is_reserved_parameter(key) {
                continue;
            }
            function.set_attr(key, value);
        }
    }
    if let Some(reference) = kind.table_reference_attribute() {
        function.set_attr(reference, component.name.as_str());
    }
    data.push(function);
    data
}

/// Interpolation template joining `${source}` references.
fn interpolation(component: &Component, sources: &[String]) -> String {
    let delimiter = component
        .parameter_mappings
        .get(vocab::PARAM_DELIMITER)
        .unwrap_or("");
    let prefix = component
        .parameter_mappings
        .get(vocab::PARAM_PREFIX)
        .unwrap_or("");
    let postfix = component
        .parameter_mappings
        .get(vocab::PARAM_POSTFIX)
        .unwrap_or("");

    let mut value = String::from(prefix);
    for (index, source) in sources.iter().enumerate() {
        if index > 0 {
            value.push_str(delimiter);
        }
        value.push_str("${");
        value.push_str(source);
        value.push('}');
    }
    value.push_str(postfix);
    value
}

fn data_children(collector: &mut XmlElement, sources: &[String]) {
    for source in sources {
        collector.push(
            XmlElement::new(vocab::ELEMENT_DATA)
                .with_attr(vocab::ATTR_SOURCE, variable_ref(source))
                .with_attr(vocab::ATTR_NAME, source.as_str()),
        );
    }
}

/// Concatenation: a `combine` interpolating its sources in declared order.
pub fn build_concat(component: &Component, sources: &[String], target: &str) -> XmlElement {
    let mut combine = XmlElement::new(vocab::ELEMENT_COMBINE)
        .with_attr(vocab::ATTR_NAME, variable_ref(target))
        .with_attr(vocab::ATTR_VALUE, interpolation(component, sources))
        .with_attr(vocab::ATTR_RESET, vocab::BOOLEAN_TRUE);
    data_children(&mut combine, sources);
    combine
}

/// Collect family: a `combine` flushing on the mapping's common input path.
pub fn build_collect(
    component: &Component,
    sources: &[String],
    target: &str,
    scope: &MappingScope,
) -> XmlElement {
    let mut combine = XmlElement::new(vocab::ELEMENT_COMBINE)
        .with_attr(vocab::ATTR_NAME, variable_ref(target))
        .with_attr(vocab::ATTR_VALUE, interpolation(component, sources))
        .with_attr(vocab::ATTR_RESET, vocab::BOOLEAN_TRUE)
        .with_attr(vocab::ATTR_FLUSH_WITH, scope.common_input_path.as_str());
    data_children(&mut combine, sources);
    combine
}

/// Boolean conjunction over the sources, flush scope per sub-entity layout.
pub fn build_boolean_all(sources: &[String], target: &str, scope: &MappingScope) -> XmlElement {
    let mut all = XmlElement::new(vocab::ELEMENT_ALL)
        .with_attr(vocab::ATTR_NAME, variable_ref(target))
        .with_attr(vocab::ATTR_RESET, vocab::BOOLEAN_TRUE);
    match scope.sub_entity {
        SubEntity::Same => {
            all.set_attr(vocab::ATTR_FLUSH_WITH, scope.deepest_input_path.as_str());
        }
        SubEntity::Different => {
            all.set_attr(vocab::ATTR_FLUSH_WITH, RECORD_IDENTIFIER);
            all.set_attr(vocab::ATTR_INCLUDE_SUB_ENTITIES, vocab::BOOLEAN_TRUE);
        }
    }
    data_children(&mut all, sources);
    all
}

/// Fallback for multi-input functions without dedicated generation: the
/// function name becomes the collector element, its parameters attributes.
pub fn build_generic_collector(
    component: &Component,
    sources: &[String],
    target: &str,
) -> XmlElement {
    let mut collector = XmlElement::new(component.function_name())
        .with_attr(vocab::ATTR_NAME, variable_ref(target));
    for (key, value) in component.parameter_mappings.iter() {
        if is_reserved_parameter(key) {
            continue;
        }
        collector.set_attr(key, value);
    }
    data_children(&mut collector, sources);
    collector
}

/// If/else selection: stages both branch variables, then a `choose` that
/// prefers the `if` branch and falls back to the `else` branch.
pub fn build_ifelse(component: &Component, target: &str) -> Result<Vec<XmlElement>> {
    let if_source = component
        .parameter_mappings
        .get(vocab::PARAM_IF)
        .ok_or_else(|| {
            CompileError::configuration(format!(
                "ifelse component '{}' is missing its 'if' parameter",
                component.id
            ))
        })?;
    let else_source = component
        .parameter_mappings
        .get(vocab::PARAM_ELSE)
        .ok_or_else(|| {
            CompileError::configuration(format!(
                "ifelse component '{}' is missing its 'else' parameter",
                component.id
            ))
        })?;

    let if_variable = format!("{}.if", component.id);
    let else_variable = format!("{}.else", component.id);

    let stage_if = XmlElement::new(vocab::ELEMENT_DATA)
        .with_attr(vocab::ATTR_SOURCE, variable_ref(if_source))
        .with_attr(vocab::ATTR_NAME, variable_ref(&if_variable));
    let stage_else = XmlElement::new(vocab::ELEMENT_DATA)
        .with_attr(vocab::ATTR_SOURCE, variable_ref(else_source))
        .with_attr(vocab::ATTR_NAME, variable_ref(&else_variable));

    let mut choose = XmlElement::new(vocab::ELEMENT_CHOOSE)
        .with_attr(vocab::ATTR_NAME, variable_ref(target))
        .with_attr(vocab::ATTR_FLUSH_WITH, RECORD_IDENTIFIER);
    choose.push(
        XmlElement::new(vocab::ELEMENT_DATA)
            .with_attr(vocab::ATTR_SOURCE, variable_ref(&if_variable)),
    );
    choose.push(
        XmlElement::new(vocab::ELEMENT_DATA)
            .with_attr(vocab::ATTR_SOURCE, variable_ref(&else_variable)),
    );

    Ok(vec![stage_if, stage_else, choose])
}

#[cfg(test)]
mod tests {
    use morph_model::{Function, ParameterMap};

    use super::*;

    fn component(name: &str, parameters: ParameterMap) -> Component {
        Component {
            id: "c1".to_string(),
            name: format!("my {name}"),
            function: Function::Function {
                name: name.to_string(),
                parameters: vec![],
            },
            parameter_mappings: parameters,
            input_components: vec![],
            output_components: vec![],
        }
    }

    fn scope(common: &str, deepest: &str, sub_entity: SubEntity) -> MappingScope {
        MappingScope {
            common_input_path: common.to_string(),
            deepest_input_path: deepest.to_string(),
            sub_entity,
        }
    }

    #[test]
    fn single_source_wraps_the_function() {
        let replace = component(
            "replace",
            [("regexp", "a+"), ("with", "b"), ("inputString", "x")]
                .into_iter()
                .collect(),
        );
        let data = build_single_source(&replace, "x", "out");
        assert_eq!(data.attr("source"), Some("@x"));
        assert_eq!(data.attr("name"), Some("@out"));
        let function = data.find_child("replace").unwrap();
        assert_eq!(function.attr("regexp"), Some("a+"));
        assert_eq!(function.attr("with"), Some("b"));
        assert_eq!(function.attr("inputString"), None);
    }

    #[test]
    fn lookup_references_its_table_by_component_name() {
        let lookup = component(
            "lookup",
            [("lookupString", "{}")].into_iter().collect(),
        );
        let data = build_single_source(&lookup, "x", "out");
        let function = data.find_child("lookup").unwrap();
        assert_eq!(function.attr("in"), Some("my lookup"));
        assert_eq!(function.attr("lookupString"), None);

        let setreplace = component("setreplace", ParameterMap::new());
        let data = build_single_source(&setreplace, "x", "out");
        assert_eq!(
            data.find_child("setreplace").unwrap().attr("map"),
            Some("my setreplace")
        );
    }

    #[test]
    fn sqlmap_keeps_only_its_table_reference() {
        let sqlmap = component(
            "sqlmap",
            [("datasource", "jdbc:h2:mem"), ("query", "select 1"), ("inputString", "x")]
                .into_iter()
                .collect(),
        );
        let data = build_single_source(&sqlmap, "x", "out");
        let function = data.find_child("sqlmap").unwrap();
        assert_eq!(function.attr("in"), Some("my sqlmap"));
        assert_eq!(function.attr("datasource"), None);
        assert_eq!(function.attr("query"), None);
        assert_eq!(function.attributes().count(), 1);
    }

    #[test]
    fn concat_interpolates_declared_order() {
        let concat = component(
            "concat",
            [("delimiter", ", "), ("prefix", "["), ("postfix", "]")]
                .into_iter()
                .collect(),
        );
        let sources = vec!["first".to_string(), "second".to_string()];
        let combine = build_concat(&concat, &sources, "out");
        assert_eq!(combine.name(), "combine");
        assert_eq!(combine.attr("value"), Some("[${first}, ${second}]"));
        assert_eq!(combine.attr("reset"), Some("true"));
        assert_eq!(combine.attr("flushWith"), None);
        let children: Vec<_> = combine.child_elements().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attr("source"), Some("@first"));
        assert_eq!(children[0].attr("name"), Some("first"));
    }

    #[test]
    fn collect_flushes_on_the_common_input_path() {
        let collect = component("collect", ParameterMap::new());
        let sources = vec!["a".to_string(), "b".to_string()];
        let combine = build_collect(&collect, &sources, "out", &scope("r\u{1e}p", "r\u{1e}p\u{1e}q", SubEntity::Same));
        assert_eq!(combine.attr("flushWith"), Some("r\u{1e}p"));
        assert_eq!(combine.attr("value"), Some("${a}${b}"));
    }

    #[test]
    fn boolean_all_scopes_by_sub_entity() {
        let sources = vec!["a".to_string(), "b".to_string()];
        let same = build_boolean_all(&sources, "out", &scope("c", "deep", SubEntity::Same));
        assert_eq!(same.name(), "all");
        assert_eq!(same.attr("flushWith"), Some("deep"));
        assert_eq!(same.attr("includeSubEntities"), None);

        let different = build_boolean_all(&sources, "out", &scope("c", "deep", SubEntity::Different));
        assert_eq!(different.attr("flushWith"), Some("record"));
        assert_eq!(different.attr("includeSubEntities"), Some("true"));
    }

    #[test]
    fn ifelse_requires_both_branches() {
        let complete = component(
            "ifelse",
            [("if", "x"), ("else", "y")].into_iter().collect(),
        );
        let elements = build_ifelse(&complete, "out").unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].attr("name"), Some("@c1.if"));
        assert_eq!(elements[1].attr("name"), Some("@c1.else"));
        let choose = &elements[2];
        assert_eq!(choose.name(), "choose");
        assert_eq!(choose.attr("name"), Some("@out"));
        assert_eq!(choose.attr("flushWith"), Some("record"));
        let branches: Vec<_> = choose.child_elements().collect();
        assert_eq!(branches[0].attr("source"), Some("@c1.if"));
        assert_eq!(branches[1].attr("source"), Some("@c1.else"));

        let incomplete = component("ifelse", [("if", "x")].into_iter().collect());
        assert!(matches!(
            build_ifelse(&incomplete, "out"),
            Err(CompileError::Configuration(_))
        ));
    }

    #[test]
    fn generic_collector_uses_the_function_name() {
        let squash = component(
            "squash",
            [("delimiter", "-")].into_iter().collect(),
        );
        let sources = vec!["a".to_string(), "b".to_string()];
        let element = build_generic_collector(&squash, &sources, "out");
        assert_eq!(element.name(), "squash");
        assert_eq!(element.attr("name"), Some("@out"));
        assert_eq!(element.attr("delimiter"), Some("-"));
        assert_eq!(element.child_elements().count(), 2);
    }
}
