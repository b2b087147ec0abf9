//! Script compilation orchestrator.

use std::collections::BTreeSet;

use morph_model::{ATTRIBUTE_DELIMITER, Component, Mapping, Schema, Task};
use serde_json::Value;
use tracing::{debug, warn};

use crate::collectors::{self, FunctionKind};
use crate::context::{CompileContext, MappingScope, PreparedInput, mapping_scope};
use crate::entity_tree::{OutputSlot, attach_outputs};
use crate::error::{CompileError, Result};
use crate::filter::{self, FilterMap};
use crate::filter_collector;
use crate::graph::ComponentArena;
use crate::path;
use crate::vocab;
use crate::xml::{RenderOptions, XmlElement, render};

/// A finished script, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    document: XmlElement,
}

impl Script {
    pub fn document(&self) -> &XmlElement {
        &self.document
    }

    pub fn render(&self, options: &RenderOptions) -> Result<String> {
        render(&self.document, options)
    }
}

/// Variables one mapping input feeds, keyed by canonical path.
type BoundInputs = Vec<(String, Vec<String>)>;

/// Compiles one task into one script.
///
/// All mutable compile state lives here; every compile call builds its own
/// builder, so concurrent compiles never observe each other.
pub struct ScriptBuilder<'a> {
    task: &'a Task,
    ctx: CompileContext,
    rules: XmlElement,
    slots: Vec<OutputSlot>,
    maps: Vec<XmlElement>,
    registered_tables: BTreeSet<String>,
    metas: Vec<String>,
    skip_conditions: FilterMap,
    schema: Option<&'a Schema>,
    xml_shape: bool,
}

impl<'a> ScriptBuilder<'a> {
    pub fn compile(task: &'a Task) -> Result<Script> {
        let mut builder = Self {
            task,
            ctx: CompileContext::new(),
            rules: XmlElement::new(vocab::ELEMENT_RULES),
            slots: Vec::new(),
            maps: Vec::new(),
            registered_tables: BTreeSet::new(),
            metas: Vec::new(),
            skip_conditions: Vec::new(),
            schema: task.input_schema(),
            xml_shape: task.input_is_xml_shape(),
        };
        builder.run()?;
        Ok(Script {
            document: builder.assemble(),
        })
    }

    fn run(&mut self) -> Result<()> {
        let task = self.task;
        self.skip_conditions = filter::decode(
            task.job
                .skip_filter
                .as_ref()
                .and_then(morph_model::Filter::expression),
        )?;

        for mapping in &task.job.mappings {
            self.metas
                .push(format!("{}{}", vocab::MAPPING_META_PREFIX, mapping.id));
            self.compile_mapping(mapping)?;
        }
        Ok(())
    }

    fn assemble(mut self) -> XmlElement {
        let mut root = XmlElement::new(vocab::ELEMENT_ROOT)
            .with_attr("xmlns", vocab::SCRIPT_NAMESPACE)
            .with_attr(vocab::ATTR_ENTITY_MARKER, ATTRIBUTE_DELIMITER.to_string())
            .with_attr(vocab::ATTR_VERSION, vocab::SCRIPT_VERSION);

        let mut meta = XmlElement::new(vocab::ELEMENT_META);
        let mut name = XmlElement::new(vocab::ELEMENT_META_NAME);
        name.push_text(self.metas.join(", "));
        meta.push(name);
        root.push(meta);

        attach_outputs(&mut self.rules, self.slots);
        root.push(self.rules);

        if !self.maps.is_empty() {
            let mut maps = XmlElement::new(vocab::ELEMENT_MAPS);
            for map in self.maps {
                maps.push(map);
            }
            root.push(maps);
        }
        root
    }

    fn compile_mapping(&mut self, mapping: &'a Mapping) -> Result<()> {
        let inputs = self.prepare_inputs(mapping)?;
        if inputs.is_empty() {
            return Err(CompileError::input_incomplete(format!(
                "mapping '{}' declares no inputs",
                mapping.id
            )));
        }
        let scope = mapping_scope(&inputs, self.schema, self.xml_shape);

        match &mapping.transformation {
            None => {
                self.delegate_input_to_output(mapping, &inputs, &scope)?;
            }
            Some(transformation) if transformation.parameter_mappings.is_empty() => {
                let variable = self.delegate_input_to_output(mapping, &inputs, &scope)?;
                let bound = vec![(inputs[0].canonical.clone(), vec![variable])];
                self.process_transformation(mapping, transformation, &bound, &scope)?;
            }
            Some(transformation) => {
                let mut bound: BoundInputs = Vec::new();
                for input in &inputs {
                    let variables = parameter_keys_for(transformation, &input.instance.name);
                    if variables.is_empty() {
                        debug!(
                            mapping = %mapping.id,
                            input = %input.instance.name,
                            "no parameter mapping references this input, skipping"
                        );
                        continue;
                    }
                    for variable in &variables {
                        self.bind_input(input, variable)?;
                    }
                    bound.push((input.canonical.clone(), variables));
                }
                self.bind_output(mapping, transformation, &scope);
                self.process_transformation(mapping, transformation, &bound, &scope)?;
            }
        }
        Ok(())
    }

    fn prepare_inputs(&self, mapping: &'a Mapping) -> Result<Vec<PreparedInput<'a>>> {
        let mut prepared = Vec::with_capacity(mapping.inputs.len());
        for instance in &mapping.inputs {
            let mut conditions = filter::decode(instance.filter_expression())?;
            // A record failing the skip filter must feed no input at all.
            conditions.extend(self.skip_conditions.iter().cloned());
            prepared.push(PreparedInput {
                canonical: instance.attribute_path.canonical(),
                instance,
                conditions,
            });
        }
        Ok(prepared)
    }

    /// Wires the first input straight to the output; returns the variable
    /// carrying the value.
    fn delegate_input_to_output(
        &mut self,
        mapping: &Mapping,
        inputs: &[PreparedInput<'_>],
        scope: &MappingScope,
    ) -> Result<String> {
        let input = &inputs[0];
        let variable = self.ctx.next_variable(&input.canonical);
        self.bind_input(input, &variable)?;
        self.push_output_slot(mapping, &variable, scope);
        Ok(variable)
    }

    /// Emits the elements defining `@target` from one input path.
    ///
    /// With an ordinal the value is staged through the `.occurrence`
    /// variable and narrowed by an `<occurrence only>` stage; with filter
    /// conditions the value passes through the guarded collector.
    fn bind_input(&mut self, input: &PreparedInput<'_>, target: &str) -> Result<()> {
        let write_target = match input.instance.ordinal {
            Some(_) => format!("{target}{}", vocab::OCCURRENCE_VARIABLE_POSTFIX),
            None => target.to_string(),
        };

        if input.conditions.is_empty() {
            self.rules.push(
                XmlElement::new(vocab::ELEMENT_DATA)
                    .with_attr(vocab::ATTR_SOURCE, input.canonical.as_str())
                    .with_attr(vocab::ATTR_NAME, format!("@{write_target}")),
            );
        } else {
            let collector = filter_collector::build(
                &mut self.ctx,
                &input.canonical,
                &input.conditions,
                &write_target,
                self.xml_shape,
            )?;
            self.rules.push(collector);
        }

        if let Some(ordinal) = input.instance.ordinal {
            let mut narrowed = XmlElement::new(vocab::ELEMENT_DATA)
                .with_attr(vocab::ATTR_SOURCE, format!("@{write_target}"))
                .with_attr(vocab::ATTR_NAME, format!("@{target}"));
            narrowed.push(
                XmlElement::new(vocab::ELEMENT_OCCURRENCE)
                    .with_attr(vocab::ATTR_ONLY, ordinal.to_string()),
            );
            self.rules.push(narrowed);
        }
        Ok(())
    }

    /// Records output slots for the parameter keys carrying the reserved
    /// output prefix.
    fn bind_output(&mut self, mapping: &Mapping, transformation: &Component, scope: &MappingScope) {
        let output_variables: Vec<&str> = transformation
            .parameter_mappings
            .keys()
            .filter(|key| key.starts_with(vocab::OUTPUT_VARIABLE_PREFIX))
            .collect();
        if output_variables.is_empty() {
            debug!(mapping = %mapping.id, "transformation declares no output variable");
        }
        for variable in output_variables {
            self.push_output_slot(mapping, variable, scope);
        }
    }

    fn push_output_slot(&mut self, mapping: &Mapping, variable: &str, scope: &MappingScope) {
        let uris: Vec<&str> = mapping
            .output
            .attribute_path
            .attributes
            .iter()
            .map(|attribute| attribute.uri.as_str())
            .collect();
        let Some((leaf, prefix)) = uris.split_last() else {
            debug!(mapping = %mapping.id, "output path has no attributes, skipping slot");
            return;
        };
        let element = XmlElement::new(vocab::ELEMENT_DATA)
            .with_attr(vocab::ATTR_SOURCE, format!("@{variable}"))
            .with_attr(vocab::ATTR_NAME, *leaf);
        self.slots.push(OutputSlot {
            prefix_segments: prefix.iter().map(|uri| (*uri).to_string()).collect(),
            flush_path: scope.common_input_path.clone(),
            element,
        });
    }

    fn process_transformation(
        &mut self,
        mapping: &Mapping,
        transformation: &Component,
        bound: &BoundInputs,
        scope: &MappingScope,
    ) -> Result<()> {
        let Some(inner) = transformation.function.as_transformation() else {
            warn!(
                mapping = %mapping.id,
                function = %transformation.function_name(),
                "builtin function at mapping level is unsupported, skipping"
            );
            return Ok(());
        };

        let output_variable = transformation
            .parameter_mappings
            .keys()
            .find(|key| key.starts_with(vocab::OUTPUT_VARIABLE_PREFIX))
            .unwrap_or(vocab::OUTPUT_VARIABLE_PREFIX)
            .to_string();
        let first_variable = bound
            .first()
            .and_then(|(_, variables)| variables.first())
            .cloned();

        if inner.components.is_empty() {
            match first_variable {
                Some(variable) => {
                    // Degenerate transformation: pass the value through.
                    self.rules.push(
                        XmlElement::new(vocab::ELEMENT_DATA)
                            .with_attr(vocab::ATTR_SOURCE, format!("@{variable}"))
                            .with_attr(vocab::ATTR_NAME, format!("@{output_variable}")),
                    );
                }
                None => {
                    debug!(mapping = %mapping.id, "empty transformation with nothing bound");
                }
            }
            return Ok(());
        }

        let arena = ComponentArena::new(&inner.components);
        for component in arena.sorted() {
            self.process_component(component, &arena, first_variable.as_deref(), &output_variable, scope)?;
        }
        self.register_lookup_tables(&inner.components)?;
        Ok(())
    }

    fn process_component(
        &mut self,
        component: &Component,
        arena: &ComponentArena<'_>,
        first_variable: Option<&str>,
        output_variable: &str,
        scope: &MappingScope,
    ) -> Result<()> {
        let sources = component_sources(component, arena, first_variable)?;
        if sources.is_empty() {
            debug!(component = %component.id, "component has no sources, skipping");
            return Ok(());
        }
        let target = if component.output_components.is_empty() {
            output_variable.to_string()
        } else {
            component.name.clone()
        };

        let kind = FunctionKind::from_name(component.function_name());
        match kind {
            FunctionKind::IfElse => {
                for element in collectors::build_ifelse(component, &target)? {
                    self.rules.push(element);
                }
            }
            _ if sources.len() == 1 => {
                self.rules
                    .push(collectors::build_single_source(component, &sources[0], &target));
            }
            FunctionKind::Concat => {
                self.rules
                    .push(collectors::build_concat(component, &sources, &target));
            }
            FunctionKind::Collect | FunctionKind::MultiCollect => {
                self.rules
                    .push(collectors::build_collect(component, &sources, &target, scope));
            }
            FunctionKind::BooleanAll => {
                self.rules
                    .push(collectors::build_boolean_all(&sources, &target, scope));
            }
            _ => {
                self.rules
                    .push(collectors::build_generic_collector(component, &sources, &target));
            }
        }
        Ok(())
    }

    /// Registers lookup tables in the maps section, once per component name.
    fn register_lookup_tables(&mut self, components: &[Component]) -> Result<()> {
        for component in components {
            let kind = FunctionKind::from_name(component.function_name());
            if !kind.is_lookup() || !self.registered_tables.insert(component.name.clone()) {
                continue;
            }

            if kind == FunctionKind::SqlMap {
                let mut sqlmap = XmlElement::new(vocab::ELEMENT_SQLMAP)
                    .with_attr(vocab::ATTR_NAME, component.name.as_str());
                for (key, value) in component.parameter_mappings.iter() {
                    if key == vocab::PARAM_INPUT_STRING
                        || key.starts_with(vocab::OUTPUT_VARIABLE_PREFIX)
                    {
                        continue;
                    }
                    sqlmap.set_attr(key, value);
                }
                self.maps.push(sqlmap);
                continue;
            }

            let mut map = XmlElement::new(vocab::ELEMENT_MAP)
                .with_attr(vocab::ATTR_NAME, component.name.as_str());
            if let Some(payload) = component.parameter_mappings.get(vocab::PARAM_LOOKUP_STRING) {
                for entry in decode_table(component, kind, payload)? {
                    map.push(entry);
                }
            } else {
                debug!(component = %component.id, "lookup component carries no table payload");
            }
            self.maps.push(map);
        }
        Ok(())
    }
}

/// Resolves the variables a component reads, in priority order: the
/// `inputString` parameter, its input components' names, the first bound
/// mapping variable.
fn component_sources(
    component: &Component,
    arena: &ComponentArena<'_>,
    first_variable: Option<&str>,
) -> Result<Vec<String>> {
    if let Some(input_string) = component.parameter_mappings.get(vocab::PARAM_INPUT_STRING) {
        let mut sources = Vec::new();
        for source in input_string.split(',') {
            let source = source.trim();
            if !source.is_empty() && !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }
        return Ok(sources);
    }

    if !component.input_components.is_empty() {
        let mut sources = Vec::new();
        for id in &component.input_components {
            let Some(source) = arena.component_by_id(id) else {
                continue;
            };
            if source.name.is_empty() {
                return Err(CompileError::input_incomplete(format!(
                    "component '{}' has no name to reference it by",
                    source.id
                )));
            }
            if !sources.iter().any(|s| s == &source.name) {
                sources.push(source.name.clone());
            }
        }
        return Ok(sources);
    }

    Ok(first_variable.map_or_else(Vec::new, |variable| vec![variable.to_string()]))
}

/// Keys of the transformation's parameter mappings whose value names the
/// given input alias; each key is one script variable to bind.
fn parameter_keys_for(transformation: &Component, alias: &str) -> Vec<String> {
    transformation
        .parameter_mappings
        .iter()
        .filter(|(key, value)| {
            !key.starts_with(vocab::OUTPUT_VARIABLE_PREFIX)
                && path::unescape_markup(value) == alias
        })
        .map(|(key, _)| key.to_string())
        .collect()
}

/// Decodes one lookup table payload into its entry elements.
fn decode_table(
    component: &Component,
    kind: FunctionKind,
    payload: &str,
) -> Result<Vec<XmlElement>> {
    let value: Value = serde_json::from_str(payload).map_err(|e| {
        CompileError::conversion(format!(
            "lookup table payload of component '{}' is not valid JSON: {e}",
            component.id
        ))
    })?;

    match kind {
        FunctionKind::Whitelist | FunctionKind::Blacklist => {
            let Value::Array(items) = value else {
                return Err(CompileError::conversion(format!(
                    "table payload of component '{}' must be a string list",
                    component.id
                )));
            };
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(XmlElement::new(vocab::ELEMENT_MAP_ENTRY)
                        .with_attr(vocab::ATTR_NAME, name)),
                    other => Err(CompileError::conversion(format!(
                        "table entry of component '{}' must be a string, got {other}",
                        component.id
                    ))),
                })
                .collect()
        }
        _ => {
            let Value::Object(entries) = value else {
                return Err(CompileError::conversion(format!(
                    "table payload of component '{}' must be an object",
                    component.id
                )));
            };
            entries
                .into_iter()
                .map(|(name, item)| match item {
                    Value::String(text) => Ok(XmlElement::new(vocab::ELEMENT_MAP_ENTRY)
                        .with_attr(vocab::ATTR_NAME, name)
                        .with_attr(vocab::ATTR_VALUE, text)),
                    other => Err(CompileError::conversion(format!(
                        "table entry '{name}' of component '{}' must be a string, got {other}",
                        component.id
                    ))),
                })
                .collect()
        }
    }
}
