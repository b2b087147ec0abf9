//! Component graph ordering.

use std::collections::BTreeMap;

use morph_model::Component;
use tracing::{debug, warn};

/// Borrowed view over one transformation's component graph.
///
/// Components reference each other by id; the arena resolves those ids once
/// so traversal works on indices.
pub struct ComponentArena<'a> {
    components: Vec<&'a Component>,
    by_id: BTreeMap<&'a str, usize>,
    inputs: Vec<Vec<usize>>,
}

impl<'a> ComponentArena<'a> {
    pub fn new(components: &'a [Component]) -> Self {
        let components: Vec<&Component> = components.iter().collect();
        let by_id: BTreeMap<&str, usize> = components
            .iter()
            .enumerate()
            .map(|(index, component)| (component.id.as_str(), index))
            .collect();
        let inputs = components
            .iter()
            .map(|component| {
                component
                    .input_components
                    .iter()
                    .filter_map(|id| {
                        let resolved = by_id.get(id.as_str()).copied();
                        if resolved.is_none() {
                            debug!(component = %component.id, input = %id, "input component id does not resolve, ignoring edge");
                        }
                        resolved
                    })
                    .collect()
            })
            .collect();
        Self {
            components,
            by_id,
            inputs,
        }
    }

    pub fn component_by_id(&self, id: &str) -> Option<&'a Component> {
        self.by_id.get(id).map(|&index| self.components[index])
    }

    /// Sink-first processing order.
    ///
    /// Walks breadth-first from the single sink towards the sources; within
    /// one layer components are taken in id order, so the result is stable
    /// across runs. Graphs without exactly one sink keep their declared
    /// order; components a sink-rooted walk cannot reach are appended in id
    /// order.
    pub fn sorted(&self) -> Vec<&'a Component> {
        let sinks: Vec<usize> = (0..self.components.len())
            .filter(|&index| self.components[index].output_components.is_empty())
            .collect();
        if sinks.len() != 1 {
            debug!(
                sinks = sinks.len(),
                "component graph has no unique sink, keeping declared order"
            );
            return self.components.clone();
        }

        let mut visited = vec![false; self.components.len()];
        let mut order = Vec::with_capacity(self.components.len());
        let mut layer = sinks;
        while !layer.is_empty() {
            layer.sort_by_key(|&index| self.components[index].id.as_str());
            let mut next = Vec::new();
            for index in layer {
                if visited[index] {
                    continue;
                }
                visited[index] = true;
                order.push(index);
                next.extend(self.inputs[index].iter().copied());
            }
            layer = next;
        }

        let mut unreachable: Vec<usize> = (0..self.components.len())
            .filter(|&index| !visited[index])
            .collect();
        if !unreachable.is_empty() {
            warn!(
                count = unreachable.len(),
                "components unreachable from the sink, appending in id order"
            );
            unreachable.sort_by_key(|&index| self.components[index].id.as_str());
            order.extend(unreachable);
        }

        order.into_iter().map(|index| self.components[index]).collect()
    }
}
