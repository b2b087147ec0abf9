//! Output entity tree assembly.
//!
//! Every mapping ends in an output slot: the leaf element writing the final
//! value, plus the output path's entity prefix. Slots sharing a prefix share
//! the entity elements wrapping them, so the rules section mirrors the
//! output schema's hierarchy with each entity declared once.

use std::collections::BTreeMap;
use std::mem;

use crate::vocab;
use crate::xml::XmlElement;

/// One mapping's contribution to the rules section.
#[derive(Debug)]
pub struct OutputSlot {
    /// Entity segments wrapping the leaf, outermost first. Empty when the
    /// output path has a single attribute.
    pub prefix_segments: Vec<String>,
    /// Element the root entity of this slot flushes on.
    pub flush_path: String,
    /// The leaf element writing the value.
    pub element: XmlElement,
}

#[derive(Debug, Default)]
struct EntityBuf {
    segment: String,
    flush: Option<String>,
    children: Vec<EntityChild>,
}

#[derive(Debug)]
enum EntityChild {
    Entity(usize),
    Leaf(XmlElement),
}

/// Attaches `slots` under `rules`, sharing entity wrappers per prefix.
///
/// Slots are grouped by prefix in sorted order; within one prefix the leaves
/// keep their arrival order.
pub fn attach_outputs(rules: &mut XmlElement, slots: Vec<OutputSlot>) {
    let mut arena: Vec<EntityBuf> = Vec::new();
    let mut by_prefix: BTreeMap<Vec<String>, usize> = BTreeMap::new();
    let mut roots: Vec<usize> = Vec::new();

    let mut ordered = slots;
    ordered.sort_by(|a, b| a.prefix_segments.cmp(&b.prefix_segments));

    for slot in ordered {
        if slot.prefix_segments.is_empty() {
            rules.push(slot.element);
            continue;
        }
        let index = entity_for_prefix(
            &slot.prefix_segments,
            &slot.flush_path,
            &mut arena,
            &mut by_prefix,
            &mut roots,
        );
        arena[index].children.push(EntityChild::Leaf(slot.element));
    }

    for root in roots {
        let entity = materialize(root, &mut arena, true);
        rules.push(entity);
    }
}

fn entity_for_prefix(
    prefix: &[String],
    flush_path: &str,
    arena: &mut Vec<EntityBuf>,
    by_prefix: &mut BTreeMap<Vec<String>, usize>,
    roots: &mut Vec<usize>,
) -> usize {
    if let Some(&index) = by_prefix.get(prefix) {
        return index;
    }

    let index = arena.len();
    arena.push(EntityBuf {
        segment: prefix[prefix.len() - 1].clone(),
        flush: None,
        children: Vec::new(),
    });
    by_prefix.insert(prefix.to_vec(), index);

    if prefix.len() == 1 {
        arena[index].flush = Some(flush_path.to_string());
        roots.push(index);
    } else {
        let parent = entity_for_prefix(&prefix[..prefix.len() - 1], flush_path, arena, by_prefix, roots);
        arena[parent].children.push(EntityChild::Entity(index));
    }
    index
}

fn materialize(index: usize, arena: &mut [EntityBuf], root: bool) -> XmlElement {
    let segment = mem::take(&mut arena[index].segment);
    let flush = arena[index].flush.take();
    let children = mem::take(&mut arena[index].children);

    let mut entity = XmlElement::new(vocab::ELEMENT_ENTITY).with_attr(vocab::ATTR_NAME, segment);
    if root {
        if let Some(flush) = flush {
            entity.set_attr(vocab::ATTR_FLUSH_WITH, flush);
        }
        entity.set_attr(vocab::ATTR_RESET, vocab::BOOLEAN_TRUE);
    }
    for child in children {
        match child {
            EntityChild::Entity(nested) => entity.push(materialize(nested, arena, false)),
            EntityChild::Leaf(leaf) => entity.push(leaf),
        }
    }
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> XmlElement {
        XmlElement::new("data")
            .with_attr("source", format!("@{name}"))
            .with_attr("name", name)
    }

    fn slot(prefix: &[&str], flush: &str, name: &str) -> OutputSlot {
        OutputSlot {
            prefix_segments: prefix.iter().map(|s| (*s).to_string()).collect(),
            flush_path: flush.to_string(),
            element: leaf(name),
        }
    }

    #[test]
    fn flat_outputs_go_directly_into_rules() {
        let mut rules = XmlElement::new("rules");
        attach_outputs(&mut rules, vec![slot(&[], "record", "title")]);
        let children: Vec<_> = rules.child_elements().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "data");
    }

    #[test]
    fn shared_prefixes_share_entity_wrappers() {
        let mut rules = XmlElement::new("rules");
        attach_outputs(
            &mut rules,
            vec![
                slot(&["person", "name"], "record", "given"),
                slot(&["person", "name"], "record", "family"),
                slot(&["person"], "record", "age"),
            ],
        );

        let entities: Vec<_> = rules.child_elements().collect();
        assert_eq!(entities.len(), 1);
        let person = entities[0];
        assert_eq!(person.name(), "entity");
        assert_eq!(person.attr("name"), Some("person"));
        assert_eq!(person.attr("flushWith"), Some("record"));
        assert_eq!(person.attr("reset"), Some("true"));

        let person_children: Vec<_> = person.child_elements().collect();
        assert_eq!(person_children.len(), 2);
        let age = person_children[0];
        assert_eq!(age.name(), "data");
        assert_eq!(age.attr("name"), Some("age"));

        let name = person_children[1];
        assert_eq!(name.name(), "entity");
        assert_eq!(name.attr("name"), Some("name"));
        // Nested entities carry no flush attributes of their own.
        assert_eq!(name.attr("flushWith"), None);
        assert_eq!(name.attr("reset"), None);
        let leaves: Vec<_> = name.child_elements().collect();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].attr("name"), Some("given"));
        assert_eq!(leaves[1].attr("name"), Some("family"));
    }

    #[test]
    fn distinct_roots_become_separate_entities() {
        let mut rules = XmlElement::new("rules");
        attach_outputs(
            &mut rules,
            vec![
                slot(&["work"], "record", "title"),
                slot(&["agent"], "record", "label"),
            ],
        );
        let names: Vec<Option<&str>> = rules.child_elements().map(|e| e.attr("name")).collect();
        assert_eq!(names, vec![Some("agent"), Some("work")]);
    }
}
