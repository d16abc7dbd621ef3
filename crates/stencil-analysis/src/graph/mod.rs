//! Inheritance graph builder: corpus-wide extends edges and classification.
//!
//! Runs single-threaded after all per-template facts are available. Parents
//! named by `extends` are recorded even when they are not part of the
//! corpus (external bases). Cycles among corpus-internal templates are a
//! corpus-level error: the map and edges (plain facts) survive, the
//! base/child/orphan classification does not.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Per-template input assembled by the pipeline.
#[derive(Debug, Clone)]
pub struct GraphInput {
    pub name: String,
    pub extends: Option<String>,
    pub blocks: Vec<String>,
    pub super_calls: u32,
}

/// One entry of the serialized inheritance map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritanceEntry {
    pub extends: Option<String>,
    pub blocks: Vec<String>,
    pub super_calls: u32,
}

/// The corpus inheritance analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InheritanceGraph {
    /// Children and candidate bases, keyed by template name.
    pub inheritance_map: BTreeMap<String, InheritanceEntry>,
    /// `(child, parent)` extends relations in corpus order.
    pub edges: Vec<(String, String)>,
    pub base_templates: Vec<String>,
    pub child_templates: Vec<String>,
    pub orphaned_templates: Vec<String>,
    /// A template on a detected extends-cycle, if any.
    #[serde(skip)]
    pub cycle: Option<String>,
}

/// Build the inheritance graph from all templates' facts.
pub fn build(inputs: &[GraphInput]) -> InheritanceGraph {
    let mut graph = InheritanceGraph::default();
    let corpus: FxHashSet<&str> = inputs.iter().map(|t| t.name.as_str()).collect();

    let mut bases: BTreeSet<String> = BTreeSet::new();
    let mut children: BTreeSet<String> = BTreeSet::new();
    let mut orphans: BTreeSet<String> = BTreeSet::new();

    for t in inputs {
        if let Some(parent) = &t.extends {
            graph.edges.push((t.name.clone(), parent.clone()));
            children.insert(t.name.clone());
            bases.insert(parent.clone());
            graph.inheritance_map.insert(
                t.name.clone(),
                InheritanceEntry {
                    extends: Some(parent.clone()),
                    blocks: t.blocks.clone(),
                    super_calls: t.super_calls,
                },
            );
        } else if !t.blocks.is_empty() {
            // candidate base: defines overridable blocks, extends nothing
            bases.insert(t.name.clone());
            graph.inheritance_map.insert(
                t.name.clone(),
                InheritanceEntry {
                    extends: None,
                    blocks: t.blocks.clone(),
                    super_calls: t.super_calls,
                },
            );
        } else {
            orphans.insert(t.name.clone());
        }
    }

    if let Some(template) = detect_cycle(&graph.edges, &corpus) {
        graph.cycle = Some(template);
        return graph;
    }

    graph.base_templates = bases.into_iter().collect();
    graph.child_templates = children.into_iter().collect();
    graph.orphaned_templates = orphans.into_iter().collect();
    graph
}

/// Find a template on an extends-cycle among corpus-internal edges.
fn detect_cycle(edges: &[(String, String)], corpus: &FxHashSet<&str>) -> Option<String> {
    let mut dg: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (child, parent) in edges {
        if child == parent {
            // GraphMap cannot hold self-loops; a self-extends is trivially a cycle
            return Some(child.clone());
        }
        if corpus.contains(parent.as_str()) {
            dg.add_edge(child.as_str(), parent.as_str(), ());
        }
    }
    toposort(&dg, None)
        .err()
        .map(|cycle| cycle.node_id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, extends: Option<&str>, blocks: &[&str]) -> GraphInput {
        GraphInput {
            name: name.to_string(),
            extends: extends.map(String::from),
            blocks: blocks.iter().map(|b| b.to_string()).collect(),
            super_calls: 0,
        }
    }

    #[test]
    fn child_and_base_classification() {
        let graph = build(&[
            input("T1", Some("base.tmpl"), &[]),
            input("base.tmpl", None, &["body"]),
        ]);
        assert_eq!(graph.base_templates, vec!["base.tmpl"]);
        assert_eq!(graph.child_templates, vec!["T1"]);
        assert!(graph.orphaned_templates.is_empty());
        assert_eq!(graph.edges, vec![("T1".to_string(), "base.tmpl".to_string())]);
    }

    #[test]
    fn external_parent_is_still_a_base() {
        let graph = build(&[input("child.tmpl", Some("missing.tmpl"), &[])]);
        assert_eq!(graph.base_templates, vec!["missing.tmpl"]);
        assert_eq!(graph.child_templates, vec!["child.tmpl"]);
        assert!(graph.cycle.is_none());
    }

    #[test]
    fn orphans_neither_extend_nor_define_blocks() {
        let graph = build(&[
            input("standalone.tmpl", None, &[]),
            input("layout.tmpl", None, &["main"]),
        ]);
        assert_eq!(graph.orphaned_templates, vec!["standalone.tmpl"]);
        // a block-definer without children is a candidate base
        assert_eq!(graph.base_templates, vec!["layout.tmpl"]);
        assert!(graph.inheritance_map.contains_key("layout.tmpl"));
        assert!(!graph.inheritance_map.contains_key("standalone.tmpl"));
    }

    #[test]
    fn cycle_clears_classification_but_keeps_facts() {
        let graph = build(&[
            input("a.tmpl", Some("b.tmpl"), &[]),
            input("b.tmpl", Some("a.tmpl"), &[]),
        ]);
        assert!(graph.cycle.is_some());
        assert!(graph.base_templates.is_empty());
        assert!(graph.child_templates.is_empty());
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.inheritance_map.len(), 2);
    }

    #[test]
    fn self_extends_is_a_cycle() {
        let graph = build(&[input("a.tmpl", Some("a.tmpl"), &[])]);
        assert_eq!(graph.cycle.as_deref(), Some("a.tmpl"));
    }

    #[test]
    fn chain_through_external_base_is_not_a_cycle() {
        let graph = build(&[
            input("page.tmpl", Some("section.tmpl"), &[]),
            input("section.tmpl", Some("shared/base.tmpl"), &["body"]),
        ]);
        assert!(graph.cycle.is_none());
        assert_eq!(
            graph.base_templates,
            vec!["section.tmpl", "shared/base.tmpl"]
        );
    }
}
