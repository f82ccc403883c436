//! Snapshot of the placeholder bindings of one inference call.

use std::{collections::BTreeMap, fmt};

use petgraph::{
    dot::{Config, Dot},
    graph::{DiGraph, NodeIndex},
};

use crate::{
    expr::{
        Expr, ExprKind,
        pretty::{PrettyExpr, PrettyMode},
    },
    placeholder::PlaceholderIndex,
};

/// Bindings ordered by placeholder index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    entries: BTreeMap<PlaceholderIndex, Expr>,
}

impl Topology {
    pub fn new(entries: impl IntoIterator<Item = (PlaceholderIndex, Expr)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, index: PlaceholderIndex) -> Option<&Expr> {
        self.entries.get(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceholderIndex, &Expr)> {
        self.entries.iter().map(|(index, expr)| (*index, expr))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dependency graph: one node per placeholder and per bound expression, an edge from
    /// each placeholder to its binding and from each binding to the placeholders it mentions.
    pub fn to_graph(&self) -> DiGraph<String, ()> {
        let mut graph = DiGraph::new();
        let mut placeholders: BTreeMap<PlaceholderIndex, NodeIndex> = BTreeMap::new();

        let mut placeholder_node = |graph: &mut DiGraph<String, ()>, index: PlaceholderIndex| {
            *placeholders
                .entry(index)
                .or_insert_with(|| graph.add_node(index.to_string()))
        };

        for (index, expr) in &self.entries {
            let source = placeholder_node(&mut graph, *index);
            let target = match expr.as_placeholder() {
                Some(alias) => placeholder_node(&mut graph, alias),
                None => {
                    let target = graph.add_node(expr.pretty_string(PrettyMode::Minimum));
                    let mut mentioned = Vec::new();
                    collect_placeholders(expr, &mut mentioned);
                    for other in mentioned {
                        let other = placeholder_node(&mut graph, other);
                        graph.add_edge(target, other, ());
                    }
                    target
                }
            };
            graph.add_edge(source, target, ());
        }
        graph
    }

    /// Graphviz rendering of [`Topology::to_graph`].
    pub fn to_dot(&self) -> String {
        let graph = self.to_graph();
        format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

fn collect_placeholders(expr: &Expr, out: &mut Vec<PlaceholderIndex>) {
    if let ExprKind::Placeholder(index) = expr.kind() {
        if !out.contains(index) {
            out.push(*index);
        }
        return;
    }
    for child in expr.children() {
        collect_placeholders(child, out);
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, expr) in &self.entries {
            writeln!(f, "{} := {}", index, expr.pretty_string(PrettyMode::Readable))?;
        }
        Ok(())
    }
}
