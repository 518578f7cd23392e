//! Declaration/use graph of one compilation unit.
//!
//! Symbols and references are nodes; a [`RefEdge::Resolves`] edge runs from
//! each use to the declaration it names. An unresolved use has no outgoing
//! edge, an unused declaration has no incoming one.

use crate::symbols::{RefTarget, Reference, Symbol, SymbolCategory, SymbolTable};
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum RefNode<'t> {
    Declaration(&'t Symbol),
    Use(&'t Reference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefEdge {
    /// From a use to the symbol it names.
    Resolves,
}

impl RefEdge {
    pub fn label(self) -> &'static str {
        match self {
            RefEdge::Resolves => "resolves",
        }
    }
}

/// Reference graph borrowed from a [`SymbolTable`].
pub struct ReferenceGraph<'t> {
    graph: DiGraph<RefNode<'t>, RefEdge>,
    declarations: IndexMap<(SymbolCategory, &'t str), NodeIndex>,
    uses: Vec<NodeIndex>,
}

impl<'t> ReferenceGraph<'t> {
    pub fn build(table: &'t SymbolTable) -> Self {
        let mut graph = DiGraph::new();
        let mut declarations = IndexMap::new();
        let mut resources: HashMap<(SymbolCategory, &'t str), NodeIndex> = HashMap::new();

        // Phase 1: declaration nodes
        for symbol in table.symbols() {
            let idx = graph.add_node(RefNode::Declaration(symbol));
            declarations.insert((symbol.category, symbol.name.as_str()), idx);
            if let Some(path) = symbol.resource.as_ref().and_then(|p| p.to_str()) {
                resources.entry((symbol.category, path)).or_insert(idx);
            }
        }

        // Phase 2: use nodes and the edges they resolve through
        let mut uses = Vec::with_capacity(table.references().len());
        for reference in table.references() {
            let idx = graph.add_node(RefNode::Use(reference));
            uses.push(idx);

            let target = match &reference.target {
                RefTarget::Name(name) => declarations.get(&(reference.category, name.as_str())),
                RefTarget::Resource(path) => resources.get(&(reference.category, path.as_str())),
            };
            if let Some(&decl) = target {
                graph.add_edge(idx, decl, RefEdge::Resolves);
            }
        }

        Self {
            graph,
            declarations,
            uses,
        }
    }

    pub fn inner(&self) -> &DiGraph<RefNode<'t>, RefEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Uses with no declaration to resolve to, in recording order.
    pub fn unresolved(&self) -> Vec<&'t Reference> {
        self.uses
            .iter()
            .filter(|idx| {
                self.graph
                    .edges_directed(**idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .filter_map(|&idx| match self.graph.node_weight(idx) {
                Some(RefNode::Use(reference)) => Some(*reference),
                _ => None,
            })
            .collect()
    }

    /// Declarations of `category` nothing refers to, in declaration order.
    pub fn unused(&self, category: SymbolCategory) -> Vec<&'t Symbol> {
        self.declarations
            .iter()
            .filter(|(key, _)| key.0 == category)
            .filter_map(|(_, &idx)| {
                let used = self
                    .graph
                    .edges_directed(idx, Direction::Incoming)
                    .any(|e| matches!(e.weight(), RefEdge::Resolves));
                if used {
                    return None;
                }
                match self.graph.node_weight(idx) {
                    Some(RefNode::Declaration(symbol)) => Some(*symbol),
                    _ => None,
                }
            })
            .collect()
    }

    /// Every use that resolves to the named symbol.
    pub fn usages(&self, category: SymbolCategory, name: &str) -> Vec<&'t Reference> {
        let found = self
            .declarations
            .iter()
            .find(|(key, _)| key.0 == category && key.1 == name);
        let Some((_, &idx)) = found else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| match self.graph.node_weight(e.source()) {
                Some(RefNode::Use(reference)) => Some(*reference),
                _ => None,
            })
            .collect()
    }

    pub fn to_repr(&self) -> GraphRepr {
        GraphRepr::from(self)
    }
}

/// Serializable view of a [`ReferenceGraph`].
#[derive(Debug, Clone, Serialize)]
pub struct GraphRepr {
    pub nodes: Vec<NodeRepr>,
    pub edges: Vec<EdgeRepr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeRepr {
    pub node_type: &'static str,
    pub category: SymbolCategory,
    pub name: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeRepr {
    pub source: usize,
    pub target: usize,
    pub edge_type: &'static str,
}

impl From<&ReferenceGraph<'_>> for GraphRepr {
    fn from(graph: &ReferenceGraph<'_>) -> Self {
        let inner = graph.inner();
        let nodes = inner
            .node_indices()
            .filter_map(|idx| inner.node_weight(idx))
            .map(|node| match node {
                RefNode::Declaration(symbol) => NodeRepr {
                    node_type: "declaration",
                    category: symbol.category,
                    name: symbol.name.clone(),
                    line: symbol.position.line,
                    column: symbol.position.column,
                },
                RefNode::Use(reference) => NodeRepr {
                    node_type: "use",
                    category: reference.category,
                    name: reference.target.text().to_string(),
                    line: reference.position.line,
                    column: reference.position.column,
                },
            })
            .collect();

        let edges = inner
            .edge_references()
            .map(|e| EdgeRepr {
                source: e.source().index(),
                target: e.target().index(),
                edge_type: e.weight().label(),
            })
            .collect();

        Self { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mas2g_parser::diagnostic::Position;
    use std::path::PathBuf;

    fn table() -> SymbolTable {
        let pos = || Position::file_start("g.mas2g");
        let mut table = SymbolTable::new("g.mas2g");
        table.declare(SymbolCategory::AgentFile, "a", pos(), Some(PathBuf::from("a.goal")));
        table.declare(SymbolCategory::AgentFile, "b", pos(), Some(PathBuf::from("b.goal")));
        table.reference(SymbolCategory::AgentFile, RefTarget::Name("a".into()), pos(), "r1");
        table.reference(
            SymbolCategory::AgentFile,
            RefTarget::Resource("a.goal".into()),
            pos(),
            "r2",
        );
        table.reference(SymbolCategory::AgentFile, RefTarget::Name("c".into()), pos(), "r3");
        table
    }

    #[test]
    fn test_graph_shape() {
        let table = table();
        let graph = table.graph();
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_unresolved_and_unused() {
        let table = table();
        let graph = table.graph();
        let unresolved: Vec<_> = graph.unresolved().iter().map(|r| r.context.as_str()).collect();
        assert_eq!(unresolved, vec!["r3"]);
        let unused: Vec<_> = graph
            .unused(SymbolCategory::AgentFile)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(unused, vec!["b"]);
    }

    #[test]
    fn test_usages() {
        let table = table();
        let graph = table.graph();
        assert_eq!(graph.usages(SymbolCategory::AgentFile, "a").len(), 2);
        assert!(graph.usages(SymbolCategory::AgentFile, "b").is_empty());
        assert!(graph.usages(SymbolCategory::Agent, "a").is_empty());
    }

    #[test]
    fn test_repr_serializes() {
        let table = table();
        let repr = table.graph().to_repr();
        let json = serde_json::to_value(&repr).unwrap();
        assert_eq!(json["nodes"].as_array().map(Vec::len), Some(5));
        assert_eq!(json["edges"][0]["edge_type"], "resolves");
        assert_eq!(json["nodes"][0]["category"], "agent-file");
    }
}
