//! The built class diagram.
//!
//! A [`Diagram`] is the output of [`GraphBuilder`](crate::builder::GraphBuilder)
//! and the input of the exporters: a directed graph whose nodes are the
//! drawn types, opaque references and notes, and whose edges are the drawn
//! relations. Node and edge attributes are already resolved against the
//! options in effect for each type, so exporting is a pure translation.
//!
//! Two diagrams built from the same input compare equal under
//! [`Diagram::is_equivalent`], which ignores node aliases and emission order.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;
use petgraph::{
    Direction,
    algo::is_isomorphic_matching,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use trellis_core::relation::RelationKind;

/// Value of a DOT attribute, with the quoting it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Written in double quotes.
    Quoted(String),
    /// Written as is: numbers and keywords.
    Plain(String),
    /// An HTML-like label, written between `<` and `>`.
    Html(String),
}

impl AttrValue {
    pub fn quoted(value: impl Into<String>) -> Self {
        Self::Quoted(value.into())
    }

    pub fn plain(value: impl ToString) -> Self {
        Self::Plain(value.to_string())
    }

    /// The unquoted text of the value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Quoted(value) | Self::Plain(value) | Self::Html(value) => value,
        }
    }
}

/// Ordered DOT attributes of a node or edge.
pub type Attributes = IndexMap<&'static str, AttrValue>;

/// What a diagram node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A type of the model, drawn with its members.
    Type,
    /// A type the model does not declare, drawn by name only.
    Opaque,
    /// A `@note` attached to a type.
    Note,
    /// An edge endpoint that was never drawn; DOT creates it implicitly.
    Reference,
}

/// A node of the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramNode {
    id: String,
    name: String,
    kind: NodeKind,
    attributes: Attributes,
}

impl DiagramNode {
    pub(crate) fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: NodeKind,
        attributes: Attributes,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            attributes,
        }
    }

    fn reference(id: &str) -> Self {
        Self::new(id, "", NodeKind::Reference, Attributes::new())
    }

    /// The DOT node identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full name of the type; for notes, the annotated type.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Node attributes, the HTML `label` included.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// The HTML label body.
    pub fn label(&self) -> Option<&str> {
        self.attribute("label").map(AttrValue::as_str)
    }

    /// Whether the node is drawn by a statement of its own.
    pub fn is_drawn(&self) -> bool {
        self.kind != NodeKind::Reference
    }

    fn same_content(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name && self.attributes == other.attributes
    }
}

/// An edge of the diagram, from the source type of the relation to its
/// target.
///
/// For inheritance the source is the subtype; exporters that draw the
/// arrow from the supertype reverse it themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramEdge {
    kind: Option<RelationKind>,
    source_port: Option<&'static str>,
    target_port: Option<&'static str>,
    attributes: Attributes,
}

impl DiagramEdge {
    pub(crate) fn new(kind: Option<RelationKind>, attributes: Attributes) -> Self {
        Self {
            kind,
            source_port: None,
            target_port: None,
            attributes,
        }
    }

    pub(crate) fn with_ports(
        mut self,
        source: Option<&'static str>,
        target: Option<&'static str>,
    ) -> Self {
        self.source_port = source;
        self.target_port = target;
        self
    }

    /// Relation kind; `None` for the link between a note and its type.
    pub fn kind(&self) -> Option<RelationKind> {
        self.kind
    }

    pub fn source_port(&self) -> Option<&'static str> {
        self.source_port
    }

    pub fn target_port(&self) -> Option<&'static str> {
        self.target_port
    }

    /// Edge attributes: labels, fonts and colour. Arrow styling follows
    /// from [`kind`](Self::kind).
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(AttrValue::as_str)
    }
}

/// A class diagram ready for export.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    graph: DiGraph<DiagramNode, DiagramEdge>,
    ids: HashMap<String, NodeIndex>,
}

impl Diagram {
    /// Assembles a diagram from nodes in emission order and edges given by
    /// endpoint ids. Endpoints without a node become [`NodeKind::Reference`]
    /// nodes.
    pub(crate) fn from_parts(
        nodes: Vec<DiagramNode>,
        edges: Vec<(String, String, DiagramEdge)>,
    ) -> Self {
        let mut diagram = Self::default();
        for node in nodes {
            diagram.insert_node(node);
        }
        for (source, target, edge) in edges {
            let source = diagram.endpoint(&source);
            let target = diagram.endpoint(&target);
            diagram.graph.add_edge(source, target, edge);
        }
        debug!(
            nodes = diagram.graph.node_count(),
            edges = diagram.graph.edge_count();
            "Assembled diagram"
        );
        diagram
    }

    fn insert_node(&mut self, node: DiagramNode) -> NodeIndex {
        let id = node.id().to_string();
        let idx = self.graph.add_node(node);
        self.ids.insert(id, idx);
        idx
    }

    fn endpoint(&mut self, id: &str) -> NodeIndex {
        match self.ids.get(id) {
            Some(&idx) => idx,
            None => self.insert_node(DiagramNode::reference(id)),
        }
    }

    /// Nodes in emission order.
    pub fn nodes(&self) -> impl Iterator<Item = &DiagramNode> {
        self.graph.node_weights()
    }

    /// Edges in emission order, with their source and target nodes.
    pub fn edges(&self) -> impl Iterator<Item = (&DiagramNode, &DiagramNode, &DiagramEdge)> {
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                edge.weight(),
            )
        })
    }

    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.ids.get(id).map(|&idx| &self.graph[idx])
    }

    /// The node drawing the type `name`, if it was drawn.
    pub fn type_node(&self, name: &str) -> Option<&DiagramNode> {
        self.nodes().find(|node| {
            matches!(node.kind(), NodeKind::Type | NodeKind::Opaque) && node.name() == name
        })
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.type_node(name).is_some()
    }

    /// Edges drawn from the type `source` to the type `target`.
    pub fn edges_between(&self, source: &str, target: &str) -> Vec<&DiagramEdge> {
        let (Some(&from), Some(to)) = (
            self.type_node(source).and_then(|node| self.ids.get(node.id())),
            self.type_node(target).map(DiagramNode::id),
        ) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(from, Direction::Outgoing)
            .filter(|edge| self.graph[edge.target()].id() == to)
            .map(|edge| edge.weight())
            .collect()
    }

    /// Notes attached to the type `name`.
    pub fn notes_of(&self, name: &str) -> Vec<&DiagramNode> {
        self.nodes()
            .filter(|node| node.kind() == NodeKind::Note && node.name() == name)
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether both diagrams draw the same nodes and the same edges between
    /// them, regardless of node ids and emission order.
    pub fn is_equivalent(&self, other: &Diagram) -> bool {
        is_isomorphic_matching(
            &self.graph,
            &other.graph,
            DiagramNode::same_content,
            |a: &DiagramEdge, b: &DiagramEdge| a == b,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_node(id: &str, name: &str) -> DiagramNode {
        let mut attributes = Attributes::new();
        attributes.insert("label", AttrValue::Html(name.to_string()));
        DiagramNode::new(id, name, NodeKind::Type, attributes)
    }

    fn edge(kind: RelationKind) -> DiagramEdge {
        DiagramEdge::new(Some(kind), Attributes::new())
    }

    #[test]
    fn test_missing_endpoints_become_references() {
        let diagram = Diagram::from_parts(
            vec![type_node("c0", "a.A")],
            vec![("c0".into(), "c7".into(), edge(RelationKind::Depend))],
        );
        assert_eq!(diagram.node_count(), 2);
        let reference = diagram.node("c7").unwrap();
        assert_eq!(reference.kind(), NodeKind::Reference);
        assert!(!reference.is_drawn());
    }

    #[test]
    fn test_edges_between() {
        let diagram = Diagram::from_parts(
            vec![type_node("c0", "a.A"), type_node("c1", "a.B")],
            vec![
                ("c0".into(), "c1".into(), edge(RelationKind::NavAssoc)),
                ("c0".into(), "c1".into(), edge(RelationKind::Depend)),
                ("c1".into(), "c0".into(), edge(RelationKind::Assoc)),
            ],
        );
        let kinds: Vec<_> = diagram
            .edges_between("a.A", "a.B")
            .iter()
            .filter_map(|edge| edge.kind())
            .collect();
        assert_eq!(kinds, vec![RelationKind::NavAssoc, RelationKind::Depend]);
        assert!(diagram.edges_between("a.A", "a.Z").is_empty());
    }

    #[test]
    fn test_equivalence_ignores_ids_and_order() {
        let first = Diagram::from_parts(
            vec![type_node("c0", "a.A"), type_node("c1", "a.B")],
            vec![("c0".into(), "c1".into(), edge(RelationKind::Has))],
        );
        let second = Diagram::from_parts(
            vec![type_node("c5", "a.B"), type_node("c9", "a.A")],
            vec![("c9".into(), "c5".into(), edge(RelationKind::Has))],
        );
        assert!(first.is_equivalent(&second));

        let reversed = Diagram::from_parts(
            vec![type_node("c0", "a.A"), type_node("c1", "a.B")],
            vec![("c1".into(), "c0".into(), edge(RelationKind::Has))],
        );
        assert!(!first.is_equivalent(&reversed));
    }
}
