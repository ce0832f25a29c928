//! Node identities and relation bookkeeping.
//!
//! The [`NodeRegistry`] hands out the DOT identifiers of a diagram. A type
//! gets its alias (`c0`, `c1`, ...) the first time any pass mentions it,
//! whether it is drawn or only referenced, and keeps it for the rest of the
//! build. Alongside the alias each node records what the builder already
//! drew toward every other node, as one [`RelationPattern`] per peer.
//!
//! Nodes are never removed, and a registry lives for exactly one diagram
//! build, so aliases of separate builds are independent.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::trace;

use trellis_core::{
    model::normalize_name,
    relation::{RelationDirection, RelationKind, RelationPattern},
};

/// Registry entry of one type name.
#[derive(Debug, Clone)]
pub struct Node {
    alias: String,
    name: String,
    printed: bool,
    hidden: bool,
    relations: HashMap<String, RelationPattern>,
}

impl Node {
    fn new(alias: String, name: String, hidden: bool) -> Self {
        Self {
            alias,
            name,
            printed: false,
            hidden,
            relations: HashMap::new(),
        }
    }

    /// DOT identifier of the node.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Normalized full name of the type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a node statement was emitted for the type.
    pub fn is_printed(&self) -> bool {
        self.printed
    }

    /// Whether the type was hidden when it was first registered.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// What this node already has toward `other`.
    pub fn relation(&self, other: &str) -> Option<&RelationPattern> {
        self.relations.get(other)
    }

    /// Every peer this node has a recorded relation with.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &RelationPattern)> {
        self.relations
            .iter()
            .map(|(name, pattern)| (name.as_str(), pattern))
    }

    fn add_relation(&mut self, other: &str, kind: RelationKind, direction: RelationDirection) {
        self.relations
            .entry(other.to_string())
            .or_insert_with(|| RelationPattern::new(RelationDirection::None))
            .add_relation(kind, direction);
    }
}

/// First-seen-order registry of the nodes of one diagram.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: IndexMap<String, Node>,
    next_alias: usize,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node of `name`, creating it with the next alias if the
    /// name was never seen. `hidden` is only used on creation.
    pub fn get_or_create(&mut self, name: &str, hidden: bool) -> &mut Node {
        let name = normalize_name(name);
        let next_alias = &mut self.next_alias;
        self.nodes.entry(name).or_insert_with_key(|name| {
            let alias = format!("c{next_alias}");
            *next_alias += 1;
            trace!(name, alias; "Registered node");
            Node::new(alias, name.clone(), hidden)
        })
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Marks the node of `name` as drawn. Unknown names are ignored.
    pub fn mark_printed(&mut self, name: &str) {
        if let Some(node) = self.nodes.get_mut(&normalize_name(name)) {
            node.printed = true;
        }
    }

    /// Sums `direction` into the pattern `from` keeps toward `to`. Names
    /// that were never registered are ignored.
    pub fn add_relation(
        &mut self,
        from: &str,
        to: &str,
        kind: RelationKind,
        direction: RelationDirection,
    ) {
        let to = normalize_name(to);
        if let Some(node) = self.nodes.get_mut(&normalize_name(from)) {
            node.add_relation(&to, kind, direction);
        }
    }

    /// Records a relation of `kind` drawn from `from` to `to` on both ends,
    /// with the directions the kind prescribes.
    pub fn record(&mut self, from: &str, to: &str, kind: RelationKind) {
        self.add_relation(from, to, kind, kind.source_direction());
        if let Some(direction) = kind.target_direction() {
            self.add_relation(to, from, kind, direction);
        }
    }

    /// The pattern `from` keeps toward `to`, if any relation was recorded.
    pub fn relation(&self, from: &str, to: &str) -> Option<&RelationPattern> {
        self.get(from)
            .and_then(|node| node.relation(&normalize_name(to)))
    }

    /// Registered names, copied, for passes that register new names while
    /// they walk.
    pub fn names_snapshot(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
