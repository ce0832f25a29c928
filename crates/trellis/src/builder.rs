//! Diagram construction.
//!
//! [`GraphBuilder`] walks a [`TypeModel`] in the order the diagram needs:
//!
//! 1. every root type is drawn, unless hidden;
//! 2. every root type contributes its explicit relations: the superclass,
//!    `@extends` tags, implemented interfaces and the declared relation tags;
//! 3. when the options ask for it, [`crate::infer`] adds associations and
//!    dependencies between types not yet related;
//! 4. every name a relation mentioned but no pass drew is drawn last, as a
//!    full node if the model declares it and as an opaque name otherwise.
//!
//! All passes share one [`NodeRegistry`], which fixes the node ids and
//! records what was drawn between every pair of types.

use log::{debug, info, trace};

use trellis_core::{
    model::{TypeDecl, TypeModel, Visibility},
    relation::RelationKind,
};
use trellis_parser::tags::parse_relation;

use crate::{
    diagram::{AttrValue, Attributes, Diagram, DiagramEdge, DiagramNode, NodeKind},
    infer,
    label::{node_attributes, note_label, opaque_label, type_label},
    link::DocLinks,
    options::ResolvedOptions,
    registry::NodeRegistry,
    resolver::ConfigurationResolver,
};

/// Root of every class hierarchy; never drawn as a superclass.
const ROOT_CLASS: &str = "java.lang.Object";

/// Labels of a drawn relation: tail, middle and head.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EdgeLabels<'a> {
    pub tail: &'a str,
    pub label: &'a str,
    pub head: &'a str,
}

/// Builds one diagram from a model and a resolver.
pub struct GraphBuilder<'m, R> {
    model: &'m TypeModel,
    resolver: R,
    registry: NodeRegistry,
    note_options: ResolvedOptions,
    links: DocLinks,
    nodes: Vec<DiagramNode>,
    edges: Vec<(String, String, DiagramEdge)>,
}

impl<'m, R: ConfigurationResolver> GraphBuilder<'m, R> {
    /// Creates a builder. Notes are drawn with the resolver's global options
    /// and the `note` shape until [`with_note_options`](Self::with_note_options)
    /// says otherwise.
    pub fn new(model: &'m TypeModel, resolver: R) -> Self {
        let global = resolver.global_options();
        let links = global.links().clone();
        let mut note_options = global;
        note_options.apply_str("notes", "shape note");
        Self {
            model,
            resolver,
            registry: NodeRegistry::new(),
            note_options,
            links,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_note_options(mut self, note_options: ResolvedOptions) -> Self {
        self.note_options = note_options;
        self
    }

    pub fn model(&self) -> &'m TypeModel {
        self.model
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Runs every pass and returns the diagram.
    pub fn build(mut self) -> Diagram {
        let global = self.resolver.global_options();
        info!(resolver = self.resolver.display_name(); "Building diagram");

        let model = self.model;
        for decl in model.roots() {
            self.print_class(decl);
        }
        for decl in model.roots() {
            self.print_relations(decl);
        }
        if global.infer_relationships() {
            for decl in model.roots() {
                infer::infer_relations(&mut self, decl);
            }
        }
        if global.infer_dependencies() {
            for decl in model.roots() {
                infer::infer_dependencies(&mut self, decl);
            }
        }
        self.print_extra_classes();

        let diagram = self.finish();
        info!(
            nodes = diagram.node_count(),
            edges = diagram.edge_count();
            "Diagram built"
        );
        diagram
    }

    /// Assembles what the passes run so far produced.
    pub fn finish(self) -> Diagram {
        Diagram::from_parts(self.nodes, self.edges)
    }

    /// Options for `name`, through its declaration when the model has one.
    pub(crate) fn options_for_ref(&self, name: &str) -> ResolvedOptions {
        match self.model.get(name) {
            Some(decl) => self.resolver.options_for(decl),
            None => self.resolver.options_for_name(name),
        }
    }

    /// Whether a declared type is left out of the diagram: it is tagged
    /// `@hidden` or `@view`, its options hide its name, or it is a private
    /// nested type under `hideprivateinner`.
    pub(crate) fn is_hidden(&self, decl: &TypeDecl) -> bool {
        if decl.has_tag("hidden") || decl.has_tag("view") {
            return true;
        }
        let opts = self.resolver.options_for(decl);
        opts.hides(decl.name())
            || (opts.hide_private_inner()
                && decl.is_nested()
                && decl.visibility() == Visibility::Private)
    }

    /// Whether a name is left out: its node was registered hidden, or its
    /// options hide it.
    pub(crate) fn is_hidden_name(&self, name: &str) -> bool {
        self.registry.get(name).is_some_and(|node| node.is_hidden())
            || self.resolver.options_for_name(name).hides(name)
    }

    /// Hidden check for a referenced name, through its declaration when the
    /// model has one.
    pub(crate) fn is_hidden_ref(&self, name: &str) -> bool {
        match self.model.get(name) {
            Some(decl) => self.is_hidden(decl),
            None => self.is_hidden_name(name),
        }
    }

    /// Registers `name` and returns its alias.
    fn node_alias(&mut self, name: &str) -> String {
        let hidden = self.model.get(name).is_some_and(|decl| self.is_hidden(decl));
        self.registry.get_or_create(name, hidden).alias().to_string()
    }

    /// Draws a declared type, its notes included, unless it was already
    /// drawn, is hidden, or is an enum and enumerations are not shown.
    pub fn print_class(&mut self, decl: &TypeDecl) {
        let hidden = self.is_hidden(decl);
        let node = self.registry.get_or_create(decl.name(), hidden);
        if node.is_printed() {
            return;
        }
        let alias = node.alias().to_string();
        self.registry.mark_printed(decl.name());

        let opts = self.resolver.options_for(decl);
        if hidden || (decl.is_enum() && !opts.show_enumerations()) {
            trace!(name = decl.name(); "Skipping hidden type");
            return;
        }

        let label = type_label(decl, &opts);
        let mut attributes = node_attributes(label, &opts);
        let url = self.links.url(
            decl.name(),
            decl.package(),
            decl.simple_name(),
            !decl.is_library(),
        );
        if let Some(url) = url {
            attributes.insert("URL", AttrValue::quoted(url));
        }
        self.nodes.push(DiagramNode::new(
            alias.as_str(),
            decl.name(),
            NodeKind::Type,
            attributes,
        ));
        trace!(name = decl.name(), alias = alias.as_str(); "Drew type");

        for (i, note) in decl.tags_named("note").enumerate() {
            let id = format!("n{i}{alias}");
            let label = note_label(decl.name(), note.text(), &self.note_options);
            self.nodes.push(DiagramNode::new(
                id.as_str(),
                decl.name(),
                NodeKind::Note,
                node_attributes(label, &self.note_options),
            ));
            let mut attributes = Attributes::new();
            attributes.insert("arrowhead", AttrValue::plain("none"));
            let edge =
                DiagramEdge::new(None, attributes).with_ports(None, opts.shape().landing_port());
            self.edges.push((id, alias.clone(), edge));
        }
    }

    /// Draws the explicit relations of a declared type.
    pub fn print_relations(&mut self, decl: &TypeDecl) {
        if self.is_hidden(decl) {
            return;
        }
        let model = self.model;
        let opts = self.resolver.options_for(decl);

        if let Some(name) = decl.superclass().and_then(|sup| sup.qualified_name()) {
            if name != ROOT_CLASS && !decl.is_enum() && !self.is_hidden_ref(name) {
                self.generalization(RelationKind::Extends, decl.name(), name);
            }
        }
        for tag in decl.tags_named("extends") {
            let target = model
                .resolve_name(decl, tag.text())
                .map_or_else(|| tag.text().trim().to_string(), |sup| sup.name().to_string());
            if !self.is_hidden_ref(&target) {
                self.generalization(RelationKind::Extends, decl.name(), &target);
            }
        }
        for iface in decl.interfaces() {
            let Some(name) = iface.qualified_name() else {
                continue;
            };
            if !self.is_hidden_ref(name) {
                self.generalization(RelationKind::Implements, decl.name(), name);
            }
        }

        for kind in RelationKind::DECLARED {
            for tag in decl.tags_named(kind.tag_name()) {
                let declared = match parse_relation(kind, tag.text()) {
                    Ok(declared) => declared,
                    Err(diag) => {
                        diag.log_skip(decl.name());
                        continue;
                    }
                };
                let target = match model.resolve_name(decl, declared.target()) {
                    Some(target) if self.is_hidden(target) => continue,
                    Some(target) => target.name().to_string(),
                    None if self.is_hidden_name(declared.target()) => continue,
                    None => declared.target().to_string(),
                };
                let labels = EdgeLabels {
                    tail: declared.tail_label(),
                    label: declared.label(),
                    head: declared.head_label(),
                };
                self.relation(&opts, kind, decl.name(), &target, labels);
            }
        }
    }

    /// Draws an inheritance edge from `sub` to `sup` and records it.
    fn generalization(&mut self, kind: RelationKind, sub: &str, sup: &str) {
        let (source, source_port) = self.endpoint(sub);
        let (target, target_port) = self.endpoint(sup);
        trace!(sub, sup, kind:%; "Drew generalization");
        let edge = DiagramEdge::new(Some(kind), Attributes::new())
            .with_ports(source_port, target_port);
        self.edges.push((source, target, edge));
        self.registry.record(sub, sup, kind);
    }

    /// Draws a labelled relation of `kind` from `from` to `to` and records
    /// it in the registry.
    pub(crate) fn relation(
        &mut self,
        opts: &ResolvedOptions,
        kind: RelationKind,
        from: &str,
        to: &str,
        labels: EdgeLabels<'_>,
    ) {
        let (source, source_port) = self.endpoint(from);
        let (target, target_port) = self.endpoint(to);

        let mut attributes = Attributes::new();
        attributes.insert("taillabel", AttrValue::quoted(labels.tail));
        attributes.insert("label", AttrValue::quoted(opts.guillemize(labels.label)));
        attributes.insert("headlabel", AttrValue::quoted(labels.head));
        attributes.insert("fontname", AttrValue::quoted(opts.edge_font_name()));
        attributes.insert("fontcolor", AttrValue::quoted(opts.edge_font_color()));
        attributes.insert("fontsize", AttrValue::plain(opts.edge_font_size()));
        attributes.insert("color", AttrValue::quoted(opts.edge_color()));

        trace!(from, to, kind:%; "Drew relation");
        let edge = DiagramEdge::new(Some(kind), attributes).with_ports(source_port, target_port);
        self.edges.push((source, target, edge));
        self.registry.record(from, to, kind);
    }

    /// Alias and landing port of a relation end.
    fn endpoint(&mut self, name: &str) -> (String, Option<&'static str>) {
        let port = self.options_for_ref(name).shape().landing_port();
        (self.node_alias(name), port)
    }

    /// Draws every registered name no pass has drawn yet.
    pub fn print_extra_classes(&mut self) {
        let model = self.model;
        let mut drawn = 0;
        for name in self.registry.names_snapshot() {
            if self.registry.get(&name).is_some_and(|node| node.is_printed()) {
                continue;
            }
            if let Some(decl) = model.get(&name) {
                self.print_class(decl);
                continue;
            }
            self.registry.mark_printed(&name);
            let opts = self.resolver.options_for_name(&name);
            if opts.hides(&name) {
                continue;
            }
            let alias = self.node_alias(&name);
            let label = opaque_label(&name, &opts);
            let mut attributes = node_attributes(label, &opts);
            let (package, simple_name) = name.rsplit_once('.').unwrap_or(("", name.as_str()));
            if let Some(url) = self.links.url(&name, package, simple_name, false) {
                attributes.insert("URL", AttrValue::quoted(url));
            }
            self.nodes.push(DiagramNode::new(
                alias,
                name.as_str(),
                NodeKind::Opaque,
                attributes,
            ));
            drawn += 1;
        }
        debug!(drawn; "Drew referenced types");
    }
}
