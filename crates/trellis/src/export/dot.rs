//! Graphviz DOT output.
//!
//! The diagram is translated into a [`dot_structures::Graph`] and printed
//! with the `graphviz-rust` printer. Inheritance edges are drawn from the
//! supertype to the subtype with a reversed arrow, which lets `dot` rank
//! supertypes above their subtypes.

use std::{fs, path::PathBuf};

use dot_structures::{
    Attribute, Edge, EdgeTy, Graph, GraphAttributes, Id, Node, NodeId, Port, Stmt, Vertex,
};
use graphviz_rust::printer::{DotPrinter, PrinterContext};
use log::{debug, info, trace};

use crate::{
    diagram::{AttrValue, Attributes, Diagram, DiagramEdge, DiagramNode, NodeKind},
    options::ResolvedOptions,
};

use super::{Error, Exporter};

fn quoted(value: &str) -> Id {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    Id::Escaped(format!("\"{escaped}\""))
}

fn plain(value: impl ToString) -> Id {
    Id::Plain(value.to_string())
}

fn attr(name: &str, value: Id) -> Attribute {
    Attribute(plain(name), value)
}

fn attr_id(value: &AttrValue) -> Id {
    match value {
        AttrValue::Quoted(value) => quoted(value),
        AttrValue::Plain(value) => plain(value),
        AttrValue::Html(value) => Id::Html(format!("<{value}>")),
    }
}

fn attributes(attrs: &Attributes) -> Vec<Attribute> {
    attrs
        .iter()
        .map(|(name, value)| attr(name, attr_id(value)))
        .collect()
}

fn node_id(id: &str, port: Option<&str>) -> NodeId {
    NodeId(
        plain(id),
        port.map(|port| Port(Some(plain(port)), None)),
    )
}

/// Diagram-wide statements: default fonts, spacing and direction.
fn prologue(options: &ResolvedOptions) -> Vec<Stmt> {
    let edge_font = quoted(options.edge_font_name());
    let node_font = quoted(options.node_font_name());
    let mut stmts = vec![
        Stmt::GAttribute(GraphAttributes::Edge(vec![
            attr("fontname", edge_font.clone()),
            attr("fontsize", plain(options.edge_font_size())),
            attr("labelfontname", edge_font),
            attr("labelfontsize", plain(options.edge_font_size())),
        ])),
        Stmt::GAttribute(GraphAttributes::Node(vec![
            attr("fontname", node_font),
            attr("fontsize", plain(options.node_font_size())),
            attr("shape", plain("plaintext")),
        ])),
        Stmt::Attribute(attr("nodesep", plain(options.nodesep()))),
        Stmt::Attribute(attr("ranksep", plain(options.ranksep()))),
    ];
    if options.horizontal() {
        stmts.push(Stmt::Attribute(attr("rankdir", plain("LR"))));
    }
    if let Some(color) = options.bg_color() {
        stmts.push(Stmt::Attribute(attr("bgcolor", quoted(color))));
    }
    stmts
}

fn node_stmt(node: &DiagramNode) -> Stmt {
    trace!(id = node.id(), name = node.name(); "Writing node");
    Stmt::Node(Node::new(node_id(node.id(), None), attributes(node.attributes())))
}

fn edge_stmt(source: &DiagramNode, target: &DiagramNode, edge: &DiagramEdge) -> Stmt {
    let mut attrs = Vec::new();
    let mut from = node_id(source.id(), edge.source_port());
    let mut to = node_id(target.id(), edge.target_port());

    if let Some(kind) = edge.kind() {
        if kind.is_inheritance() {
            std::mem::swap(&mut from, &mut to);
        }
        let style = kind.edge_style();
        if style.is_dashed() {
            attrs.push(attr("style", plain("dashed")));
        }
        if let Some(dir) = style.dir() {
            attrs.push(attr("dir", plain(dir)));
        }
        if let Some(arrowtail) = style.arrowtail() {
            attrs.push(attr("arrowtail", plain(arrowtail)));
        }
        attrs.push(attr("arrowhead", plain(style.arrowhead())));
    }
    attrs.extend(attributes(edge.attributes()));

    trace!(source = source.id(), target = target.id(), kind:? = edge.kind(); "Writing edge");
    Stmt::Edge(Edge {
        ty: EdgeTy::Pair(Vertex::N(from), Vertex::N(to)),
        attributes: attrs,
    })
}

/// Builds the Graphviz graph of `diagram`.
pub fn to_graph(diagram: &Diagram, options: &ResolvedOptions) -> Graph {
    let mut stmts = prologue(options);
    stmts.extend(
        diagram
            .nodes()
            .filter(|node| node.kind() != NodeKind::Reference)
            .map(node_stmt),
    );
    stmts.extend(
        diagram
            .edges()
            .map(|(source, target, edge)| edge_stmt(source, target, edge)),
    );
    Graph::DiGraph {
        id: plain("G"),
        strict: false,
        stmts,
    }
}

/// Renders `diagram` as DOT text.
pub fn render(diagram: &Diagram, options: &ResolvedOptions) -> String {
    let dot = to_graph(diagram, options).print(&mut PrinterContext::default());
    debug!(bytes = dot.len(); "Rendered DOT");
    dot
}

/// Writes diagrams as DOT files.
#[derive(Debug)]
pub struct DotExporter {
    path: PathBuf,
}

impl DotExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Exporter for DotExporter {
    fn export_diagram(
        &mut self,
        diagram: &Diagram,
        options: &ResolvedOptions,
    ) -> Result<(), Error> {
        if self.path.file_name().is_none() {
            return Err(Error::Render(format!(
                "output path `{}` does not name a file",
                self.path.display()
            )));
        }
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, render(diagram, options))?;
        info!(path:? = self.path; "DOT file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{
        model::{TypeDecl, TypeModel, TypeRef},
        relation::RelationKind,
    };

    use crate::builder::GraphBuilder;

    use super::*;

    fn diagram(model: &TypeModel, options: &ResolvedOptions) -> Diagram {
        GraphBuilder::new(model, options.clone()).build()
    }

    #[test]
    fn test_prologue() {
        let mut options = ResolvedOptions::default();
        options.apply_str("test", "horizontal");
        options.apply_str("test", "bgcolor gray90");
        let dot = render(&Diagram::default(), &options);

        assert!(dot.contains("digraph G"));
        assert!(dot.contains("labelfontname=\"Helvetica\""));
        assert!(dot.contains("labelfontsize=10"));
        assert!(dot.contains("shape=plaintext"));
        assert!(dot.contains("nodesep=0.25"));
        assert!(dot.contains("ranksep=0.5"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains("bgcolor=\"gray90\""));
    }

    #[test]
    fn test_inheritance_is_drawn_from_the_supertype() {
        let model = TypeModel::from_decls([
            TypeDecl::class("a.Base"),
            TypeDecl::interface("a.Api"),
            TypeDecl::class("a.Impl")
                .with_superclass(TypeRef::class("a.Base"))
                .with_interface(TypeRef::class("a.Api")),
        ]);
        let options = ResolvedOptions::default();
        let graph = to_graph(&diagram(&model, &options), &options);
        let Graph::DiGraph { stmts, .. } = graph else {
            panic!("expected a digraph");
        };
        let edges: Vec<_> = stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Edge(edge) => Some(edge),
                _ => None,
            })
            .collect();
        assert_eq!(edges.len(), 2);

        let EdgeTy::Pair(Vertex::N(from), Vertex::N(to)) = &edges[0].ty else {
            panic!("expected a node pair");
        };
        assert_eq!(from.0, plain("c0"));
        assert_eq!(to.0, plain("c2"));
        assert!(edges[0].attributes.contains(&attr("arrowtail", plain("empty"))));
        assert!(!edges[0].attributes.contains(&attr("style", plain("dashed"))));
        assert!(edges[1].attributes.contains(&attr("style", plain("dashed"))));
    }

    #[test]
    fn test_relation_edges_and_ports() {
        let model = TypeModel::from_decls([
            TypeDecl::class("a.Order").with_tag("navcomposed", "1 lines * a.Line"),
            TypeDecl::class("a.Line"),
        ]);
        let options = ResolvedOptions::default();
        let dot = render(&diagram(&model, &options), &options);

        assert!(dot.contains("c0:p"));
        assert!(dot.contains("c1:p"));
        assert!(dot.contains("arrowhead=open"));
        assert!(dot.contains("arrowtail=diamond"));
        assert!(dot.contains("taillabel=\"1\""));
        assert!(dot.contains("headlabel=\"*\""));
        assert!(dot.contains("label=<<table"));
    }

    #[test]
    fn test_note_edges_have_no_style() {
        let model =
            TypeModel::from_decls([TypeDecl::class("a.A").with_tag("note", "remember \"me\"")]);
        let options = ResolvedOptions::default();
        let diagram = diagram(&model, &options);
        let (_, _, edge) = diagram.edges().next().unwrap();
        assert_eq!(edge.kind(), None::<RelationKind>);

        let dot = render(&diagram, &options);
        assert!(dot.contains("shape=note"));
        assert!(dot.contains("arrowhead=none"));
    }

    #[test]
    fn test_node_urls() {
        let model = TypeModel::from_decls([
            TypeDecl::class("a.Order").with_tag("depend", "- - - java.util.List"),
        ]);
        let mut options = ResolvedOptions::default();
        options.apply_str("test", "apidocroot https://acme.com/api");
        let dot = render(&diagram(&model, &options), &options);

        assert!(dot.contains("URL=\"https://acme.com/api/a/Order.html\""));
        assert!(dot.contains("URL=\"https://docs.oracle.com/javase/9/docs/api/java/util/List.html\""));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quoted("say \"hi\""), Id::Escaped("\"say \\\"hi\\\"\"".to_string()));
        assert_eq!(quoted(r"C:\dir"), Id::Escaped(r#""C:\\dir""#.to_string()));
        assert_eq!(quoted(r#"end\"#), Id::Escaped(r#""end\\""#.to_string()));
    }

    #[test]
    fn test_exporter_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("com/acme/Order.dot");
        let model = TypeModel::from_decls([TypeDecl::class("com.acme.Order")]);
        let options = ResolvedOptions::default();

        DotExporter::new(&path)
            .export_diagram(&diagram(&model, &options), &options)
            .unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("c0"));
    }
}
