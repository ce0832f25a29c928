//! Rendering and inclusion options.
//!
//! [`ResolvedOptions`] is the flat set of flags, fonts, colours and name
//! patterns that controls how one type is drawn, or whether it is drawn at
//! all. Resolvers produce a fresh value for every query by cloning a base
//! and applying [`OptionRule`]s in order; see [`crate::resolver`].
//!
//! # Option language
//!
//! Rules come from `@opt` tags, from the `[options]` list of the
//! configuration file and from the views. A leading `!` resets an option to
//! its default; boolean options are switched on by their bare name.
//!
//! ```
//! use trellis::options::ResolvedOptions;
//! use trellis_parser::tags::parse_option;
//!
//! let mut opts = ResolvedOptions::default();
//! opts.apply(&parse_option("hide com\\.acme\\.internal\\..*").unwrap()).unwrap();
//! opts.apply(&parse_option("attributes").unwrap()).unwrap();
//!
//! assert!(opts.matches_hide("com.acme.internal.Cache"));
//! assert!(!opts.matches_hide("com.acme.Order"));
//! assert!(opts.show_attributes());
//! ```

use std::fmt;

use log::trace;
use regex::Regex;

use trellis_core::{
    model::{TypeDecl, Visibility},
    relation::{RelationDirection, RelationKind, RelationPattern},
};
use trellis_parser::{
    error::{Diagnostic, ErrorCode},
    tags::{OptionRule, parse_option},
};

use crate::{link::DocLinks, shape::Shape};

const DEFAULT_FONT: &str = "Helvetica";
const DEFAULT_COLOR: &str = "black";
const DEFAULT_FONT_SIZE: f64 = 10.0;
const DEFAULT_OUTPUT: &str = "graph.dot";
const DEFAULT_NODESEP: f64 = 0.25;
const DEFAULT_RANKSEP: f64 = 0.5;

#[derive(Clone)]
enum Matching {
    Any,
    Exact(String),
    Regex(Regex),
}

/// A regular expression that must match a whole type name.
#[derive(Clone)]
pub struct NamePattern {
    source: String,
    matching: Matching,
}

impl NamePattern {
    /// Compiles `source`, anchored at both ends.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            matching: Matching::Regex(regex),
        })
    }

    /// A pattern matching every name.
    pub fn any() -> Self {
        Self {
            source: ".*".to_string(),
            matching: Matching::Any,
        }
    }

    /// A pattern matching `name` only.
    pub fn exact(name: &str) -> Self {
        Self {
            source: regex::escape(name),
            matching: Matching::Exact(name.to_string()),
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        match &self.matching {
            Matching::Any => true,
            Matching::Exact(exact) => exact == name,
            Matching::Regex(regex) => regex.is_match(name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamePattern").field(&self.source).finish()
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Compiles a pattern option argument, or explains why it was skipped.
fn compile(rule: &OptionRule, source: &str) -> Result<NamePattern, Diagnostic> {
    NamePattern::new(source).map_err(|err| {
        Diagnostic::warning(format!("skipping invalid pattern `{source}` of `{rule}`"))
            .with_code(ErrorCode::E300)
            .with_help(err.to_string())
    })
}

/// A font face and size for one kind of label text. `None` leaves the
/// corresponding attribute to the node default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec<'a> {
    pub face: Option<&'a str>,
    pub size: Option<f64>,
    pub italic: bool,
}

/// Label text roles that can carry their own font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Normal,
    Abstract,
    Class,
    ClassAbstract,
    Package,
    Tag,
}

/// The fully resolved options of one type or type name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    show_qualified: bool,
    show_qualified_generics: bool,
    hide_generics: bool,
    horizontal: bool,
    show_attributes: bool,
    show_enumerations: bool,
    show_enum_constants: bool,
    show_operations: bool,
    show_constructors: bool,
    show_visibility: bool,
    show_type: bool,
    show_comment: bool,
    auto_size: bool,
    postfix_package: bool,
    use_guillemets: bool,
    compact: bool,

    edge_font_name: String,
    edge_font_color: String,
    edge_font_size: f64,
    edge_color: String,
    node_font_name: String,
    node_font_color: String,
    node_font_size: f64,
    node_font_abstract_name: Option<String>,
    node_font_abstract_italic: bool,
    node_font_class_name: Option<String>,
    node_font_class_size: Option<f64>,
    node_font_tag_name: Option<String>,
    node_font_tag_size: Option<f64>,
    node_font_package_name: Option<String>,
    node_font_package_size: Option<f64>,
    node_fill_color: Option<String>,
    bg_color: Option<String>,
    shape: Shape,
    output: String,
    nodesep: f64,
    ranksep: f64,

    find_views: bool,
    view_name: Option<String>,

    infer_relationships: bool,
    infer_relationship_kind: RelationKind,
    infer_dependencies: bool,
    infer_dep_in_package: bool,
    infer_dependency_visibility: Visibility,
    use_imports: bool,
    coll_packages: Vec<NamePattern>,

    hide: Vec<NamePattern>,
    include: Vec<NamePattern>,
    hide_private_inner: bool,
    context_pattern: RelationPattern,

    links: DocLinks,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            show_qualified: false,
            show_qualified_generics: false,
            hide_generics: false,
            horizontal: false,
            show_attributes: false,
            show_enumerations: false,
            show_enum_constants: false,
            show_operations: false,
            show_constructors: false,
            show_visibility: false,
            show_type: false,
            show_comment: false,
            auto_size: true,
            postfix_package: false,
            use_guillemets: true,
            compact: false,

            edge_font_name: DEFAULT_FONT.to_string(),
            edge_font_color: DEFAULT_COLOR.to_string(),
            edge_font_size: DEFAULT_FONT_SIZE,
            edge_color: DEFAULT_COLOR.to_string(),
            node_font_name: DEFAULT_FONT.to_string(),
            node_font_color: DEFAULT_COLOR.to_string(),
            node_font_size: DEFAULT_FONT_SIZE,
            node_font_abstract_name: None,
            node_font_abstract_italic: true,
            node_font_class_name: None,
            node_font_class_size: None,
            node_font_tag_name: None,
            node_font_tag_size: None,
            node_font_package_name: None,
            node_font_package_size: None,
            node_fill_color: None,
            bg_color: None,
            shape: Shape::Class,
            output: DEFAULT_OUTPUT.to_string(),
            nodesep: DEFAULT_NODESEP,
            ranksep: DEFAULT_RANKSEP,

            find_views: false,
            view_name: None,

            infer_relationships: false,
            infer_relationship_kind: RelationKind::NavAssoc,
            infer_dependencies: false,
            infer_dep_in_package: false,
            infer_dependency_visibility: Visibility::Private,
            use_imports: false,
            coll_packages: Vec::new(),

            hide: Vec::new(),
            include: Vec::new(),
            hide_private_inner: false,
            context_pattern: RelationPattern::new(RelationDirection::Both),

            links: DocLinks::default(),
        }
    }
}

/// Options that take an argument unless they are negated.
const WITH_ARGUMENT: [&str; 28] = [
    "bgcolor",
    "edgecolor",
    "edgefontcolor",
    "edgefontname",
    "edgefontsize",
    "nodefontcolor",
    "nodefontname",
    "nodefontsize",
    "nodefontabstractname",
    "nodefontclassname",
    "nodefontclasssize",
    "nodefonttagname",
    "nodefonttagsize",
    "nodefontpackagename",
    "nodefontpackagesize",
    "nodefillcolor",
    "shape",
    "output",
    "include",
    "collpackages",
    "inferreltype",
    "inferdepvis",
    "view",
    "nodesep",
    "ranksep",
    "apidocroot",
    "apidocmap",
    "link",
];

fn invalid_value(rule: &OptionRule, what: &str) -> Diagnostic {
    Diagnostic::warning(format!("ignoring `{rule}`: invalid {what}"))
        .with_code(ErrorCode::E303)
}

fn parse_size(rule: &OptionRule, arg: &str) -> Result<f64, Diagnostic> {
    arg.parse::<f64>()
        .map_err(|_| invalid_value(rule, "number"))
}

impl ResolvedOptions {
    /// Applies one option rule.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic to log when the rule names an unknown option,
    /// lacks its argument or carries an invalid one. The options are left
    /// unchanged in that case, except for `all`-style rules that were
    /// already applied in full.
    pub fn apply(&mut self, rule: &OptionRule) -> Result<(), Diagnostic> {
        let positive = !rule.negated();
        let name = rule.name().to_ascii_lowercase();

        if positive && rule.arg(0).is_none() && WITH_ARGUMENT.contains(&name.as_str()) {
            return Err(
                Diagnostic::warning(format!("skipping option `{rule}`: missing argument"))
                    .with_code(ErrorCode::E302),
            );
        }
        if name == "contextpattern" && rule.args().len() < 2 {
            return Err(Diagnostic::warning(format!(
                "skipping option `{rule}`: expected a relation kind and a direction"
            ))
            .with_code(ErrorCode::E302)
            .with_help("example: `contextPattern navassoc out`"));
        }
        if positive && name == "linkoffline" && rule.args().len() < 2 {
            return Err(Diagnostic::warning(format!(
                "skipping option `{rule}`: expected a documentation URL and a package list location"
            ))
            .with_code(ErrorCode::E302));
        }
        let arg = rule.arg(0).unwrap_or_default();
        let text = |default: &str| {
            if positive {
                arg.to_string()
            } else {
                default.to_string()
            }
        };
        let optional = || positive.then(|| arg.to_string());

        match name.as_str() {
            "qualify" => self.show_qualified = positive,
            "qualifygenerics" => self.show_qualified_generics = positive,
            "hidegenerics" => self.hide_generics = positive,
            "horizontal" => self.horizontal = positive,
            "attributes" => self.show_attributes = positive,
            "enumconstants" => self.show_enum_constants = positive,
            "operations" => self.show_operations = positive,
            "enumerations" => self.show_enumerations = positive,
            "constructors" => self.show_constructors = positive,
            "visibility" => self.show_visibility = positive,
            "types" => self.show_type = positive,
            "autosize" => self.auto_size = positive,
            "commentname" => self.show_comment = positive,
            "all" => self.set_all(),
            "postfixpackage" => self.postfix_package = positive,
            "noguillemot" => self.use_guillemets = !positive,
            "compact" => self.compact = positive,

            "bgcolor" => self.bg_color = optional(),
            "edgecolor" => self.edge_color = text(DEFAULT_COLOR),
            "edgefontcolor" => self.edge_font_color = text(DEFAULT_COLOR),
            "edgefontname" => self.edge_font_name = text(DEFAULT_FONT),
            "edgefontsize" => {
                self.edge_font_size = match positive {
                    true => parse_size(rule, arg)?,
                    false => DEFAULT_FONT_SIZE,
                }
            }
            "nodefontcolor" => self.node_font_color = text(DEFAULT_COLOR),
            "nodefontname" => self.node_font_name = text(DEFAULT_FONT),
            "nodefontsize" => {
                self.node_font_size = match positive {
                    true => parse_size(rule, arg)?,
                    false => DEFAULT_FONT_SIZE,
                }
            }
            "nodefontabstractname" => self.node_font_abstract_name = optional(),
            "nodefontabstractitalic" => self.node_font_abstract_italic = positive,
            "nodefontclassname" => self.node_font_class_name = optional(),
            "nodefontclasssize" => {
                self.node_font_class_size = positive.then(|| parse_size(rule, arg)).transpose()?
            }
            "nodefonttagname" => self.node_font_tag_name = optional(),
            "nodefonttagsize" => {
                self.node_font_tag_size = positive.then(|| parse_size(rule, arg)).transpose()?
            }
            "nodefontpackagename" => self.node_font_package_name = optional(),
            "nodefontpackagesize" => {
                self.node_font_package_size =
                    positive.then(|| parse_size(rule, arg)).transpose()?
            }
            "nodefillcolor" => self.node_fill_color = optional(),
            "shape" => {
                self.shape = match positive {
                    true => arg.parse().map_err(|_| {
                        invalid_value(rule, "shape").with_help(
                            "available shapes: class, note, node, component, package, \
                             collaboration, usecase, activeclass",
                        )
                    })?,
                    false => Shape::Class,
                }
            }
            "output" => self.output = text(DEFAULT_OUTPUT),
            "nodesep" => {
                self.nodesep = match positive {
                    true => parse_size(rule, arg)?,
                    false => DEFAULT_NODESEP,
                }
            }
            "ranksep" => {
                self.ranksep = match positive {
                    true => parse_size(rule, arg)?,
                    false => DEFAULT_RANKSEP,
                }
            }

            "views" => self.find_views = positive,
            "view" => self.view_name = optional(),

            "hide" => match (positive, rule.arg(0)) {
                (false, _) => self.hide.clear(),
                (true, None) => {
                    self.hide.clear();
                    self.hide.push(NamePattern::any());
                }
                (true, Some(source)) => self.hide.push(compile(rule, source)?),
            },
            "include" => match positive {
                true => self.include.push(compile(rule, arg)?),
                false => self.include.clear(),
            },
            "collpackages" => match positive {
                true => self.coll_packages.push(compile(rule, arg)?),
                false => self.coll_packages.clear(),
            },

            "inferrel" => self.infer_relationships = positive,
            "inferreltype" => {
                self.infer_relationship_kind = match positive {
                    true => arg
                        .parse()
                        .map_err(|_| invalid_value(rule, "relation kind"))?,
                    false => RelationKind::NavAssoc,
                }
            }
            "inferdep" => self.infer_dependencies = positive,
            "inferdepinpackage" => self.infer_dep_in_package = positive,
            "inferdepvis" => {
                self.infer_dependency_visibility = match positive {
                    true => arg
                        .parse()
                        .map_err(|_| invalid_value(rule, "visibility"))?,
                    false => Visibility::Private,
                }
            }
            "useimports" => self.use_imports = positive,
            "contextpattern" => self.apply_context_pattern(rule)?,
            "hideprivateinner" => self.hide_private_inner = positive,

            "apidocroot" => self.links.set_api_doc_root(positive.then_some(arg)),
            "apidocmap" => match positive {
                true => self.links.load_map(arg)?,
                false => self.links.clear_map(),
            },
            "link" | "linkoffline" if !positive => self.links.clear_map(),
            "link" => self.links.add_link(arg)?,
            "linkoffline" => {
                if let (Some(doc_url), Some(package_list)) = (rule.arg(0), rule.arg(1)) {
                    self.links.add_link_offline(doc_url, package_list)?;
                }
            }

            _ => {
                return Err(
                    Diagnostic::warning(format!("ignoring unknown option `{}`", rule.name()))
                        .with_code(ErrorCode::E301),
                );
            }
        }
        trace!(option:% = rule; "Applied option");
        Ok(())
    }

    fn apply_context_pattern(&mut self, rule: &OptionRule) -> Result<(), Diagnostic> {
        let (Some(kind), Some(direction)) = (rule.arg(0), rule.arg(1)) else {
            return Ok(());
        };
        let direction: RelationDirection = direction
            .parse()
            .map_err(|_| invalid_value(rule, "relation direction"))?;
        if kind.eq_ignore_ascii_case("all") {
            self.context_pattern = RelationPattern::new(direction);
        } else {
            let kind: RelationKind = kind
                .parse()
                .map_err(|_| invalid_value(rule, "relation kind"))?;
            self.context_pattern.add_relation(kind, direction);
        }
        Ok(())
    }

    /// Parses and applies an option string, logging it on behalf of
    /// `subject` if it is skipped.
    pub fn apply_str(&mut self, subject: &str, text: &str) {
        let applied = parse_option(text).and_then(|rule| self.apply(&rule));
        if let Err(diag) = applied {
            diag.log_skip(subject);
        }
    }

    /// Applies every `@opt` tag of `decl`, in declaration order.
    pub fn apply_tags(&mut self, decl: &TypeDecl) {
        for tag in decl.tags_named("opt") {
            self.apply_str(decl.name(), tag.text());
        }
    }

    /// Shows every kind of member with visibility and types.
    pub fn set_all(&mut self) {
        self.show_attributes = true;
        self.show_enumerations = true;
        self.show_enum_constants = true;
        self.show_operations = true;
        self.show_constructors = true;
        self.show_visibility = true;
        self.show_type = true;
    }

    pub fn matches_hide(&self, name: &str) -> bool {
        self.hide.iter().any(|pattern| pattern.is_match(name))
    }

    pub fn matches_include(&self, name: &str) -> bool {
        self.include.iter().any(|pattern| pattern.is_match(name))
    }

    pub fn matches_coll_package(&self, name: &str) -> bool {
        self.coll_packages.iter().any(|pattern| pattern.is_match(name))
    }

    /// Whether `name` is hidden: it matches a hide pattern and no include
    /// pattern.
    pub fn hides(&self, name: &str) -> bool {
        self.matches_hide(name) && !self.matches_include(name)
    }

    /// Opening and closing guillemets, as HTML entities.
    pub fn guillemets(&self) -> (&'static str, &'static str) {
        if self.use_guillemets {
            ("&#171;", "&#187;")
        } else {
            ("&lt;&lt;", "&gt;&gt;")
        }
    }

    /// Replaces every `<` and `>` of `text` with guillemets.
    pub fn guillemize(&self, text: &str) -> String {
        let (open, close) = self.guillemets();
        text.chars().fold(String::with_capacity(text.len()), |mut out, c| {
            match c {
                '<' => out.push_str(open),
                '>' => out.push_str(close),
                c => out.push(c),
            }
            out
        })
    }

    /// Wraps `text` in guillemets.
    pub fn guillemet_wrap(&self, text: &str) -> String {
        let (open, close) = self.guillemets();
        format!("{open}{text}{close}")
    }

    /// The face and size label text of the given role is drawn with.
    pub fn font(&self, font: Font) -> Option<FontSpec<'_>> {
        let italic = self.node_font_abstract_italic;
        match font {
            Font::Normal => None,
            Font::Abstract => Some(FontSpec {
                face: self.node_font_abstract_name.as_deref(),
                size: Some(self.node_font_size),
                italic,
            }),
            Font::Class => Some(FontSpec {
                face: self.node_font_class_name.as_deref(),
                size: self.node_font_class_size,
                italic: false,
            }),
            Font::ClassAbstract => Some(FontSpec {
                face: self
                    .node_font_abstract_name
                    .as_deref()
                    .or(self.node_font_class_name.as_deref()),
                size: self.node_font_class_size,
                italic,
            }),
            Font::Package => Some(FontSpec {
                face: self.node_font_package_name.as_deref(),
                size: self.node_font_package_size,
                italic: false,
            }),
            Font::Tag => Some(FontSpec {
                face: self.node_font_tag_name.as_deref(),
                size: self.node_font_tag_size,
                italic: false,
            }),
        }
    }

    pub(crate) fn set_show_qualified(&mut self, show: bool) {
        self.show_qualified = show;
    }

    pub(crate) fn set_node_fill_color(&mut self, color: impl Into<String>) {
        self.node_fill_color = Some(color.into());
    }

    pub(crate) fn set_output(&mut self, output: impl Into<String>) {
        self.output = output.into();
    }

    /// Hides every name.
    pub(crate) fn hide_all(&mut self) {
        self.hide.clear();
        self.hide.push(NamePattern::any());
    }

    pub(crate) fn clear_hide(&mut self) {
        self.hide.clear();
    }

    pub(crate) fn set_show_attributes(&mut self, show: bool) {
        self.show_attributes = show;
    }

    pub(crate) fn set_show_operations(&mut self, show: bool) {
        self.show_operations = show;
    }

    pub(crate) fn set_context_pattern(&mut self, pattern: RelationPattern) {
        self.context_pattern = pattern;
    }

    /// Makes documentation links of model types relative to `package`.
    pub(crate) fn set_link_context(&mut self, package: &str) {
        self.links.set_context_package(package);
    }

    pub fn show_qualified(&self) -> bool {
        self.show_qualified
    }

    pub fn show_qualified_generics(&self) -> bool {
        self.show_qualified_generics
    }

    pub fn hide_generics(&self) -> bool {
        self.hide_generics
    }

    pub fn horizontal(&self) -> bool {
        self.horizontal
    }

    pub fn show_attributes(&self) -> bool {
        self.show_attributes
    }

    pub fn show_enumerations(&self) -> bool {
        self.show_enumerations
    }

    pub fn show_enum_constants(&self) -> bool {
        self.show_enum_constants
    }

    pub fn show_operations(&self) -> bool {
        self.show_operations
    }

    pub fn show_constructors(&self) -> bool {
        self.show_constructors
    }

    pub fn show_visibility(&self) -> bool {
        self.show_visibility
    }

    pub fn show_type(&self) -> bool {
        self.show_type
    }

    /// Whether nodes are named by their comment instead of their name.
    pub fn show_comment(&self) -> bool {
        self.show_comment
    }

    pub fn auto_size(&self) -> bool {
        self.auto_size
    }

    pub fn postfix_package(&self) -> bool {
        self.postfix_package
    }

    pub fn compact(&self) -> bool {
        self.compact
    }

    pub fn edge_font_name(&self) -> &str {
        &self.edge_font_name
    }

    pub fn edge_font_color(&self) -> &str {
        &self.edge_font_color
    }

    pub fn edge_font_size(&self) -> f64 {
        self.edge_font_size
    }

    pub fn edge_color(&self) -> &str {
        &self.edge_color
    }

    pub fn node_font_name(&self) -> &str {
        &self.node_font_name
    }

    pub fn node_font_color(&self) -> &str {
        &self.node_font_color
    }

    pub fn node_font_size(&self) -> f64 {
        self.node_font_size
    }

    pub fn node_fill_color(&self) -> Option<&str> {
        self.node_fill_color.as_deref()
    }

    pub fn bg_color(&self) -> Option<&str> {
        self.bg_color.as_deref()
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Output file of the diagram, relative to the output directory.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn nodesep(&self) -> f64 {
        self.nodesep
    }

    pub fn ranksep(&self) -> f64 {
        self.ranksep
    }

    /// Whether every view of the model is built.
    pub fn find_views(&self) -> bool {
        self.find_views
    }

    /// The single view to build, if one was selected.
    pub fn view_name(&self) -> Option<&str> {
        self.view_name.as_deref()
    }

    pub fn infer_relationships(&self) -> bool {
        self.infer_relationships
    }

    pub fn infer_relationship_kind(&self) -> RelationKind {
        self.infer_relationship_kind
    }

    pub fn infer_dependencies(&self) -> bool {
        self.infer_dependencies
    }

    pub fn infer_dep_in_package(&self) -> bool {
        self.infer_dep_in_package
    }

    /// Methods must be more visible than this to contribute dependencies;
    /// `Private` admits every method.
    pub fn infer_dependency_visibility(&self) -> Visibility {
        self.infer_dependency_visibility
    }

    pub fn use_imports(&self) -> bool {
        self.use_imports
    }

    /// Relation pattern a node's relations toward a context center must
    /// match to belong to the context.
    pub fn context_pattern(&self) -> &RelationPattern {
        &self.context_pattern
    }

    /// Whether private nested types are left out.
    pub fn hide_private_inner(&self) -> bool {
        self.hide_private_inner
    }

    /// Documentation roots for node hyperlinks.
    pub fn links(&self) -> &DocLinks {
        &self.links
    }
}
