//! Trellis - Class relationship graphs and DOT diagrams from type models.
//!
//! A type model (classes, interfaces and enums with their members, supertypes
//! and documentation tags) is turned into a class diagram: one node per type,
//! one edge per relation, with associations and dependencies optionally
//! inferred from fields and signatures. Which types are drawn, and how, is
//! controlled by option rules from the configuration, from `@opt` tags and
//! from views.

pub mod builder;
pub mod config;
pub mod diagram;
pub mod export;
pub mod infer;
pub mod label;
pub mod link;
pub mod matcher;
pub mod options;
pub mod registry;
pub mod resolver;
pub mod shape;
pub mod view;

mod error;

pub use trellis_core::{model, relation};

pub use error::TrellisError;

use std::path::PathBuf;

use log::{debug, info, trace};

use builder::GraphBuilder;
use config::AppConfig;
use diagram::Diagram;
use export::{Exporter, dot::DotExporter};
use model::{TypeDecl, TypeModel};
use options::ResolvedOptions;
use resolver::ConfigurationResolver;
use view::{ContextView, PackageView, View};

/// Simple name of the type whose `@opt` tags apply to every diagram.
const GLOBAL_OPTIONS_TYPE: &str = "UMLOptions";

/// Simple name of the type whose `@opt` tags apply to every note.
const NOTE_OPTIONS_TYPE: &str = "UMLNoteOptions";

/// Builder for loading type models and producing class diagrams.
///
/// This provides an API for processing a model through loading, option
/// resolution, graph building and DOT rendering.
///
/// # Examples
///
/// ```rust
/// use trellis::{DiagramBuilder, config::AppConfig};
///
/// let source = r#"
///     [[types]]
///     name = "shop.Order"
///     tags = ["@composed - - * Line"]
///
///     [[types]]
///     name = "shop.Line"
/// "#;
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let model = builder.load(source).expect("Failed to load model");
///
/// let options = builder.base_options(&model);
/// let diagram = builder.build(&model, &options);
/// let dot = builder.render_dot(&diagram, &options);
/// assert!(dot.contains("arrowtail=diamond"));
/// ```
#[derive(Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load a type model from its TOML description.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Parse`] when the file is not a valid model
    /// description.
    pub fn load(&self, source: &str) -> Result<TypeModel, TrellisError> {
        let model = trellis_parser::load_model(source)
            .map_err(|err| TrellisError::new_parse_error(err, source))?;
        debug!(types = model.len(), roots = model.roots().count(); "Model loaded");
        Ok(model)
    }

    /// The root options of the model's diagrams: the configured rules, then
    /// the `@opt` tags of the `UMLOptions` type if the model has one.
    pub fn base_options(&self, model: &TypeModel) -> ResolvedOptions {
        let mut opts = self.config.base_options();
        if let Some(decl) = find_type(model, GLOBAL_OPTIONS_TYPE) {
            opts.apply_tags(decl);
        }
        trace!(options:? = opts; "Base options");
        opts
    }

    /// Options of notes: the configured rules, the `@opt` tags of the
    /// `UMLNoteOptions` type if the model has one and the note shape.
    pub fn note_options(&self, model: &TypeModel) -> ResolvedOptions {
        let mut opts = self.config.base_options();
        if let Some(decl) = find_type(model, NOTE_OPTIONS_TYPE) {
            opts.apply_tags(decl);
        }
        opts.apply_str(NOTE_OPTIONS_TYPE, "shape note");
        opts
    }

    /// Build the diagram of `model` as `resolver` sees it.
    pub fn build<R: ConfigurationResolver>(&self, model: &TypeModel, resolver: R) -> Diagram {
        GraphBuilder::new(model, resolver)
            .with_note_options(self.note_options(model))
            .build()
    }

    /// Render a diagram to DOT text.
    pub fn render_dot(&self, diagram: &Diagram, options: &ResolvedOptions) -> String {
        export::dot::render(diagram, options)
    }

    /// Where the diagram drawn with `options` is written.
    pub fn output_path(&self, options: &ResolvedOptions) -> PathBuf {
        self.config.output().dir().join(options.output())
    }

    /// Build the diagram of `model` as `resolver` sees it and write it to
    /// the resolver's output file.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Export`] when the file cannot be written.
    pub fn write_dot<R: ConfigurationResolver>(
        &self,
        model: &TypeModel,
        resolver: R,
    ) -> Result<PathBuf, TrellisError> {
        let options = resolver.global_options();
        let path = self.output_path(&options);
        info!(resolver = resolver.display_name(), path:?; "Writing diagram");

        let diagram = self.build(model, resolver);
        DotExporter::new(&path).export_diagram(&diagram, &options)?;
        Ok(path)
    }

    /// The views `base` asks for with `view <name>` or `views`.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Config`] when the named view does not exist,
    /// is not a view or is abstract.
    pub fn build_views<'m>(
        &self,
        model: &'m TypeModel,
        base: &ResolvedOptions,
    ) -> Result<Vec<View<'m>>, TrellisError> {
        view::build_views(model, base)
    }

    /// One package diagram per named package of the model's root types.
    pub fn package_views<'m, 'o>(
        &self,
        model: &'m TypeModel,
        base: &'o ResolvedOptions,
    ) -> Vec<PackageView<'m, &'o ResolvedOptions>> {
        model
            .packages()
            .into_iter()
            .filter(|package| !package.is_empty())
            .map(|package| PackageView::new(model, package, base))
            .collect()
    }

    /// One context diagram per root type of the model, views excluded.
    pub fn context_views<'m, 'o>(
        &self,
        model: &'m TypeModel,
        base: &'o ResolvedOptions,
    ) -> Vec<ContextView<'m, &'o ResolvedOptions>> {
        model
            .roots()
            .filter(|decl| !view::is_view(decl))
            .map(|decl| ContextView::new(model, decl, base))
            .collect()
    }
}

/// The root type with the simple name `name`.
fn find_type<'m>(model: &'m TypeModel, name: &str) -> Option<&'m TypeDecl> {
    model.roots().find(|decl| decl.simple_name() == name)
}
