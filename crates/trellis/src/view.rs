//! Views: named, layered option sets defined in the model itself.
//!
//! A type tagged `@view` describes one diagram. Its `@opt` tags before the
//! first `@match` tag are global rules; every `@match` tag opens a section
//! whose rules apply only to the types its [`Matcher`] selects:
//!
//! ```text
//! @view
//! @opt attributes
//! @match interface com\.acme\.Shape
//! @opt nodefillcolor lightBlue
//! @match class com\.acme\.internal\..*
//! @opt hide
//! ```
//!
//! Sections apply in declaration order and all matching sections apply.
//! A view whose superclass is itself a view resolves through it, so views
//! can be refined by subclassing.
//!
//! [`PackageView`] and [`ContextView`] are the generated per-package and
//! per-type diagrams.

mod context;
mod package;

pub use context::ContextView;
pub use package::PackageView;

use std::{collections::HashSet, fmt};

use log::{debug, info};

use trellis_core::model::{TypeDecl, TypeModel};
use trellis_parser::tags::{OptionRule, parse_match, parse_option};

use crate::{
    error::TrellisError, matcher::Matcher, options::ResolvedOptions,
    resolver::ConfigurationResolver,
};

/// Whether `decl` defines a view.
pub fn is_view(decl: &TypeDecl) -> bool {
    decl.has_tag("view")
}

/// Where the `@opt` tags of a view go while its tags are read.
enum Section {
    Global,
    Override(usize),
    Skipped,
}

/// A view built from the tags of a `@view` type.
pub struct View<'m> {
    name: String,
    parent: Box<dyn ConfigurationResolver + 'm>,
    global_rules: Vec<OptionRule>,
    overrides: Vec<(Matcher<'m>, Vec<OptionRule>)>,
}

impl<'m> View<'m> {
    /// Reads the view defined by `decl` on top of `parent`.
    ///
    /// Malformed `@match` and `@opt` tags are logged and skipped. The rules
    /// of a skipped `@match` section are skipped with it.
    pub fn new(
        model: &'m TypeModel,
        decl: &TypeDecl,
        parent: Box<dyn ConfigurationResolver + 'm>,
    ) -> Self {
        let mut view = Self {
            name: decl.name().to_string(),
            parent,
            global_rules: vec![OptionRule::new(
                "output",
                [format!("{}.dot", decl.simple_name())],
            )],
            overrides: Vec::new(),
        };

        let mut section = Section::Global;
        for tag in decl.tags() {
            match tag.name() {
                "match" => {
                    let matcher = parse_match(tag.text()).and_then(|spec| {
                        Matcher::from_spec(model, &spec, &view.global_options())
                    });
                    section = match matcher {
                        Ok(matcher) => {
                            view.overrides.push((matcher, Vec::new()));
                            Section::Override(view.overrides.len() - 1)
                        }
                        Err(diag) => {
                            diag.log_skip(decl.name());
                            Section::Skipped
                        }
                    };
                }
                "opt" => {
                    let rule = parse_option(tag.text()).and_then(|rule| {
                        ResolvedOptions::default().apply(&rule).map(|()| rule)
                    });
                    let rule = match rule {
                        Ok(rule) => rule,
                        Err(diag) => {
                            diag.log_skip(decl.name());
                            continue;
                        }
                    };
                    match section {
                        Section::Global => view.global_rules.push(rule),
                        Section::Override(i) => view.overrides[i].1.push(rule),
                        Section::Skipped => {}
                    }
                }
                _ => {}
            }
        }

        debug!(
            view = view.name,
            global_rules = view.global_rules.len(),
            sections = view.overrides.len();
            "View read"
        );
        view
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Applies rules checked when the view was read.
fn apply_rules(opts: &mut ResolvedOptions, rules: &[OptionRule], subject: &str) {
    for rule in rules {
        if let Err(diag) = opts.apply(rule) {
            diag.log_skip(subject);
        }
    }
}

impl ConfigurationResolver for View<'_> {
    fn global_options(&self) -> ResolvedOptions {
        let mut opts = self.parent.global_options();
        apply_rules(&mut opts, &self.global_rules, &self.name);
        opts
    }

    fn options_for(&self, decl: &TypeDecl) -> ResolvedOptions {
        let mut opts = self.global_options();
        self.override_for(&mut opts, decl);
        opts
    }

    fn options_for_name(&self, name: &str) -> ResolvedOptions {
        let mut opts = self.global_options();
        self.override_for_name(&mut opts, name);
        opts
    }

    fn override_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl) {
        self.rule_overrides_for(opts, decl);
        opts.apply_tags(decl);
    }

    fn rule_overrides_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl) {
        self.parent.rule_overrides_for(opts, decl);
        for (matcher, rules) in &self.overrides {
            if matcher.matches(decl) {
                apply_rules(opts, rules, &self.name);
            }
        }
    }

    fn override_for_name(&self, opts: &mut ResolvedOptions, name: &str) {
        self.parent.override_for_name(opts, name);
        for (matcher, rules) in &self.overrides {
            if matcher.matches_name(name) {
                apply_rules(opts, rules, &self.name);
            }
        }
    }

    fn display_name(&self) -> String {
        format!("view {}", self.name)
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("parent", &self.parent.display_name())
            .field("global_rules", &self.global_rules)
            .field("overrides", &self.overrides)
            .finish()
    }
}

/// Builds the view defined by `decl`, layered over the views it inherits
/// from and finally over `base`.
pub fn build_view<'m>(
    model: &'m TypeModel,
    decl: &'m TypeDecl,
    base: &ResolvedOptions,
) -> View<'m> {
    build_view_chain(model, decl, base, &mut HashSet::new())
}

fn build_view_chain<'m>(
    model: &'m TypeModel,
    decl: &'m TypeDecl,
    base: &ResolvedOptions,
    visited: &mut HashSet<String>,
) -> View<'m> {
    visited.insert(decl.name().to_string());
    let parent_view = decl
        .superclass()
        .and_then(|sup| model.resolve(sup))
        .filter(|sup| is_view(sup) && !visited.contains(sup.name()));
    let parent: Box<dyn ConfigurationResolver + 'm> = match parent_view {
        Some(sup) => Box::new(build_view_chain(model, sup, base, visited)),
        None => Box::new(base.clone()),
    };
    View::new(model, decl, parent)
}

/// Builds the views `base` asks for: the one named by `view <name>`, or
/// every concrete view with `views`. Returns no view otherwise.
///
/// # Errors
///
/// Returns [`TrellisError::Config`] when the named view does not exist, is
/// not tagged `@view` or is abstract.
pub fn build_views<'m>(
    model: &'m TypeModel,
    base: &ResolvedOptions,
) -> Result<Vec<View<'m>>, TrellisError> {
    if let Some(name) = base.view_name() {
        let decl = model
            .get(name)
            .or_else(|| model.roots().find(|decl| decl.simple_name() == name))
            .ok_or_else(|| TrellisError::Config(format!("view `{name}` not found")))?;
        if !is_view(decl) {
            return Err(TrellisError::Config(format!(
                "`{}` is not a view: it lacks a `@view` tag",
                decl.name()
            )));
        }
        if decl.is_abstract() {
            return Err(TrellisError::Config(format!(
                "view `{}` is abstract",
                decl.name()
            )));
        }
        info!(view = decl.name(); "Building view");
        return Ok(vec![build_view(model, decl, base)]);
    }

    if base.find_views() {
        let views: Vec<_> = model
            .roots()
            .filter(|decl| is_view(decl) && !decl.is_abstract())
            .map(|decl| build_view(model, decl, base))
            .collect();
        info!(count = views.len(); "Views found");
        return Ok(views);
    }

    Ok(Vec::new())
}

/// The output path of a generated diagram: the package directories, then
/// `file_name`.
fn package_path(package: &str, file_name: &str) -> String {
    if package.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{file_name}", package.replace('.', "/"))
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::model::TypeRef;

    use super::*;

    fn model() -> TypeModel {
        TypeModel::from_decls([
            TypeDecl::interface("a.Shape"),
            TypeDecl::class("a.Square").with_interface(TypeRef::class("a.Shape")),
            TypeDecl::class("b.Util"),
            TypeDecl::class("v.Base")
                .with_abstract(true)
                .with_tag("view", "")
                .with_tag("opt", "attributes"),
            TypeDecl::class("v.Shapes")
                .with_superclass(TypeRef::class("v.Base"))
                .with_tag("view", "")
                .with_tag("opt", "operations")
                .with_tag("match", "interface a\\.Shape")
                .with_tag("opt", "nodefillcolor lightBlue")
                .with_tag("match", "class b\\..*")
                .with_tag("opt", "hide"),
            TypeDecl::class("v.Broken")
                .with_tag("view", "")
                .with_tag("match", "class (oops")
                .with_tag("opt", "hide")
                .with_tag("opt", "bogus"),
        ])
    }

    fn base() -> ResolvedOptions {
        ResolvedOptions::default()
    }

    #[test]
    fn test_global_rules_and_inheritance() {
        let model = model();
        let view = build_view(&model, model.get("v.Shapes").unwrap(), &base());
        let global = view.global_options();

        assert!(global.show_attributes());
        assert!(global.show_operations());
        assert_eq!(global.output(), "Shapes.dot");
        assert_eq!(view.display_name(), "view v.Shapes");
    }

    #[test]
    fn test_sections_apply_to_matching_types() {
        let model = model();
        let view = build_view(&model, model.get("v.Shapes").unwrap(), &base());

        let square = view.options_for(model.get("a.Square").unwrap());
        assert_eq!(square.node_fill_color(), Some("lightBlue"));
        assert!(!square.hides("a.Square"));

        let util = view.options_for(model.get("b.Util").unwrap());
        assert_eq!(util.node_fill_color(), None);
        assert!(util.hides("b.Util"));
        assert!(view.options_for_name("b.Missing").hides("b.Missing"));
    }

    #[test]
    fn test_skipped_section_drops_its_rules() {
        let model = model();
        let view = build_view(&model, model.get("v.Broken").unwrap(), &base());
        let opts = view.options_for(model.get("a.Square").unwrap());
        assert!(!opts.hides("a.Square"));
    }

    #[test]
    fn test_own_tags_apply_once_and_last() {
        let model = TypeModel::from_decls([
            TypeDecl::class("a.Tagged")
                .with_tag("opt", "hide b\\..*")
                .with_tag("opt", "nodefillcolor red"),
            TypeDecl::class("v.Inner")
                .with_tag("view", "")
                .with_tag("match", "class a\\..*")
                .with_tag("opt", "nodefillcolor blue"),
            TypeDecl::class("v.Outer")
                .with_superclass(TypeRef::class("v.Inner"))
                .with_tag("view", ""),
        ]);
        let tagged = model.get("a.Tagged").unwrap();
        let view = build_view(&model, model.get("v.Outer").unwrap(), &base());

        let mut expected = view.global_options();
        expected.apply_str("test", "nodefillcolor blue");
        expected.apply_tags(tagged);

        let opts = view.options_for(tagged);
        assert_eq!(opts.node_fill_color(), Some("red"));
        assert_eq!(opts, expected);
    }

    #[test]
    fn test_explicit_output_wins() {
        let model = TypeModel::from_decls([TypeDecl::class("v.Out")
            .with_tag("view", "")
            .with_tag("opt", "output custom.dot")]);
        let view = build_view(&model, model.get("v.Out").unwrap(), &base());
        assert_eq!(view.global_options().output(), "custom.dot");
    }

    #[test]
    fn test_build_views() {
        let model = model();

        assert!(build_views(&model, &base()).unwrap().is_empty());

        let mut all = base();
        all.apply_str("test", "views");
        let names: Vec<_> = build_views(&model, &all)
            .unwrap()
            .iter()
            .map(|view| view.name().to_string())
            .collect();
        assert_eq!(names, ["v.Shapes", "v.Broken"]);

        let mut one = base();
        one.apply_str("test", "view Shapes");
        assert_eq!(build_views(&model, &one).unwrap()[0].name(), "v.Shapes");
    }

    #[test]
    fn test_named_view_errors() {
        let model = model();
        for name in ["Missing", "a.Square", "v.Base"] {
            let mut opts = base();
            opts.apply_str("test", &format!("view {name}"));
            assert!(matches!(
                build_views(&model, &opts),
                Err(TrellisError::Config(_))
            ));
        }
    }

    #[test]
    fn test_package_path() {
        assert_eq!(package_path("com.acme", "Order.dot"), "com/acme/Order.dot");
        assert_eq!(package_path("", "Order.dot"), "Order.dot");
    }
}
