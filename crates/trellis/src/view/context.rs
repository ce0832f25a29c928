use std::fmt;

use trellis_core::model::{TypeDecl, TypeModel};

use crate::{
    matcher::ContextMatcher,
    options::{NamePattern, ResolvedOptions},
    resolver::ConfigurationResolver,
};

use super::package_path;

const CENTER_FILL_COLOR: &str = "lemonChiffon";

/// The diagram of one type and its direct neighbours.
///
/// The center is painted lemon chiffon, types of its package lose their
/// qualification and every type the center is not related to is hidden.
/// Written to `<package path>/<SimpleName>.dot`.
///
/// One view can be moved from type to type with
/// [`set_context_center`](Self::set_context_center), reusing the relations
/// explored so far.
pub struct ContextView<'m, P> {
    center: String,
    center_package: String,
    parent: P,
    global: ResolvedOptions,
    package_options: ResolvedOptions,
    view_global: ResolvedOptions,
    hide_options: ResolvedOptions,
    center_options: ResolvedOptions,
    matcher: ContextMatcher<'m>,
}

impl<'m, P: ConfigurationResolver> ContextView<'m, P> {
    pub fn new(model: &'m TypeModel, center: &TypeDecl, parent: P) -> Self {
        let global = parent.global_options();

        let mut package_options = global.clone();
        package_options.set_show_qualified(false);

        let mut hide_options = global.clone();
        hide_options.hide_all();

        let mut center_options = global.clone();
        center_options.set_node_fill_color(CENTER_FILL_COLOR);
        center_options.set_show_qualified(false);

        let matcher = ContextMatcher::new(model, NamePattern::exact(center.name()), &global, true);

        let mut view = Self {
            center: String::new(),
            center_package: String::new(),
            parent,
            view_global: hide_options.clone(),
            global,
            package_options,
            hide_options,
            center_options,
            matcher,
        };
        view.set_center(center);
        view
    }

    /// Moves the view to `center`.
    pub fn set_context_center(&mut self, center: &TypeDecl) {
        self.set_center(center);
        self.matcher
            .set_context_center(NamePattern::exact(center.name()));
    }

    fn set_center(&mut self, center: &TypeDecl) {
        self.center = center.name().to_string();
        self.center_package = center.package().to_string();
        self.view_global.set_output(package_path(
            center.package(),
            &format!("{}.dot", center.simple_name()),
        ));
        self.view_global.set_link_context(center.package());
    }

    pub fn center(&self) -> &str {
        &self.center
    }
}

impl<P: ConfigurationResolver> ConfigurationResolver for ContextView<'_, P> {
    fn global_options(&self) -> ResolvedOptions {
        self.view_global.clone()
    }

    fn options_for(&self, decl: &TypeDecl) -> ResolvedOptions {
        let base = if self.global.hides(decl.name()) || !self.matcher.matches(decl) {
            &self.hide_options
        } else if decl.name() == self.center {
            &self.center_options
        } else if decl.package() == self.center_package {
            &self.package_options
        } else {
            &self.global
        };
        let mut opts = base.clone();
        self.override_for(&mut opts, decl);
        opts
    }

    fn options_for_name(&self, name: &str) -> ResolvedOptions {
        let base = if !self.matcher.matches_name(name) {
            &self.hide_options
        } else if name == self.center {
            &self.center_options
        } else {
            &self.global
        };
        let mut opts = base.clone();
        self.override_for_name(&mut opts, name);
        opts
    }

    fn override_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl) {
        opts.apply_tags(decl);
        if opts.hides(decl.name()) || !self.matcher.matches(decl) {
            opts.hide_all();
        }
        if decl.name() == self.center {
            opts.set_node_fill_color(CENTER_FILL_COLOR);
        }
    }

    fn override_for_name(&self, opts: &mut ResolvedOptions, name: &str) {
        if !self.matcher.matches_name(name) {
            opts.hide_all();
        }
    }

    fn display_name(&self) -> String {
        format!("context view for class {}", self.center)
    }
}

impl<P: ConfigurationResolver> fmt::Debug for ContextView<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextView")
            .field("center", &self.center)
            .field("parent", &self.parent.display_name())
            .field("matcher", &self.matcher)
            .finish()
    }
}
