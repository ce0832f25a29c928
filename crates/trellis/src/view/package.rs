use std::fmt;

use trellis_core::model::{TypeDecl, TypeModel};

use crate::{matcher::Matcher, options::ResolvedOptions, resolver::ConfigurationResolver};

use super::package_path;

/// The diagram of one package: its own types, with unqualified names, and
/// nothing else.
///
/// Written to `<package path>/<package>.dot`.
pub struct PackageView<'m, P> {
    package: String,
    parent: P,
    matcher: Matcher<'m>,
}

impl<'m, P: ConfigurationResolver> PackageView<'m, P> {
    pub fn new(model: &'m TypeModel, package: &str, parent: P) -> Self {
        Self {
            package: package.to_string(),
            parent,
            matcher: Matcher::Package {
                model,
                package: package.to_string(),
            },
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }
}

impl<P: ConfigurationResolver> ConfigurationResolver for PackageView<'_, P> {
    fn global_options(&self) -> ResolvedOptions {
        let mut opts = self.parent.global_options();
        opts.set_output(package_path(
            &self.package,
            &format!("{}.dot", self.package),
        ));
        opts.set_link_context(&self.package);
        opts.hide_all();
        opts
    }

    fn options_for(&self, decl: &TypeDecl) -> ResolvedOptions {
        let mut opts = self.parent.global_options();
        self.override_for(&mut opts, decl);
        opts
    }

    fn options_for_name(&self, name: &str) -> ResolvedOptions {
        let mut opts = self.parent.global_options();
        self.override_for_name(&mut opts, name);
        opts
    }

    fn override_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl) {
        opts.apply_tags(decl);
        opts.set_show_qualified(false);
        if !self.matcher.matches(decl) || self.parent.global_options().hides(decl.name()) {
            opts.hide_all();
        }
    }

    fn override_for_name(&self, opts: &mut ResolvedOptions, name: &str) {
        opts.set_show_qualified(false);
        if !self.matcher.matches_name(name) {
            opts.hide_all();
        }
    }

    fn display_name(&self) -> String {
        format!("package view for package {}", self.package)
    }
}

impl<P: ConfigurationResolver> fmt::Debug for PackageView<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageView")
            .field("package", &self.package)
            .field("parent", &self.parent.display_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> TypeModel {
        TypeModel::from_decls([
            TypeDecl::class("com.acme.Order").with_tag("opt", "attributes"),
            TypeDecl::class("com.acme.Secret"),
            TypeDecl::class("com.other.Util"),
        ])
    }

    #[test]
    fn test_selects_the_package() {
        let model = model();
        let mut base = ResolvedOptions::default();
        base.apply_str("test", "qualify");
        let view = PackageView::new(&model, "com.acme", &base);

        let order = view.options_for(model.get("com.acme.Order").unwrap());
        assert!(!order.hides("com.acme.Order"));
        assert!(!order.show_qualified());
        assert!(order.show_attributes());

        let util = view.options_for(model.get("com.other.Util").unwrap());
        assert!(util.hides("com.other.Util"));
        assert!(view.options_for_name("java.util.List").hides("java.util.List"));
        assert!(!view.options_for_name("com.acme.Order").hides("com.acme.Order"));
    }

    #[test]
    fn test_parent_hide_still_applies() {
        let model = model();
        let mut base = ResolvedOptions::default();
        base.apply_str("test", "hide .*Secret");
        let view = PackageView::new(&model, "com.acme", &base);

        let secret = view.options_for(model.get("com.acme.Secret").unwrap());
        assert!(secret.hides("com.acme.Secret"));
    }

    #[test]
    fn test_global_options() {
        let model = model();
        let base = ResolvedOptions::default();
        let view = PackageView::new(&model, "com.acme", &base);
        let global = view.global_options();

        assert_eq!(global.output(), "com/acme/com.acme.dot");
        assert!(global.hides("anything"));
        assert_eq!(
            global.links().url("com.acme.Order", "com.acme", "Order", true).as_deref(),
            Some("./Order.html")
        );
        assert_eq!(view.display_name(), "package view for package com.acme");
    }
}
