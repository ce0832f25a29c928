//! Per-type option resolution.
//!
//! A [`ConfigurationResolver`] answers one question for the diagram
//! builder: which [`ResolvedOptions`] apply to this type, or to this name
//! the model does not declare. Resolvers are layered: a view resolves
//! through its parent and applies its own rules on top, and at the bottom
//! of every chain sits a plain [`ResolvedOptions`].
//!
//! Every query returns a fresh value; callers own and may modify it.

use trellis_core::model::TypeDecl;

use crate::options::ResolvedOptions;

/// Source of the options for every type of a diagram.
pub trait ConfigurationResolver {
    /// Options of the diagram as a whole.
    fn global_options(&self) -> ResolvedOptions;

    /// Options for a declared type.
    fn options_for(&self, decl: &TypeDecl) -> ResolvedOptions;

    /// Options for a type known only by name.
    fn options_for_name(&self, name: &str) -> ResolvedOptions;

    /// Applies this resolver's adjustments for `decl` to `opts`.
    fn override_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl);

    /// Like [`override_for`](Self::override_for), without the type's own
    /// `@opt` tags. Layers that apply the tags last go through this.
    fn rule_overrides_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl) {
        self.override_for(opts, decl);
    }

    /// Applies this resolver's adjustments for `name` to `opts`.
    fn override_for_name(&self, opts: &mut ResolvedOptions, name: &str);

    /// Human readable name used in log messages.
    fn display_name(&self) -> String;
}

/// The root resolver: the same options everywhere, plus the type's own
/// `@opt` tags.
impl ConfigurationResolver for ResolvedOptions {
    fn global_options(&self) -> ResolvedOptions {
        self.clone()
    }

    fn options_for(&self, decl: &TypeDecl) -> ResolvedOptions {
        let mut opts = self.clone();
        self.override_for(&mut opts, decl);
        opts
    }

    fn options_for_name(&self, name: &str) -> ResolvedOptions {
        let mut opts = self.clone();
        self.override_for_name(&mut opts, name);
        opts
    }

    fn override_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl) {
        opts.apply_tags(decl);
    }

    fn rule_overrides_for(&self, _opts: &mut ResolvedOptions, _decl: &TypeDecl) {}

    fn override_for_name(&self, _opts: &mut ResolvedOptions, _name: &str) {}

    fn display_name(&self) -> String {
        "class diagram".to_string()
    }
}

impl<R: ConfigurationResolver + ?Sized> ConfigurationResolver for &R {
    fn global_options(&self) -> ResolvedOptions {
        (**self).global_options()
    }

    fn options_for(&self, decl: &TypeDecl) -> ResolvedOptions {
        (**self).options_for(decl)
    }

    fn options_for_name(&self, name: &str) -> ResolvedOptions {
        (**self).options_for_name(name)
    }

    fn override_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl) {
        (**self).override_for(opts, decl)
    }

    fn rule_overrides_for(&self, opts: &mut ResolvedOptions, decl: &TypeDecl) {
        (**self).rule_overrides_for(opts, decl)
    }

    fn override_for_name(&self, opts: &mut ResolvedOptions, name: &str) {
        (**self).override_for_name(opts, name)
    }

    fn display_name(&self) -> String {
        (**self).display_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_resolver_applies_own_tags_only() {
        let base = ResolvedOptions::default();
        let decl = trellis_core::model::TypeDecl::class("a.A").with_tag("opt", "operations");

        assert!(base.options_for(&decl).show_operations());
        assert!(!base.options_for_name("a.A").show_operations());
        assert!(!base.global_options().show_operations());
    }

    #[test]
    fn test_every_query_is_fresh() {
        let base = ResolvedOptions::default();
        let mut first = base.global_options();
        first.set_all();
        assert!(!base.global_options().show_attributes());
    }
}
