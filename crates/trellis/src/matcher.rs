//! Type predicates used to select the types a set of options applies to.
//!
//! Views attach option overrides to matchers through `@match` sections,
//! package diagrams select their package with a [`Matcher::Package`] and
//! context diagrams select the neighbourhood of one type with a
//! [`ContextMatcher`].

mod context;

pub use context::ContextMatcher;

use std::collections::HashSet;

use trellis_core::{
    model::{TypeDecl, TypeModel},
    relation::{RelationDirection, RelationPattern},
};
use trellis_parser::{
    error::{Diagnostic, ErrorCode},
    tags::{MatchKind, MatchSpec},
};

use crate::options::{NamePattern, ResolvedOptions};

/// A predicate over types and type names.
#[derive(Debug)]
pub enum Matcher<'m> {
    /// The name matches the pattern.
    Pattern(NamePattern),
    /// The type is a matching interface or implements one, directly or
    /// through its supertypes.
    Interface {
        model: &'m TypeModel,
        pattern: NamePattern,
    },
    /// The type or one of its superclasses matches.
    Subclass {
        model: &'m TypeModel,
        pattern: NamePattern,
    },
    /// The type belongs to the package.
    Package {
        model: &'m TypeModel,
        package: String,
    },
    /// The type is related to a matching center type.
    Context(ContextMatcher<'m>),
}

impl<'m> Matcher<'m> {
    /// Builds the matcher of a `@match` section. Context matchers explore
    /// the model with `options`; package matchers take the pattern as a
    /// package name.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic to log when the pattern is not a valid regular
    /// expression.
    pub fn from_spec(
        model: &'m TypeModel,
        spec: &MatchSpec,
        options: &ResolvedOptions,
    ) -> Result<Self, Diagnostic> {
        let compile = || {
            NamePattern::new(spec.pattern()).map_err(|err| {
                Diagnostic::warning(format!(
                    "skipping `@match {} {}`: invalid pattern",
                    spec.kind(),
                    spec.pattern()
                ))
                .with_code(ErrorCode::E300)
                .with_help(err.to_string())
            })
        };
        Ok(match spec.kind() {
            MatchKind::Class => Matcher::Pattern(compile()?),
            MatchKind::Interface => Matcher::Interface {
                model,
                pattern: compile()?,
            },
            MatchKind::Subclass => Matcher::Subclass {
                model,
                pattern: compile()?,
            },
            MatchKind::Context => {
                Matcher::Context(ContextMatcher::new(model, compile()?, options, false))
            }
            MatchKind::OutgoingContext => {
                let mut options = options.clone();
                options.set_context_pattern(RelationPattern::new(RelationDirection::Out));
                Matcher::Context(ContextMatcher::new(model, compile()?, &options, false))
            }
            MatchKind::Package => Matcher::Package {
                model,
                package: spec.pattern().to_string(),
            },
        })
    }

    pub fn matches(&self, decl: &TypeDecl) -> bool {
        match self {
            Matcher::Pattern(pattern) => pattern.is_match(decl.name()),
            Matcher::Interface { model, pattern } => {
                implements(model, decl, pattern, &mut HashSet::new())
            }
            Matcher::Subclass { model, pattern } => {
                extends(model, decl, pattern, &mut HashSet::new())
            }
            Matcher::Package { package, .. } => decl.package() == package,
            Matcher::Context(context) => context.matches(decl),
        }
    }

    /// Matches a name, through its declaration where the kind of matcher
    /// needs one. Names the model does not declare match neither interface
    /// nor subclass matchers.
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Matcher::Pattern(pattern) => pattern.is_match(name),
            Matcher::Interface { model, .. } | Matcher::Subclass { model, .. } => {
                model.get(name).is_some_and(|decl| self.matches(decl))
            }
            Matcher::Package { model, package } => model
                .get(name)
                .is_some_and(|decl| !decl.is_library() && decl.package() == package),
            Matcher::Context(context) => context.matches_name(name),
        }
    }
}

fn implements(
    model: &TypeModel,
    decl: &TypeDecl,
    pattern: &NamePattern,
    visited: &mut HashSet<String>,
) -> bool {
    if !visited.insert(decl.name().to_string()) {
        return false;
    }
    if decl.is_interface() && pattern.is_match(decl.name()) {
        return true;
    }
    decl.supertypes()
        .filter_map(|sup| model.resolve(sup))
        .any(|sup| implements(model, sup, pattern, visited))
}

fn extends(
    model: &TypeModel,
    decl: &TypeDecl,
    pattern: &NamePattern,
    visited: &mut HashSet<String>,
) -> bool {
    if !visited.insert(decl.name().to_string()) {
        return false;
    }
    if pattern.is_match(decl.name()) {
        return true;
    }
    decl.superclass()
        .and_then(|sup| model.resolve(sup))
        .is_some_and(|sup| extends(model, sup, pattern, visited))
}

#[cfg(test)]
mod tests {
    use trellis_core::model::TypeRef;

    use super::*;

    fn model() -> TypeModel {
        TypeModel::from_decls([
            TypeDecl::interface("a.Shape"),
            TypeDecl::interface("a.Solid").with_interface(TypeRef::class("a.Shape")),
            TypeDecl::class("a.Cube").with_interface(TypeRef::class("a.Solid")),
            TypeDecl::class("b.Dice").with_superclass(TypeRef::class("a.Cube")),
            TypeDecl::class("b.Plain"),
            TypeDecl::class("c.Ouro").with_superclass(TypeRef::class("c.Boros")),
            TypeDecl::class("c.Boros").with_superclass(TypeRef::class("c.Ouro")),
        ])
    }

    fn spec(kind: MatchKind, pattern: &str) -> MatchSpec {
        MatchSpec::new(kind, pattern)
    }

    #[test]
    fn test_interface_matcher_is_transitive() {
        let model = model();
        let opts = ResolvedOptions::default();
        let matcher = Matcher::from_spec(&model, &spec(MatchKind::Interface, "a\\.Shape"), &opts)
            .unwrap();
        assert!(matcher.matches_name("a.Shape"));
        assert!(matcher.matches_name("a.Cube"));
        assert!(matcher.matches_name("b.Dice"));
        assert!(!matcher.matches_name("b.Plain"));
        assert!(!matcher.matches_name("x.Unknown"));
    }

    #[test]
    fn test_interface_matcher_requires_an_interface() {
        let model = model();
        let opts = ResolvedOptions::default();
        let matcher =
            Matcher::from_spec(&model, &spec(MatchKind::Interface, "a\\.Cube"), &opts).unwrap();
        assert!(!matcher.matches_name("b.Dice"));
    }

    #[test]
    fn test_subclass_matcher_and_cycles() {
        let model = model();
        let opts = ResolvedOptions::default();
        let matcher =
            Matcher::from_spec(&model, &spec(MatchKind::Subclass, "a\\.Cube"), &opts).unwrap();
        assert!(matcher.matches_name("b.Dice"));
        assert!(matcher.matches_name("a.Cube"));
        assert!(!matcher.matches_name("a.Solid"));
        assert!(!matcher.matches_name("c.Ouro"));
    }

    #[test]
    fn test_package_matcher() {
        let model = model();
        let opts = ResolvedOptions::default();
        let matcher = Matcher::from_spec(&model, &spec(MatchKind::Package, "b"), &opts).unwrap();
        assert!(matcher.matches(model.get("b.Plain").unwrap()));
        assert!(!matcher.matches(model.get("a.Cube").unwrap()));
        assert!(matcher.matches_name("b.Dice"));
        assert!(!matcher.matches_name("b.Missing"));
    }

    #[test]
    fn test_invalid_pattern() {
        let model = model();
        let err = Matcher::from_spec(
            &model,
            &spec(MatchKind::Class, "(oops"),
            &ResolvedOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E300));
    }
}
