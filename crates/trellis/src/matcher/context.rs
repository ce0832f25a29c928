//! Context matching: a type and its direct neighbours.

use std::{cell::RefCell, collections::HashSet, fmt};

use log::debug;

use trellis_core::model::{TypeDecl, TypeModel};

use crate::{
    builder::GraphBuilder,
    infer,
    options::{NamePattern, ResolvedOptions},
};

/// The relation graph explored so far.
struct Explored<'m> {
    builder: GraphBuilder<'m, ResolvedOptions>,
    visited: HashSet<String>,
    centers: Vec<String>,
}

impl<'m> Explored<'m> {
    /// Adds `decl` and its relations to the graph, once.
    fn add(&mut self, decl: &TypeDecl, options: &ResolvedOptions) {
        if !self.visited.insert(decl.name().to_string()) {
            return;
        }
        self.builder.print_class(decl);
        self.builder.print_relations(decl);
        if options.infer_relationships() {
            infer::infer_relations(&mut self.builder, decl);
        }
        if options.infer_dependencies() {
            infer::infer_dependencies(&mut self.builder, decl);
        }
    }
}

/// Matches the types directly related to a set of center types.
///
/// The centers are the root types whose name matches a pattern. A type
/// matches when it is a center, or when some center has a relation toward
/// it that the options' context pattern accepts. Relations are discovered
/// by building a private diagram of the centers and every type asked about,
/// with hiding, attributes and operations switched off. The graph is built
/// lazily and kept across calls, including across
/// [`set_context_center`](Self::set_context_center).
pub struct ContextMatcher<'m> {
    model: &'m TypeModel,
    pattern: RefCell<NamePattern>,
    parent: ResolvedOptions,
    options: ResolvedOptions,
    keep_parent_hide: bool,
    explored: RefCell<Explored<'m>>,
}

impl<'m> ContextMatcher<'m> {
    /// Creates a matcher centered on the root types matching `pattern`.
    ///
    /// With `keep_parent_hide`, types the hide patterns of `options` hide
    /// never match.
    pub fn new(
        model: &'m TypeModel,
        pattern: NamePattern,
        options: &ResolvedOptions,
        keep_parent_hide: bool,
    ) -> Self {
        let mut own = options.clone();
        own.clear_hide();
        own.set_show_attributes(false);
        own.set_show_operations(false);

        let explored = Explored {
            builder: GraphBuilder::new(model, own.clone()),
            visited: HashSet::new(),
            centers: Vec::new(),
        };
        let matcher = Self {
            model,
            pattern: RefCell::new(pattern.clone()),
            parent: options.clone(),
            options: own,
            keep_parent_hide,
            explored: RefCell::new(explored),
        };
        matcher.set_context_center(pattern);
        matcher
    }

    /// Re-centers the matcher on the root types matching `pattern`, keeping
    /// the relations explored so far.
    pub fn set_context_center(&self, pattern: NamePattern) {
        let mut explored = self.explored.borrow_mut();
        explored.centers.clear();
        for decl in self.model.roots() {
            if pattern.is_match(decl.name()) {
                explored.centers.push(decl.name().to_string());
                explored.add(decl, &self.options);
            }
        }
        debug!(
            pattern = pattern.as_str(),
            centers = explored.centers.len();
            "Context center set"
        );
        *self.pattern.borrow_mut() = pattern;
    }

    /// Names of the current center types.
    pub fn centers(&self) -> Vec<String> {
        self.explored.borrow().centers.clone()
    }

    pub fn matches(&self, decl: &TypeDecl) -> bool {
        if self.keep_parent_hide && self.parent.matches_hide(decl.name()) {
            return false;
        }
        {
            let mut explored = self.explored.borrow_mut();
            if explored.centers.iter().any(|center| center == decl.name()) {
                return true;
            }
            explored.add(decl, &self.options);
        }
        self.matches_name(decl.name())
    }

    /// Whether `name` matches the center pattern or is related to a center.
    /// Only relations explored so far are considered.
    pub fn matches_name(&self, name: &str) -> bool {
        if self.pattern.borrow().is_match(name) {
            return true;
        }
        let explored = self.explored.borrow();
        let registry = explored.builder.registry();
        explored.centers.iter().any(|center| {
            registry
                .relation(center, name)
                .is_some_and(|pattern| self.options.context_pattern().matches_one(pattern))
        })
    }
}

impl fmt::Debug for ContextMatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextMatcher")
            .field("pattern", &self.pattern.borrow())
            .field("keep_parent_hide", &self.keep_parent_hide)
            .field("centers", &self.explored.borrow().centers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{
        model::TypeRef,
        relation::{RelationDirection, RelationPattern},
    };

    use super::*;

    fn model() -> TypeModel {
        TypeModel::from_decls([
            TypeDecl::class("a.A").with_tag("navassoc", "- - - B"),
            TypeDecl::class("a.B"),
            TypeDecl::class("a.C").with_tag("navassoc", "- - - A"),
            TypeDecl::class("a.D"),
            TypeDecl::class("a.E").with_superclass(TypeRef::class("a.A")),
        ])
    }

    fn pattern(source: &str) -> NamePattern {
        NamePattern::new(source).unwrap()
    }

    #[test]
    fn test_default_pattern_accepts_any_recorded_relation() {
        let model = model();
        let matcher =
            ContextMatcher::new(&model, pattern("a\\.A"), &ResolvedOptions::default(), false);
        let get = |name| model.get(name).unwrap();

        assert!(matcher.matches(get("a.A")));
        assert!(matcher.matches(get("a.B")));
        // the navigable association from C is only recorded on C's side
        assert!(!matcher.matches(get("a.C")));
        assert!(!matcher.matches(get("a.D")));
        // subclasses are recorded on the superclass as incoming
        assert!(matcher.matches(get("a.E")));
        assert_eq!(matcher.centers(), vec!["a.A".to_string()]);
    }

    #[test]
    fn test_outgoing_pattern() {
        let model = model();
        let mut opts = ResolvedOptions::default();
        opts.set_context_pattern(RelationPattern::new(RelationDirection::Out));
        let matcher = ContextMatcher::new(&model, pattern("a\\.A"), &opts, false);
        let get = |name| model.get(name).unwrap();

        assert!(matcher.matches(get("a.B")));
        assert!(!matcher.matches(get("a.E")));
        assert!(!matcher.matches(get("a.C")));
    }

    #[test]
    fn test_neighbours_of_neighbours_are_left_out() {
        let model = TypeModel::from_decls([
            TypeDecl::class("a.A").with_tag("navassoc", "- - - B"),
            TypeDecl::class("a.B").with_tag("navassoc", "- - - C"),
            TypeDecl::class("a.C"),
            TypeDecl::class("a.D"),
        ]);
        let mut opts = ResolvedOptions::default();
        opts.set_context_pattern(RelationPattern::new(RelationDirection::Out));
        let matcher = ContextMatcher::new(&model, pattern("a\\.A"), &opts, false);

        let matched: Vec<_> = ["a.A", "a.B", "a.C", "a.D"]
            .into_iter()
            .map(|name| matcher.matches(model.get(name).unwrap()))
            .collect();
        assert_eq!(matched, vec![true, true, false, false]);
    }

    #[test]
    fn test_parent_hide() {
        let model = model();
        let mut opts = ResolvedOptions::default();
        opts.apply_str("test", "hide a\\.B");

        let kept = ContextMatcher::new(&model, pattern("a\\.A"), &opts, true);
        assert!(!kept.matches(model.get("a.B").unwrap()));

        let ignored = ContextMatcher::new(&model, pattern("a\\.A"), &opts, false);
        assert!(ignored.matches(model.get("a.B").unwrap()));
    }

    #[test]
    fn test_recentering_reuses_the_graph() {
        let model = model();
        let matcher =
            ContextMatcher::new(&model, pattern("a\\.A"), &ResolvedOptions::default(), false);
        matcher.set_context_center(pattern("a\\.C"));
        assert_eq!(matcher.centers(), vec!["a.C".to_string()]);
        assert!(matcher.matches_name("a.A"));
        assert!(!matcher.matches_name("a.B"));
    }
}
