//! Relation inference.
//!
//! Two passes add edges the model does not declare. Association inference
//! turns fields into associations of the configured kind, looking through
//! arrays and container types for the element type. Dependency inference
//! turns the types a class mentions in its signatures into dependencies.
//! Neither pass adds an edge between two types that are already related:
//! inferred edges only ever fill gaps left by explicit ones.

use std::collections::HashSet;

use indexmap::IndexSet;
use log::trace;

use trellis_core::{
    model::{
        BoundKind, TypeDecl, TypeModel, TypeRef, Visibility,
        prelude::{COLLECTION, MAP},
    },
    relation::{RelationDirection, RelationKind, RelationPattern},
};

use crate::{
    builder::{EdgeLabels, GraphBuilder},
    resolver::ConfigurationResolver,
};

/// The type a field relates its owner to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTarget {
    name: String,
    multiple: bool,
}

impl FieldTarget {
    /// Qualified name of the related type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field holds many values: an array or a container.
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }
}

/// Name a relation toward `type_ref` ends at: the named type, the element
/// of an array, or the upper bound of a wildcard.
fn target_name(type_ref: &TypeRef) -> Option<&str> {
    match type_ref {
        TypeRef::Wildcard(Some((BoundKind::Extends, bound))) => target_name(bound),
        other => other.qualified_name(),
    }
}

/// Finds the arguments `type_ref` passes to the interface `iface`, walking
/// its supertypes and substituting type arguments along the way.
fn interface_type_arguments(
    model: &TypeModel,
    iface: &str,
    type_ref: &TypeRef,
    visited: &mut HashSet<String>,
) -> Option<Vec<TypeRef>> {
    let name = match type_ref {
        TypeRef::Class { name, .. } => name,
        _ => return None,
    };
    if name == iface {
        return Some(type_ref.type_arguments().to_vec());
    }
    if !visited.insert(name.clone()) {
        return None;
    }
    let decl = model.get(name)?;
    decl.supertypes().find_map(|sup| {
        let sup = sup.substitute(decl.type_params(), type_ref.type_arguments());
        interface_type_arguments(model, iface, &sup, visited)
    })
}

/// The element type a container type holds: the single argument of a
/// collection, or the value argument of a map.
pub fn container_element(model: &TypeModel, type_ref: &TypeRef) -> Option<String> {
    let element = |iface: &str, arity: usize| {
        let args = interface_type_arguments(model, iface, type_ref, &mut HashSet::new())?;
        if args.len() != arity {
            return None;
        }
        target_name(&args[arity - 1]).map(str::to_string)
    };
    element(COLLECTION, 1).or_else(|| element(MAP, 2))
}

/// Resolves the type a field of type `type_ref` relates to.
///
/// Primitives, wildcards and type variables relate to nothing. Arrays
/// relate to their element type, many-valued. Types `is_container` accepts
/// are unwrapped to their element type when they implement the collection
/// or map interface; anything else relates to itself, single-valued.
pub fn field_target(
    model: &TypeModel,
    type_ref: &TypeRef,
    is_container: impl FnOnce(&str) -> bool,
) -> Option<FieldTarget> {
    if type_ref.is_opaque() {
        return None;
    }
    let name = type_ref.qualified_name()?;
    if type_ref.is_array() {
        return Some(FieldTarget {
            name: name.to_string(),
            multiple: true,
        });
    }
    if is_container(name) {
        if let Some(element) = container_element(model, type_ref) {
            return Some(FieldTarget {
                name: element,
                multiple: true,
            });
        }
    }
    Some(FieldTarget {
        name: name.to_string(),
        multiple: false,
    })
}

/// Adds an association for every field of `decl` whose type is not related
/// to `decl` yet.
pub fn infer_relations<R: ConfigurationResolver>(builder: &mut GraphBuilder<'_, R>, decl: &TypeDecl) {
    if builder.is_hidden(decl) {
        return;
    }
    let opts = builder.resolver().options_for(decl);
    let kind = opts.infer_relationship_kind();

    for field in decl.fields() {
        if field.is_static()
            || field.is_hidden()
            || opts.hides(&format!("{}.{}", decl.name(), field.name()))
        {
            continue;
        }
        let target = field_target(builder.model(), field.type_ref(), |name| {
            builder.options_for_ref(name).matches_coll_package(name)
        });
        let Some(target) = target else {
            continue;
        };
        if builder.is_hidden_ref(target.name()) {
            continue;
        }
        if builder
            .registry()
            .relation(decl.name(), target.name())
            .is_some()
        {
            continue;
        }
        trace!(from = decl.name(), field = field.name(), to = target.name(); "Inferred relation");
        let labels = EdgeLabels {
            head: if target.is_multiple() { "*" } else { "" },
            ..EdgeLabels::default()
        };
        builder.relation(&opts, kind, decl.name(), target.name(), labels);
    }
}

/// Package of a referenced type, through its declaration when the model has
/// one.
fn package_of<'a>(model: &'a TypeModel, name: &'a str) -> &'a str {
    match model.get(name) {
        Some(decl) => decl.package(),
        None => name.rsplit_once('.').map_or("", |(package, _)| package),
    }
}

/// Adds a dependency toward every type `decl` mentions in its method
/// signatures, type arguments, type parameter bounds and, when enabled, its
/// field types and imports.
pub fn infer_dependencies<R: ConfigurationResolver>(
    builder: &mut GraphBuilder<'_, R>,
    decl: &TypeDecl,
) {
    if builder.is_hidden(decl) {
        return;
    }
    let opts = builder.resolver().options_for(decl);
    let min_visibility = opts.infer_dependency_visibility();
    let visible = |visibility: Visibility| {
        min_visibility == Visibility::Private || visibility > min_visibility
    };

    let mut types: IndexSet<TypeRef> = IndexSet::new();
    for method in decl.methods().iter().filter(|m| visible(m.visibility())) {
        types.extend(method.return_type().cloned());
        types.extend(method.params().iter().map(|param| param.type_ref().clone()));
    }
    if !opts.infer_relationships() {
        types.extend(
            decl.fields()
                .iter()
                .filter(|field| visible(field.visibility()))
                .map(|field| field.type_ref().clone()),
        );
    }
    types.extend(decl.type_arguments().iter().cloned());
    for param in decl.type_params() {
        types.extend(param.bounds().iter().cloned());
    }
    if opts.use_imports() {
        types.extend(decl.imports().iter().map(|import| TypeRef::class(import.as_str())));
    }

    let model = builder.model();
    let covered = RelationPattern::new(RelationDirection::Out);
    for type_ref in &types {
        if type_ref.is_opaque() {
            continue;
        }
        let Some(name) = type_ref.qualified_name() else {
            continue;
        };
        if name == decl.name() || builder.is_hidden_ref(name) {
            continue;
        }
        if !opts.infer_dep_in_package() && package_of(model, name) == decl.package() {
            continue;
        }
        let related = builder
            .registry()
            .relation(decl.name(), name)
            .is_some_and(|pattern| pattern.matches_one(&covered));
        if related {
            continue;
        }
        trace!(from = decl.name(), to = name; "Inferred dependency");
        builder.relation(
            &opts,
            RelationKind::Depend,
            decl.name(),
            name,
            EdgeLabels::default(),
        );
    }
}
