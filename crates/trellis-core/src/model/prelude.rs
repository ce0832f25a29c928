//! Library declarations of the standard collection types.
//!
//! Association inference unwraps container fields by walking supertypes
//! until it reaches the designated collection or map interface. The walk
//! only works for types the model knows, so model loaders merge these
//! declarations into every model that does not declare them itself.

use super::{TypeDecl, TypeParam, TypeRef};

/// Default name of the single-argument collection interface.
pub const COLLECTION: &str = "java.util.Collection";

/// Default name of the key/value map interface.
pub const MAP: &str = "java.util.Map";

fn element(name: &str) -> TypeRef {
    TypeRef::generic(name, vec![TypeRef::type_var("E")])
}

fn entry(name: &str) -> TypeRef {
    TypeRef::generic(name, vec![TypeRef::type_var("K"), TypeRef::type_var("V")])
}

fn collection_interface(name: &str, supertypes: &[&str]) -> TypeDecl {
    supertypes.iter().fold(
        TypeDecl::interface(name).with_type_param(TypeParam::new("E")),
        |decl, sup| decl.with_interface(element(sup)),
    )
}

fn collection_class(name: &str, superclass: Option<&str>, interfaces: &[&str]) -> TypeDecl {
    let decl = interfaces.iter().fold(
        TypeDecl::class(name).with_type_param(TypeParam::new("E")),
        |decl, iface| decl.with_interface(element(iface)),
    );
    match superclass {
        Some(sup) => decl.with_superclass(element(sup)),
        None => decl,
    }
}

fn map_type(decl: TypeDecl, superclass: Option<&str>, interfaces: &[&str]) -> TypeDecl {
    let decl = interfaces.iter().fold(
        decl.with_type_param(TypeParam::new("K"))
            .with_type_param(TypeParam::new("V")),
        |decl, iface| decl.with_interface(entry(iface)),
    );
    match superclass {
        Some(sup) => decl.with_superclass(entry(sup)),
        None => decl,
    }
}

/// The `java.util` collection and map hierarchy, as library declarations.
pub fn java_collections() -> Vec<TypeDecl> {
    let decls = vec![
        collection_interface(COLLECTION, &[]),
        collection_interface("java.util.List", &[COLLECTION]),
        collection_interface("java.util.Set", &[COLLECTION]),
        collection_interface("java.util.SortedSet", &["java.util.Set"]),
        collection_interface("java.util.Queue", &[COLLECTION]),
        collection_interface("java.util.Deque", &["java.util.Queue"]),
        collection_class("java.util.AbstractCollection", None, &[COLLECTION]),
        collection_class(
            "java.util.AbstractList",
            Some("java.util.AbstractCollection"),
            &["java.util.List"],
        ),
        collection_class(
            "java.util.ArrayList",
            Some("java.util.AbstractList"),
            &["java.util.List"],
        ),
        collection_class(
            "java.util.LinkedList",
            Some("java.util.AbstractList"),
            &["java.util.List", "java.util.Deque"],
        ),
        collection_class(
            "java.util.HashSet",
            Some("java.util.AbstractCollection"),
            &["java.util.Set"],
        ),
        collection_class(
            "java.util.TreeSet",
            Some("java.util.AbstractCollection"),
            &["java.util.SortedSet"],
        ),
        map_type(TypeDecl::interface(MAP), None, &[]),
        map_type(TypeDecl::interface("java.util.SortedMap"), None, &[MAP]),
        map_type(TypeDecl::class("java.util.HashMap"), None, &[MAP]),
        map_type(
            TypeDecl::class("java.util.LinkedHashMap"),
            Some("java.util.HashMap"),
            &[MAP],
        ),
        map_type(TypeDecl::class("java.util.TreeMap"), None, &["java.util.SortedMap"]),
    ];
    decls.into_iter().map(|decl| decl.with_library(true)).collect()
}
