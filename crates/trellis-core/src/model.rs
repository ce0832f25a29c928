//! The type model the diagram is derived from.
//!
//! A [`TypeModel`] is the read-only description of declared types produced by
//! a language front-end: for each type its kind, modifiers, supertypes,
//! members, type parameters and free-form tags. Trellis never parses source
//! code itself; the `trellis-parser` crate loads models from TOML files and
//! tests build them directly with the `with_*` builders below.
//!
//! # Organization
//!
//! - [`TypeModel`] - the ordered set of declarations, with name resolution
//! - [`TypeDecl`], [`Field`], [`Method`], [`TypeParam`], [`Tag`] - declarations
//! - [`TypeRef`] - uses of a type in member and supertype positions
//! - [`prelude`] - library declarations of the standard collection types

pub mod prelude;
mod type_ref;

use std::{collections::HashMap, fmt, str::FromStr};

use log::debug;
use serde::{Deserialize, Serialize};

pub use type_ref::{BoundKind, TypeRef};

use crate::error::UnknownNameError;

/// Strips every generic argument segment from a type name.
///
/// Nesting depth is tracked, so both `a.A<b.B<C>>` and `Outer<T>.Inner<U>`
/// reduce to their raw names (`a.A`, `Outer.Inner`).
///
/// ```
/// use trellis_core::model::normalize_name;
///
/// assert_eq!(normalize_name("java.util.Map<K, java.util.List<V>>"), "java.util.Map");
/// assert_eq!(normalize_name("Outer<T>.Inner<U>"), "Outer.Inner");
/// ```
pub fn normalize_name(name: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
}

/// Member and type visibility, ordered from least to most visible.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    #[default]
    Package,
    Protected,
    Public,
}

impl Visibility {
    /// UML adornment for the visibility.
    pub fn symbol(self) -> &'static str {
        match self {
            Visibility::Private => "-",
            Visibility::Package => "~",
            Visibility::Protected => "#",
            Visibility::Public => "+",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Package => "package",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Visibility {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Visibility::Private,
            Visibility::Package,
            Visibility::Protected,
            Visibility::Public,
        ]
        .into_iter()
        .find(|vis| vis.keyword().eq_ignore_ascii_case(s))
        .ok_or_else(|| UnknownNameError::new("visibility", s))
    }
}

/// A free-form `@name text` annotation attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    name: String,
    text: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A declared type parameter and its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParam {
    name: String,
    bounds: Vec<TypeRef>,
}

impl TypeParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn with_bound(mut self, bound: TypeRef) -> Self {
        self.bounds.push(bound);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &[TypeRef] {
        &self.bounds
    }

    pub(crate) fn map_bounds(&mut self, f: impl Fn(&TypeRef) -> TypeRef) {
        self.bounds = self.bounds.iter().map(f).collect();
    }
}

fn has_tag(tags: &[Tag], name: &str) -> bool {
    tags.iter().any(|tag| tag.name() == name)
}

/// A field of a type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    type_ref: TypeRef,
    visibility: Visibility,
    is_static: bool,
    tags: Vec<Tag>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            visibility: Visibility::Private,
            is_static: false,
            tags: Vec::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Whether the field carries a `@hidden` tag.
    pub fn is_hidden(&self) -> bool {
        has_tag(&self.tags, "hidden")
    }

    pub(crate) fn map_types(&mut self, f: &impl Fn(&TypeRef) -> TypeRef) {
        self.type_ref = f(&self.type_ref);
    }
}

/// A named, typed parameter of a method or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    type_ref: TypeRef,
}

impl Param {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }
}

/// A method or constructor. Constructors have no return type.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    name: String,
    params: Vec<Param>,
    return_type: Option<TypeRef>,
    visibility: Visibility,
    is_static: bool,
    is_abstract: bool,
    type_params: Vec<TypeParam>,
    tags: Vec<Tag>,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            type_params: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.params.push(Param::new(name, type_ref));
        self
    }

    pub fn returning(mut self, type_ref: TypeRef) -> Self {
        self.return_type = Some(type_ref);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_type_param(mut self, param: TypeParam) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Return type, `None` for `void` and for constructors.
    pub fn return_type(&self) -> Option<&TypeRef> {
        self.return_type.as_ref()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn type_params(&self) -> &[TypeParam] {
        &self.type_params
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Whether the method carries a `@hidden` tag.
    pub fn is_hidden(&self) -> bool {
        has_tag(&self.tags, "hidden")
    }

    /// Every type the signature mentions: return type first, then
    /// parameters in order.
    pub fn signature_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.return_type
            .iter()
            .chain(self.params.iter().map(Param::type_ref))
    }

    pub(crate) fn map_types(&mut self, f: &impl Fn(&TypeRef) -> TypeRef) {
        self.return_type = self.return_type.as_ref().map(f);
        for param in &mut self.params {
            param.type_ref = f(&param.type_ref);
        }
        for type_param in &mut self.type_params {
            type_param.map_bounds(f);
        }
    }
}

/// A declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    name: String,
    package: String,
    kind: TypeKind,
    visibility: Visibility,
    is_abstract: bool,
    superclass: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    type_params: Vec<TypeParam>,
    type_arguments: Vec<TypeRef>,
    fields: Vec<Field>,
    methods: Vec<Method>,
    constructors: Vec<Method>,
    enum_constants: Vec<String>,
    imports: Vec<String>,
    tags: Vec<Tag>,
    comment: Option<String>,
    library: bool,
}

impl TypeDecl {
    /// Creates a declaration for the qualified `name`. The package defaults
    /// to everything before the last `.`.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let name = normalize_name(&name.into());
        let package = name
            .rsplit_once('.')
            .map(|(package, _)| package.to_string())
            .unwrap_or_default();
        Self {
            name,
            package,
            kind,
            visibility: Visibility::Public,
            is_abstract: false,
            superclass: None,
            interfaces: Vec::new(),
            type_params: Vec::new(),
            type_arguments: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            enum_constants: Vec::new(),
            imports: Vec::new(),
            tags: Vec::new(),
            comment: None,
            library: false,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    /// Overrides the package, for nested types whose name has more
    /// segments than the package.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_superclass(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_type_param(mut self, param: TypeParam) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn with_type_argument(mut self, argument: TypeRef) -> Self {
        self.type_arguments.push(argument);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_constructor(mut self, constructor: Method) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_enum_constant(mut self, constant: impl Into<String>) -> Self {
        self.enum_constants.push(constant.into());
        self
    }

    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.imports.push(import.into());
        self
    }

    /// Attaches a `@name text` tag.
    pub fn with_tag(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.tags.push(Tag::new(name, text));
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Marks the declaration as library code: known to the model for name
    /// resolution and inference, but not part of the root set.
    pub fn with_library(mut self, library: bool) -> Self {
        self.library = library;
        self
    }

    /// Fully qualified, normalized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without the package prefix; nested types keep their outer name.
    pub fn simple_name(&self) -> &str {
        if self.package.is_empty() {
            return &self.name;
        }
        self.name
            .strip_prefix(self.package.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.name)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Whether the type is declared inside another type.
    pub fn is_nested(&self) -> bool {
        self.simple_name().contains('.')
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn superclass(&self) -> Option<&TypeRef> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    pub fn type_params(&self) -> &[TypeParam] {
        &self.type_params
    }

    /// Actual type arguments when the declaration describes a
    /// parameterized use of a generic type.
    pub fn type_arguments(&self) -> &[TypeRef] {
        &self.type_arguments
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn constructors(&self) -> &[Method] {
        &self.constructors
    }

    pub fn enum_constants(&self) -> &[String] {
        &self.enum_constants
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Tags with the given name, in declaration order.
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |tag| tag.name() == name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        has_tag(&self.tags, name)
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn is_library(&self) -> bool {
        self.library
    }

    /// Supertypes in the order they are searched: interfaces, then the
    /// superclass.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.interfaces.iter().chain(self.superclass.iter())
    }

    /// Rewrites every type reference of the declaration through `f`.
    pub fn map_types(&mut self, f: impl Fn(&TypeRef) -> TypeRef) {
        self.superclass = self.superclass.as_ref().map(&f);
        self.interfaces = self.interfaces.iter().map(&f).collect();
        self.type_arguments = self.type_arguments.iter().map(&f).collect();
        for param in &mut self.type_params {
            param.map_bounds(&f);
        }
        for field in &mut self.fields {
            field.map_types(&f);
        }
        for method in self.methods.iter_mut().chain(self.constructors.iter_mut()) {
            method.map_types(&f);
        }
    }
}

/// The ordered set of type declarations a diagram is built from.
///
/// Iteration follows insertion order. Library declarations take part in
/// lookups and inference but are not part of the root set.
#[derive(Debug, Clone, Default)]
pub struct TypeModel {
    types: Vec<TypeDecl>,
    index: HashMap<String, usize>,
}

impl TypeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model from declarations, in order.
    pub fn from_decls(decls: impl IntoIterator<Item = TypeDecl>) -> Self {
        let mut model = Self::new();
        for decl in decls {
            model.insert(decl);
        }
        model
    }

    /// Adds a declaration. A later declaration with the same name replaces
    /// the earlier one in place and the earlier one is returned.
    pub fn insert(&mut self, decl: TypeDecl) -> Option<TypeDecl> {
        match self.index.get(decl.name()) {
            Some(&i) => {
                debug!(name = decl.name(); "Replacing type declaration");
                Some(std::mem::replace(&mut self.types[i], decl))
            }
            None => {
                self.index.insert(decl.name().to_string(), self.types.len());
                self.types.push(decl);
                None
            }
        }
    }

    /// Looks a type up by name; generic arguments in `name` are ignored.
    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        let key = normalize_name(name);
        self.index.get(&key).map(|&i| &self.types[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Looks up the declaration a type reference names.
    pub fn resolve(&self, type_ref: &TypeRef) -> Option<&TypeDecl> {
        type_ref.qualified_name().and_then(|name| self.get(name))
    }

    /// Resolves `name` as written inside `from`: as a qualified name, then as
    /// a type of `from`'s package, then through `from`'s imports.
    pub fn resolve_name(&self, from: &TypeDecl, name: &str) -> Option<&TypeDecl> {
        let name = normalize_name(name);
        if let Some(decl) = self.get(&name) {
            return Some(decl);
        }
        if !from.package().is_empty() {
            if let Some(decl) = self.get(&format!("{}.{}", from.package(), name)) {
                return Some(decl);
            }
        }
        from.imports()
            .iter()
            .filter(|import| {
                import
                    .strip_suffix(name.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
            })
            .find_map(|import| self.get(import))
    }

    /// All declarations, library ones included.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.iter()
    }

    /// The root set: every non-library declaration, in order.
    pub fn roots(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.iter().filter(|decl| !decl.is_library())
    }

    /// Packages of the root set, in first-seen order.
    pub fn packages(&self) -> Vec<&str> {
        let mut packages: Vec<&str> = Vec::new();
        for decl in self.roots() {
            if !packages.contains(&decl.package()) {
                packages.push(decl.package());
            }
        }
        packages
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("a.A"), "a.A");
        assert_eq!(normalize_name("a.A<b.B<C>>"), "a.A");
        assert_eq!(normalize_name("Outer<T>.Inner<U>"), "Outer.Inner");
        assert_eq!(normalize_name(" a.A<K, V> "), "a.A");
        assert_eq!(normalize_name("a.A>"), "a.A");
    }

    #[test]
    fn test_visibility_order_and_parse() {
        assert!(Visibility::Private < Visibility::Package);
        assert!(Visibility::Protected < Visibility::Public);
        assert_eq!("PUBLIC".parse::<Visibility>(), Ok(Visibility::Public));
        assert!("friend".parse::<Visibility>().is_err());
        assert_eq!(Visibility::Protected.symbol(), "#");
    }

    #[test]
    fn test_type_decl_names() {
        let decl = TypeDecl::class("com.acme.Order<T>");
        assert_eq!(decl.name(), "com.acme.Order");
        assert_eq!(decl.package(), "com.acme");
        assert_eq!(decl.simple_name(), "Order");

        let nested = TypeDecl::class("com.acme.Order.Line").with_package("com.acme");
        assert_eq!(nested.simple_name(), "Order.Line");
        assert!(nested.is_nested());
        assert!(!decl.is_nested());

        let unpackaged = TypeDecl::class("Main");
        assert_eq!(unpackaged.package(), "");
        assert_eq!(unpackaged.simple_name(), "Main");
    }

    #[test]
    fn test_model_insert_and_get() {
        let mut model = TypeModel::new();
        assert!(model.insert(TypeDecl::class("a.A")).is_none());
        model.insert(TypeDecl::class("a.B").with_library(true));

        assert!(model.contains("a.A<X>"));
        assert_eq!(model.roots().count(), 1);
        assert_eq!(model.len(), 2);

        let previous = model.insert(TypeDecl::interface("a.A"));
        assert!(previous.is_some_and(|decl| decl.kind() == TypeKind::Class));
        assert_eq!(model.len(), 2);
        assert!(model.get("a.A").is_some_and(TypeDecl::is_interface));
    }

    #[test]
    fn test_resolve_name() {
        let model = TypeModel::from_decls([
            TypeDecl::class("a.A").with_import("b.Imported"),
            TypeDecl::class("a.Sibling"),
            TypeDecl::class("b.Imported"),
            TypeDecl::class("c.Other"),
        ]);
        let from = model.get("a.A").cloned().unwrap();

        assert_eq!(model.resolve_name(&from, "c.Other").map(TypeDecl::name), Some("c.Other"));
        assert_eq!(model.resolve_name(&from, "Sibling").map(TypeDecl::name), Some("a.Sibling"));
        assert_eq!(model.resolve_name(&from, "Imported").map(TypeDecl::name), Some("b.Imported"));
        assert!(model.resolve_name(&from, "Other").is_none());
    }

    #[test]
    fn test_packages_in_first_seen_order() {
        let model = TypeModel::from_decls([
            TypeDecl::class("b.X"),
            TypeDecl::class("a.Y"),
            TypeDecl::class("b.Z"),
            TypeDecl::class("lib.L").with_library(true),
        ]);
        assert_eq!(model.packages(), vec!["b", "a"]);
    }

    #[test]
    fn test_method_signature_types() {
        let method = Method::new("find")
            .with_param("key", TypeRef::class("a.Key"))
            .returning(TypeRef::class("a.Value"));
        let types: Vec<_> = method.signature_types().collect();
        assert_eq!(types, vec![&TypeRef::class("a.Value"), &TypeRef::class("a.Key")]);
    }

    #[test]
    fn test_map_types_rewrites_members() {
        let mut decl = TypeDecl::class("a.A")
            .with_superclass(TypeRef::class("Base"))
            .with_field(Field::new("items", TypeRef::class("Base")))
            .with_method(Method::new("get").returning(TypeRef::class("Base")));
        decl.map_types(|t| {
            t.map_names(&mut |name| (name == "Base").then(|| TypeRef::class("a.Base")))
        });

        assert_eq!(decl.superclass(), Some(&TypeRef::class("a.Base")));
        assert_eq!(decl.fields()[0].type_ref(), &TypeRef::class("a.Base"));
        assert_eq!(decl.methods()[0].return_type(), Some(&TypeRef::class("a.Base")));
    }
}
