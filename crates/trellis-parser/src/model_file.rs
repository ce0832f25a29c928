//! Loading a [`TypeModel`] from a TOML model file.
//!
//! A model file is what a language front-end hands to Trellis: one
//! `[[types]]` table per declared type.
//!
//! ```toml
//! [model]
//! prelude = true              # merge the java.util collection types
//!
//! [[types]]
//! name = "com.acme.Order"
//! kind = "class"              # class | interface | enum
//! superclass = "Entity"
//! interfaces = ["java.io.Serializable"]
//! imports = ["java.util.List"]
//! tags = ["@navhas 1 - * LineItem"]
//!
//! [[types.fields]]
//! name = "lines"
//! type = "List<LineItem>"
//!
//! [[types.methods]]
//! name = "total"
//! returns = "java.math.BigDecimal"
//! params = [{ name = "discount", type = "int" }]
//! ```
//!
//! Type expressions are read with [`parse_type`](crate::parse_type). Names of
//! type parameters in scope become type variables; simple names are then
//! qualified against the package and imports of the declaring type.
//!
//! Malformed members, supertypes and tags are skipped with a warning. A file
//! that is not valid TOML or defines a type twice fails the load.

use std::collections::{HashMap, HashSet};

use log::{debug, info};
use serde::Deserialize;
use toml::Spanned;

use trellis_core::model::{
    Field, Method, Tag, TypeDecl, TypeKind, TypeModel, TypeParam, TypeRef, Visibility,
    normalize_name, prelude,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    type_expr::{parse_type, parse_type_param},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ModelFile {
    model: ModelSection,
    types: Vec<RawType>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ModelSection {
    prelude: bool,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self { prelude: true }
    }
}

fn public() -> Visibility {
    Visibility::Public
}

fn private() -> Visibility {
    Visibility::Private
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    name: Spanned<String>,
    #[serde(default)]
    kind: TypeKind,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default = "public")]
    visibility: Visibility,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    superclass: Option<Spanned<String>>,
    #[serde(default)]
    interfaces: Vec<Spanned<String>>,
    #[serde(default)]
    type_params: Vec<Spanned<String>>,
    #[serde(default)]
    type_arguments: Vec<Spanned<String>>,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    library: bool,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    enum_constants: Vec<String>,
    #[serde(default)]
    tags: Vec<Spanned<String>>,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    methods: Vec<RawMethod>,
    #[serde(default)]
    constructors: Vec<RawMethod>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    type_expr: Spanned<String>,
    #[serde(default = "private")]
    visibility: Visibility,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default)]
    tags: Vec<Spanned<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMethod {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    returns: Option<Spanned<String>>,
    #[serde(default = "public")]
    visibility: Visibility,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default)]
    type_params: Vec<Spanned<String>>,
    #[serde(default)]
    params: Vec<RawParam>,
    #[serde(default)]
    tags: Vec<Spanned<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParam {
    name: String,
    #[serde(rename = "type")]
    type_expr: Spanned<String>,
}

/// Byte offset of the contents of a quoted TOML string.
fn contents_offset<T>(value: &Spanned<T>) -> usize {
    value.span().start + 1
}

/// Reads type declarations out of the raw tables, reporting problems to
/// the collector.
struct Loader<'a> {
    diagnostics: &'a mut DiagnosticCollector,
}

impl Loader<'_> {
    fn skip(&mut self, subject: &str, diagnostic: Diagnostic) {
        self.diagnostics.emit(subject, diagnostic);
    }

    fn type_expr(&mut self, subject: &str, text: &Spanned<String>) -> Option<TypeRef> {
        match parse_type(text.get_ref()) {
            Ok(t) => Some(t),
            Err(diag) => {
                self.skip(
                    subject,
                    diag.with_code(ErrorCode::E202).shifted(contents_offset(text)),
                );
                None
            }
        }
    }

    fn type_params(&mut self, subject: &str, texts: &[Spanned<String>]) -> Vec<TypeParam> {
        texts
            .iter()
            .filter_map(|text| match parse_type_param(text.get_ref()) {
                Ok(param) => Some(param),
                Err(diag) => {
                    self.skip(
                        subject,
                        diag.with_code(ErrorCode::E202).shifted(contents_offset(text)),
                    );
                    None
                }
            })
            .collect()
    }

    fn tags(&mut self, subject: &str, texts: &[Spanned<String>]) -> Vec<Tag> {
        texts
            .iter()
            .filter_map(|text| match parse_tag_line(text.get_ref()) {
                Some(tag) => Some(tag),
                None => {
                    let offset = contents_offset(text);
                    self.skip(
                        subject,
                        Diagnostic::warning(format!("malformed tag `{}`", text.get_ref()))
                            .with_code(ErrorCode::E203)
                            .with_label(
                                Span::new(offset..offset + text.get_ref().len()),
                                "expected `@name text`",
                            ),
                    );
                    None
                }
            })
            .collect()
    }

    fn field(&mut self, subject: &str, scope: &[String], raw: &RawField) -> Option<Field> {
        let subject = format!("{subject}.{}", raw.name);
        let type_ref = link_type_vars(&self.type_expr(&subject, &raw.type_expr)?, scope);
        let field = Field::new(&raw.name, type_ref)
            .with_visibility(raw.visibility)
            .with_static(raw.is_static);
        Some(
            self.tags(&subject, &raw.tags)
                .into_iter()
                .fold(field, Field::with_tag),
        )
    }

    /// A method or constructor. Parameters with a malformed type drop the
    /// whole method, since its signature is no longer known.
    fn method(
        &mut self,
        subject: &str,
        default_name: &str,
        scope: &[String],
        raw: &RawMethod,
    ) -> Option<Method> {
        let name = raw.name.as_deref().unwrap_or(default_name);
        let subject = format!("{subject}.{name}()");

        let type_params = self.type_params(&subject, &raw.type_params);
        let mut scope = scope.to_vec();
        scope.extend(type_params.iter().map(|p| p.name().to_string()));

        let mut method = Method::new(name)
            .with_visibility(raw.visibility)
            .with_static(raw.is_static)
            .with_abstract(raw.is_abstract);
        for param in type_params {
            method = method.with_type_param(link_param_vars(param, &scope));
        }
        for param in &raw.params {
            let type_ref = self.type_expr(&subject, &param.type_expr)?;
            method = method.with_param(&param.name, link_type_vars(&type_ref, &scope));
        }
        if let Some(returns) = &raw.returns {
            match self.type_expr(&subject, returns)? {
                TypeRef::Primitive(name) if name == "void" => {}
                type_ref => method = method.returning(link_type_vars(&type_ref, &scope)),
            }
        }
        Some(
            self.tags(&subject, &raw.tags)
                .into_iter()
                .fold(method, Method::with_tag),
        )
    }

    fn decl(&mut self, raw: &RawType) -> TypeDecl {
        let name = normalize_name(raw.name.get_ref());
        let subject = name.as_str();

        let mut decl = TypeDecl::new(&name, raw.kind)
            .with_visibility(raw.visibility)
            .with_abstract(raw.is_abstract)
            .with_library(raw.library);
        if let Some(package) = &raw.package {
            decl = decl.with_package(package);
        }

        let type_params = self.type_params(subject, &raw.type_params);
        let scope: Vec<String> = type_params.iter().map(|p| p.name().to_string()).collect();
        for param in type_params {
            decl = decl.with_type_param(link_param_vars(param, &scope));
        }

        if let Some(t) = raw
            .superclass
            .as_ref()
            .and_then(|superclass| self.type_expr(subject, superclass))
        {
            decl = decl.with_superclass(link_type_vars(&t, &scope));
        }
        for interface in &raw.interfaces {
            if let Some(t) = self.type_expr(subject, interface) {
                decl = decl.with_interface(link_type_vars(&t, &scope));
            }
        }
        for argument in &raw.type_arguments {
            if let Some(t) = self.type_expr(subject, argument) {
                decl = decl.with_type_argument(link_type_vars(&t, &scope));
            }
        }

        for raw_field in &raw.fields {
            if let Some(field) = self.field(subject, &scope, raw_field) {
                decl = decl.with_field(field);
            }
        }
        for raw_method in &raw.methods {
            if let Some(method) = self.method(subject, "", &scope, raw_method) {
                decl = decl.with_method(method);
            }
        }
        let simple_name = decl.simple_name().to_string();
        for raw_constructor in &raw.constructors {
            if let Some(constructor) = self.method(subject, &simple_name, &scope, raw_constructor)
            {
                decl = decl.with_constructor(constructor);
            }
        }

        for constant in &raw.enum_constants {
            decl = decl.with_enum_constant(constant);
        }
        for import in &raw.imports {
            decl = decl.with_import(import);
        }
        for tag in self.tags(subject, &raw.tags) {
            decl = decl.with_tag(tag.name(), tag.text());
        }
        if let Some(comment) = &raw.comment {
            decl = decl.with_comment(comment);
        }
        decl
    }
}

/// Splits `@name text` into a tag; `None` if the line does not start with
/// `@` followed by a name.
fn parse_tag_line(line: &str) -> Option<Tag> {
    let rest = line.trim().strip_prefix('@')?;
    let (name, text) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    if name.is_empty() {
        return None;
    }
    Some(Tag::new(name, text.trim()))
}

fn link_type_vars(type_ref: &TypeRef, scope: &[String]) -> TypeRef {
    type_ref.map_names(&mut |name| {
        scope
            .iter()
            .any(|var| var == name)
            .then(|| TypeRef::type_var(name))
    })
}

fn link_param_vars(param: TypeParam, scope: &[String]) -> TypeParam {
    param
        .bounds()
        .iter()
        .map(|bound| link_type_vars(bound, scope))
        .fold(TypeParam::new(param.name()), TypeParam::with_bound)
}

/// Qualifies the simple names a declaration uses.
///
/// A name is left alone if it is already a known type; otherwise the
/// declaring package is tried, then single-type imports ending in the name,
/// then on-demand (`.*`) imports.
fn qualify_names(decl: &mut TypeDecl, known: &HashSet<String>) {
    let package = decl.package().to_string();
    let imports = decl.imports().to_vec();

    let qualify = |name: &str| -> Option<TypeRef> {
        if known.contains(name) {
            return None;
        }
        if !package.is_empty() {
            let candidate = format!("{package}.{name}");
            if known.contains(&candidate) {
                return Some(TypeRef::class(candidate));
            }
        }
        if let Some(import) = imports.iter().find(|import| {
            import
                .strip_suffix(name)
                .is_some_and(|prefix| prefix.ends_with('.'))
        }) {
            return Some(TypeRef::class(import.as_str()));
        }
        imports
            .iter()
            .filter_map(|import| import.strip_suffix(".*"))
            .map(|prefix| format!("{prefix}.{name}"))
            .find(|candidate| known.contains(candidate))
            .map(TypeRef::class)
    };

    decl.map_types(|t| t.map_names(&mut |name| qualify(name)));
}

/// Loads a type model from the text of a TOML model file.
///
/// # Errors
///
/// Returns [`ParseError`] when the text is not a valid model file or
/// defines a type twice. Skipped declarations are logged as warnings and
/// included in the error if the load fails for another reason.
///
/// # Examples
///
/// ```
/// use trellis_parser::load_model;
///
/// let model = load_model(r#"
///     [[types]]
///     name = "shop.Order"
///     tags = ["@navassoc - - * Customer"]
///
///     [[types]]
///     name = "shop.Customer"
/// "#).unwrap();
///
/// assert_eq!(model.roots().count(), 2);
/// assert!(model.get("java.util.List").is_some_and(|decl| decl.is_library()));
/// ```
pub fn load_model(src: &str) -> Result<TypeModel, ParseError> {
    info!("Loading model");

    let file: ModelFile = toml::from_str(src).map_err(|err| {
        let span = err.span().map(Span::new).unwrap_or_default();
        Diagnostic::error(format!("malformed model file: {}", err.message().trim()))
            .with_code(ErrorCode::E200)
            .with_label(span, "here")
    })?;

    let mut diagnostics = DiagnosticCollector::new();
    let mut loader = Loader {
        diagnostics: &mut diagnostics,
    };

    let mut decls: Vec<TypeDecl> = Vec::with_capacity(file.types.len());
    let mut first_seen: HashMap<String, Span> = HashMap::new();
    for raw in &file.types {
        let span = Span::new(raw.name.span());
        let decl = loader.decl(raw);
        if let Some(first) = first_seen.get(decl.name()) {
            let diag = Diagnostic::error(format!("type `{}` is defined twice", decl.name()))
                .with_code(ErrorCode::E201)
                .with_label(span, "second definition")
                .with_secondary_label(*first, "first defined here")
                .with_help("remove one of the `[[types]]` entries");
            loader.skip(decl.name(), diag);
            continue;
        }
        first_seen.insert(decl.name().to_string(), span);
        decls.push(decl);
    }

    if file.model.prelude {
        decls.extend(
            prelude::java_collections()
                .into_iter()
                .filter(|decl| !first_seen.contains_key(decl.name())),
        );
    }

    let known: HashSet<String> = decls.iter().map(|decl| decl.name().to_string()).collect();
    for decl in &mut decls {
        qualify_names(decl, &known);
    }

    diagnostics.finish()?;

    let model = TypeModel::from_decls(decls);
    debug!(types = model.len(), roots = model.roots().count(); "Model loaded");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use trellis_core::model::BoundKind;

    use super::*;

    #[test]
    fn test_parse_tag_line() {
        let tag = parse_tag_line("@navassoc 1 - * Order").unwrap();
        assert_eq!(tag.name(), "navassoc");
        assert_eq!(tag.text(), "1 - * Order");

        let tag = parse_tag_line("  @hidden ").unwrap();
        assert_eq!(tag.name(), "hidden");
        assert_eq!(tag.text(), "");

        assert!(parse_tag_line("navassoc 1 - * Order").is_none());
        assert!(parse_tag_line("@ text").is_none());
    }

    #[test]
    fn test_load_members_and_visibility_defaults() {
        let model = load_model(
            r#"
            [model]
            prelude = false

            [[types]]
            name = "shop.Order"
            abstract = true

            [[types.fields]]
            name = "id"
            type = "long"

            [[types.methods]]
            name = "total"
            returns = "int"
            params = [{ name = "discount", type = "double" }]

            [[types.methods]]
            name = "reset"
            returns = "void"

            [[types.constructors]]
            params = [{ name = "id", type = "long" }]
            "#,
        )
        .unwrap();

        assert_eq!(model.len(), 1);
        let order = model.get("shop.Order").unwrap();
        assert!(order.is_abstract());
        assert_eq!(order.package(), "shop");
        assert_eq!(order.fields()[0].visibility(), Visibility::Private);
        assert_eq!(order.methods()[0].visibility(), Visibility::Public);
        assert_eq!(
            order.methods()[0].return_type(),
            Some(&TypeRef::primitive("int"))
        );
        assert_eq!(order.methods()[1].return_type(), None);
        assert_eq!(order.constructors()[0].name(), "Order");
    }

    #[test]
    fn test_load_links_type_variables() {
        let model = load_model(
            r#"
            [model]
            prelude = false

            [[types]]
            name = "box.Box"
            type_params = ["T extends Comparable<T>"]

            [[types.fields]]
            name = "items"
            type = "T[]"

            [[types.methods]]
            name = "map"
            type_params = ["R"]
            returns = "Box<R>"
            params = [{ name = "seed", type = "T" }]
            "#,
        )
        .unwrap();

        let decl = model.get("box.Box").unwrap();
        assert_eq!(
            decl.type_params()[0].bounds(),
            [TypeRef::generic("Comparable", vec![TypeRef::type_var("T")])]
        );
        assert_eq!(
            decl.fields()[0].type_ref(),
            &TypeRef::array(TypeRef::type_var("T"))
        );
        let method = &decl.methods()[0];
        assert_eq!(
            method.return_type(),
            Some(&TypeRef::generic("box.Box", vec![TypeRef::type_var("R")]))
        );
        assert_eq!(method.params()[0].type_ref(), &TypeRef::type_var("T"));
    }

    #[test]
    fn test_load_qualifies_names() {
        let model = load_model(
            r#"
            [[types]]
            name = "shop.Order"
            superclass = "Entity"
            imports = ["java.util.*", "billing.Invoice"]

            [[types.fields]]
            name = "lines"
            type = "List<? extends LineItem>"

            [[types.fields]]
            name = "invoice"
            type = "Invoice"

            [[types.fields]]
            name = "note"
            type = "String"

            [[types]]
            name = "shop.Entity"

            [[types]]
            name = "shop.LineItem"
            "#,
        )
        .unwrap();

        let order = model.get("shop.Order").unwrap();
        assert_eq!(order.superclass(), Some(&TypeRef::class("shop.Entity")));
        assert_eq!(
            order.fields()[0].type_ref(),
            &TypeRef::generic(
                "java.util.List",
                vec![TypeRef::Wildcard(Some((
                    BoundKind::Extends,
                    Box::new(TypeRef::class("shop.LineItem"))
                )))]
            )
        );
        assert_eq!(
            order.fields()[1].type_ref(),
            &TypeRef::class("billing.Invoice")
        );
        assert_eq!(order.fields()[2].type_ref(), &TypeRef::class("String"));
    }

    #[test]
    fn test_load_skips_malformed_members() {
        let model = load_model(
            r#"
            [model]
            prelude = false

            [[types]]
            name = "a.A"
            superclass = "Base<"
            tags = ["no at sign", "@stereotype entity"]

            [[types.fields]]
            name = "broken"
            type = "Map<K,,V>"

            [[types.fields]]
            name = "fine"
            type = "int"
            "#,
        )
        .unwrap();

        let decl = model.get("a.A").unwrap();
        assert!(decl.superclass().is_none());
        assert_eq!(decl.fields().len(), 1);
        assert_eq!(decl.tags().len(), 1);
        assert!(decl.has_tag("stereotype"));
    }

    #[test]
    fn test_load_prelude_does_not_override_declarations() {
        let model = load_model(
            r#"
            [[types]]
            name = "java.util.List"
            kind = "class"
            "#,
        )
        .unwrap();

        let list = model.get("java.util.List").unwrap();
        assert_eq!(list.kind(), TypeKind::Class);
        assert!(!list.is_library());
        assert!(model.contains("java.util.Collection"));
    }

    #[test]
    fn test_load_duplicate_type_is_an_error() {
        let src = r#"
            [[types]]
            name = "a.A"

            [[types]]
            name = "a.A"
        "#;
        let err = load_model(src).unwrap_err();
        let diag = &err.diagnostics()[0];

        assert_eq!(diag.code(), Some(ErrorCode::E201));
        let second = diag.labels()[0].span();
        assert_eq!(&src[second.range()], "\"a.A\"");
        assert!(diag.labels()[1].span().start() < second.start());
    }

    #[test]
    fn test_load_malformed_toml() {
        let err = load_model("[[types]\nname = 1").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E200));

        let err = load_model("[[types]]\nname = \"a.A\"\ncolour = \"red\"").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E200));
    }
}
