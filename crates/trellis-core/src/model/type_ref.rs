//! References to types as they appear in member and supertype positions.

use std::fmt;

use super::TypeParam;

/// Direction of a wildcard bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Extends,
    Super,
}

/// A use of a type: the declared type of a field or parameter, a return
/// type, a supertype, a type argument or a bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A built-in value type such as `int`.
    Primitive(String),
    /// `?`, optionally bounded.
    Wildcard(Option<(BoundKind, Box<TypeRef>)>),
    /// A type variable in scope, such as the `T` of `List<T>`.
    TypeVar(String),
    /// A named type with its type arguments.
    Class { name: String, args: Vec<TypeRef> },
    /// An array of the element type.
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// A named type without type arguments.
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A named type with type arguments.
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args,
        }
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        TypeRef::Primitive(name.into())
    }

    pub fn type_var(name: impl Into<String>) -> Self {
        TypeRef::TypeVar(name.into())
    }

    /// Whether this is a primitive, a wildcard or a type variable, i.e. a
    /// type that can never be the end of a relation. Arrays answer for
    /// their innermost element type.
    pub fn is_opaque(&self) -> bool {
        match self {
            TypeRef::Primitive(_) | TypeRef::Wildcard(_) | TypeRef::TypeVar(_) => true,
            TypeRef::Class { .. } => false,
            TypeRef::Array(element) => element.is_opaque(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    /// The innermost element type of an array, or `self`.
    pub fn element_type(&self) -> &TypeRef {
        match self {
            TypeRef::Array(element) => element.element_type(),
            other => other,
        }
    }

    /// Qualified name of a named type, after stripping array dimensions.
    pub fn qualified_name(&self) -> Option<&str> {
        match self.element_type() {
            TypeRef::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Type arguments of a named type; empty for every other variant.
    pub fn type_arguments(&self) -> &[TypeRef] {
        match self {
            TypeRef::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// Replaces the type variables named by `params` with the matching
    /// entries of `args`. Variables without a matching argument are kept.
    pub fn substitute(&self, params: &[TypeParam], args: &[TypeRef]) -> TypeRef {
        match self {
            TypeRef::TypeVar(name) => params
                .iter()
                .position(|param| param.name() == name)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeRef::Class { name, args: own } => TypeRef::Class {
                name: name.clone(),
                args: own.iter().map(|arg| arg.substitute(params, args)).collect(),
            },
            TypeRef::Array(element) => TypeRef::array(element.substitute(params, args)),
            TypeRef::Wildcard(Some((kind, bound))) => {
                TypeRef::Wildcard(Some((*kind, Box::new(bound.substitute(params, args)))))
            }
            TypeRef::Primitive(_) | TypeRef::Wildcard(None) => self.clone(),
        }
    }

    /// Rewrites every class name through `f`, leaving everything else as is.
    pub fn map_names(&self, f: &mut impl FnMut(&str) -> Option<TypeRef>) -> TypeRef {
        match self {
            TypeRef::Class { name, args } => {
                let args: Vec<_> = args.iter().map(|arg| arg.map_names(f)).collect();
                match f(name) {
                    Some(TypeRef::Class { name, .. }) => TypeRef::Class { name, args },
                    Some(replacement) if args.is_empty() => replacement,
                    _ => TypeRef::Class {
                        name: name.clone(),
                        args,
                    },
                }
            }
            TypeRef::Array(element) => TypeRef::array(element.map_names(f)),
            TypeRef::Wildcard(Some((kind, bound))) => {
                TypeRef::Wildcard(Some((*kind, Box::new(bound.map_names(f)))))
            }
            TypeRef::Primitive(_) | TypeRef::TypeVar(_) | TypeRef::Wildcard(None) => self.clone(),
        }
    }

    /// Renders the type with unqualified names, e.g. `Map<String, Item[]>`.
    pub fn display_unqualified(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, false);
        out
    }

    fn write(&self, out: &mut String, qualified: bool) {
        match self {
            TypeRef::Primitive(name) | TypeRef::TypeVar(name) => out.push_str(name),
            TypeRef::Wildcard(bound) => {
                out.push('?');
                if let Some((kind, bound)) = bound {
                    out.push_str(match kind {
                        BoundKind::Extends => " extends ",
                        BoundKind::Super => " super ",
                    });
                    bound.write(out, qualified);
                }
            }
            TypeRef::Class { name, args } => {
                if qualified {
                    out.push_str(name);
                } else {
                    out.push_str(name.rsplit('.').next().unwrap_or(name));
                }
                if !args.is_empty() {
                    out.push('<');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        arg.write(out, qualified);
                    }
                    out.push('>');
                }
            }
            TypeRef::Array(element) => {
                element.write(out, qualified);
                out.push_str("[]");
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write(&mut out, true);
        f.write_str(&out)
    }
}
