//! Parser for type expressions such as `java.util.Map<String, Item[]>`.
//!
//! Grammar:
//!
//! ```text
//! type     := wildcard | named dims
//! wildcard := "?" (("extends" | "super") type)?
//! named    := ident ("." ident)* ("<" type ("," type)* ">")?
//! dims     := ("[" "]")* "..."?
//! param    := ident ("extends" type ("&" type)*)?
//! ```
//!
//! Names without dots and arguments that spell a primitive type produce
//! [`TypeRef::Primitive`]. Everything else is a [`TypeRef::Class`]; telling
//! type variables apart needs the declaration's scope and is left to the
//! model loader.

use trellis_core::model::{BoundKind, TypeParam, TypeRef};
use winnow::{
    Parser as _,
    ascii::{multispace0, multispace1},
    combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated},
    error::{ContextError, ModalResult},
    stream::{LocatingSlice, Location},
    token::{one_of, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
};

type Input<'a> = LocatingSlice<&'a str>;
type PResult<O> = ModalResult<O, ContextError>;

/// Names parsed as [`TypeRef::Primitive`].
pub const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

fn ws(input: &mut Input<'_>) -> PResult<()> {
    multispace0.void().parse_next(input)
}

fn ident<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    )
        .take()
        .parse_next(input)
}

fn qualified_name<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (ident, repeat::<_, _, (), _, _>(0.., ('.', ident)))
        .take()
        .parse_next(input)
}

fn type_args(input: &mut Input<'_>) -> PResult<Vec<TypeRef>> {
    preceded(
        ('<', ws),
        cut_err(
            (
                separated(1.., type_ref, (ws, ',', ws)),
                ws,
                '>',
            )
                .map(|(args, (), _)| args),
        ),
    )
    .parse_next(input)
}

fn named(input: &mut Input<'_>) -> PResult<TypeRef> {
    (qualified_name, opt(preceded(ws, type_args)))
        .map(|(name, args)| {
            let args = args.unwrap_or_default();
            if args.is_empty() && PRIMITIVES.contains(&name) {
                TypeRef::primitive(name)
            } else {
                TypeRef::generic(name, args)
            }
        })
        .parse_next(input)
}

fn bound_kind(input: &mut Input<'_>) -> PResult<BoundKind> {
    alt((
        "extends".value(BoundKind::Extends),
        "super".value(BoundKind::Super),
    ))
    .parse_next(input)
}

fn wildcard(input: &mut Input<'_>) -> PResult<TypeRef> {
    preceded(
        '?',
        opt((preceded(ws, bound_kind), preceded(ws, cut_err(type_ref)))),
    )
    .map(|bound| TypeRef::Wildcard(bound.map(|(kind, t)| (kind, Box::new(t)))))
    .parse_next(input)
}

fn dims(input: &mut Input<'_>) -> PResult<usize> {
    let brackets: Vec<()> = repeat(0.., (ws, '[', ws, ']').void()).parse_next(input)?;
    let varargs = opt((ws, "...")).parse_next(input)?;
    Ok(brackets.len() + usize::from(varargs.is_some()))
}

fn type_ref(input: &mut Input<'_>) -> PResult<TypeRef> {
    let base = alt((wildcard, named)).parse_next(input)?;
    let dims = dims(input)?;
    Ok((0..dims).fold(base, |t, _| TypeRef::array(t)))
}

/// Parses a complete type expression.
///
/// ```
/// use trellis_core::model::TypeRef;
/// use trellis_parser::parse_type;
///
/// let parsed = parse_type("java.util.List<com.acme.Item>").unwrap();
/// assert_eq!(
///     parsed,
///     TypeRef::generic("java.util.List", vec![TypeRef::class("com.acme.Item")])
/// );
/// assert!(parse_type("List<Item").is_err());
/// ```
pub fn parse_type(text: &str) -> Result<TypeRef> {
    let mut input = LocatingSlice::new(text);
    let parsed = delimited(ws, type_ref, ws).parse_next(&mut input);
    complete(text, &input, parsed)
}

fn type_param(input: &mut Input<'_>) -> PResult<TypeParam> {
    let name = ident.parse_next(input)?;
    let bounds: Option<Vec<TypeRef>> = opt(preceded(
        (multispace1, "extends", multispace1),
        cut_err(separated(1.., type_ref, (ws, '&', ws))),
    ))
    .parse_next(input)?;
    Ok(bounds
        .unwrap_or_default()
        .into_iter()
        .fold(TypeParam::new(name), TypeParam::with_bound))
}

/// Parses a type parameter declaration such as `T extends Comparable<T>`.
///
/// Bounds are parsed like any other type expression; a bound naming the
/// parameter itself stays a class reference until the model loader links
/// type variables.
pub fn parse_type_param(text: &str) -> Result<TypeParam> {
    let mut input = LocatingSlice::new(text);
    let parsed = delimited(ws, type_param, ws).parse_next(&mut input);
    complete(text, &input, parsed)
}

/// Turns a parse outcome into a value, or a diagnostic when the parser
/// failed or stopped before the end of `text`.
fn complete<T>(text: &str, input: &Input<'_>, parsed: PResult<T>) -> Result<T> {
    let pos = input.current_token_start();

    match parsed {
        Ok(t) if input.is_empty() => Ok(t),
        _ if pos >= text.trim_end().len() => Err(Diagnostic::warning(format!(
            "incomplete type expression `{text}`"
        ))
        .with_code(ErrorCode::E101)
        .with_label(Span::new(pos..pos), "expression ends here")
        .with_help("close every `<` with a matching `>`")),
        _ => {
            let found = text[pos..].chars().next().unwrap_or(' ');
            Err(
                Diagnostic::warning(format!("unexpected `{found}` in type expression `{text}`"))
                    .with_code(ErrorCode::E100)
                    .with_label(Span::new(pos..pos + found.len_utf8()), "unexpected character"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> TypeRef {
        TypeRef::class(name)
    }

    #[test]
    fn test_parse_simple_names() {
        assert_eq!(parse_type("Foo").unwrap(), class("Foo"));
        assert_eq!(parse_type("  com.acme.Foo ").unwrap(), class("com.acme.Foo"));
        assert_eq!(parse_type("int").unwrap(), TypeRef::primitive("int"));
        assert_eq!(parse_type("my.int").unwrap(), class("my.int"));
    }

    #[test]
    fn test_parse_generics() {
        let parsed = parse_type("java.util.Map<String, java.util.List<a.B>>").unwrap();
        assert_eq!(
            parsed,
            TypeRef::generic(
                "java.util.Map",
                vec![
                    class("String"),
                    TypeRef::generic("java.util.List", vec![class("a.B")]),
                ]
            )
        );
    }

    #[test]
    fn test_parse_arrays_and_varargs() {
        assert_eq!(parse_type("Foo[]").unwrap(), TypeRef::array(class("Foo")));
        assert_eq!(
            parse_type("int [ ] []").unwrap(),
            TypeRef::array(TypeRef::array(TypeRef::primitive("int")))
        );
        assert_eq!(parse_type("String...").unwrap(), TypeRef::array(class("String")));
        assert_eq!(
            parse_type("List<Foo>[]").unwrap(),
            TypeRef::array(TypeRef::generic("List", vec![class("Foo")]))
        );
    }

    #[test]
    fn test_parse_wildcards() {
        assert_eq!(
            parse_type("List<?>").unwrap(),
            TypeRef::generic("List", vec![TypeRef::Wildcard(None)])
        );
        assert_eq!(
            parse_type("List<? extends a.Shape>").unwrap(),
            TypeRef::generic(
                "List",
                vec![TypeRef::Wildcard(Some((
                    BoundKind::Extends,
                    Box::new(class("a.Shape"))
                )))]
            )
        );
        assert_eq!(
            parse_type("Comparator<? super T>").unwrap().to_string(),
            "Comparator<? super T>"
        );
    }

    #[test]
    fn test_parse_incomplete() {
        let err = parse_type("List<Foo").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E101));
        assert!(err.severity().is_warning());
    }

    #[test]
    fn test_parse_unexpected_character() {
        let err = parse_type("Map<K, V> extra").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert_eq!(err.labels()[0].span(), Span::new(10..11));

        let err = parse_type("Foo<,>").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E100));
    }

    #[test]
    fn test_parse_type_param() {
        let param = parse_type_param("T").unwrap();
        assert_eq!(param.name(), "T");
        assert!(param.bounds().is_empty());

        let param = parse_type_param("K extends Comparable<K> & java.io.Serializable").unwrap();
        assert_eq!(param.name(), "K");
        assert_eq!(
            param.bounds(),
            [
                TypeRef::generic("Comparable", vec![class("K")]),
                class("java.io.Serializable"),
            ]
        );

        let err = parse_type_param("T extends Comparable<T").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E101));
        assert!(parse_type_param("T extends").is_err());
        assert!(parse_type_param("T super X").is_err());
    }

    #[test]
    fn test_parse_empty() {
        let err = parse_type("   ").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E101));
    }
}
