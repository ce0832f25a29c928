//! Parsers for the structured tags attached to declarations.
//!
//! | Tag | Fields |
//! |-----|--------|
//! | `@assoc`, `@navassoc`, `@has`, `@navhas`, `@composed`, `@navcomposed`, `@depend` | tail label, label, head label, target |
//! | `@stereotype` | name |
//! | `@tagvalue` | name, value |
//! | `@match` | match type, pattern |
//! | `@opt` | option name (optionally `-`, `--` or `!` prefixed), arguments |
//!
//! Each parser returns the [`Diagnostic`] explaining the skip when the tag
//! is malformed. Callers log it and carry on with the next tag.

use std::{fmt, str::FromStr};

use trellis_core::{error::UnknownNameError, relation::RelationKind};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
    tokenize::{Fields, tokenize},
};

fn field_count_diagnostic(
    fields: &Fields<'_>,
    code: ErrorCode,
    message: String,
    help: &str,
) -> Diagnostic {
    let found = match fields.len() {
        1 => "found 1 field".to_string(),
        n => format!("found {n} fields"),
    };
    let mut diag = Diagnostic::warning(message)
        .with_code(code)
        .with_label(fields.span(), found)
        .with_help(help);
    if let Some(quote) = fields.unterminated() {
        diag = diag.with_secondary_label(quote, ErrorCode::E001.description());
    }
    diag
}

/// A relation declared with one of the seven relation tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredRelation {
    kind: RelationKind,
    tail_label: String,
    label: String,
    head_label: String,
    target: String,
}

impl DeclaredRelation {
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Label at the source end, e.g. a multiplicity.
    pub fn tail_label(&self) -> &str {
        &self.tail_label
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label at the target end.
    pub fn head_label(&self) -> &str {
        &self.head_label
    }

    /// Target type name as written in the tag.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Parses the text of a relation tag of the given kind.
///
/// ```
/// use trellis_core::relation::RelationKind;
/// use trellis_parser::tags::parse_relation;
///
/// let rel = parse_relation(RelationKind::NavHas, r#"1 "line items" * com.acme.Line"#).unwrap();
/// assert_eq!(rel.label(), "line items");
/// assert_eq!(rel.target(), "com.acme.Line");
///
/// assert!(parse_relation(RelationKind::Depend, "- - Order").is_err());
/// ```
pub fn parse_relation(kind: RelationKind, text: &str) -> Result<DeclaredRelation> {
    let fields = tokenize(text);
    match fields.fields() {
        [tail, label, head, target] if !target.value().is_empty() => Ok(DeclaredRelation {
            kind,
            tail_label: tail.value().to_string(),
            label: label.value().to_string(),
            head_label: head.value().to_string(),
            target: target.value().to_string(),
        }),
        [_, _, _, target] => Err(Diagnostic::warning(format!(
            "`@{kind}` has an empty target"
        ))
        .with_code(ErrorCode::E002)
        .with_label(target.span(), "target type expected here")),
        _ => Err(field_count_diagnostic(
            &fields,
            ErrorCode::E002,
            format!("`@{kind}` expects four fields (tail label, label, head label, target)"),
            "use `-` for an empty field: `@navassoc - - * Target`",
        )),
    }
}

/// Parses a `@stereotype` tag.
pub fn parse_stereotype(text: &str) -> Result<String> {
    let fields = tokenize(text);
    match fields.fields() {
        [name] => Ok(name.value().to_string()),
        _ => Err(field_count_diagnostic(
            &fields,
            ErrorCode::E003,
            "`@stereotype` expects one field".to_string(),
            "quote stereotypes containing spaces",
        )),
    }
}

/// A `@tagvalue name value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    name: String,
    value: String,
}

impl TagValue {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Parses a `@tagvalue` tag.
pub fn parse_tag_value(text: &str) -> Result<TagValue> {
    let fields = tokenize(text);
    match fields.fields() {
        [name, value] => Ok(TagValue {
            name: name.value().to_string(),
            value: value.value().to_string(),
        }),
        _ => Err(field_count_diagnostic(
            &fields,
            ErrorCode::E003,
            "`@tagvalue` expects two fields".to_string(),
            "quote values containing spaces",
        )),
    }
}

/// What a view's `@match` section selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Types whose name matches the pattern.
    Class,
    /// Types implementing a matching interface.
    Interface,
    /// Types extending a matching class.
    Subclass,
    /// Types related to a matching type in any direction.
    Context,
    /// Types a matching type points to.
    OutgoingContext,
    /// Types of the named package. The pattern is the package name itself.
    Package,
}

impl MatchKind {
    fn keyword(self) -> &'static str {
        match self {
            MatchKind::Class => "class",
            MatchKind::Interface => "interface",
            MatchKind::Subclass => "subclass",
            MatchKind::Context => "context",
            MatchKind::OutgoingContext => "outgoingContext",
            MatchKind::Package => "package",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for MatchKind {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        [
            MatchKind::Class,
            MatchKind::Interface,
            MatchKind::Subclass,
            MatchKind::Context,
            MatchKind::OutgoingContext,
            MatchKind::Package,
        ]
        .into_iter()
        .find(|kind| kind.keyword().eq_ignore_ascii_case(s))
        .ok_or_else(|| UnknownNameError::new("match type", s))
    }
}

/// The header of a view's `@match` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpec {
    kind: MatchKind,
    pattern: String,
}

impl MatchSpec {
    pub fn new(kind: MatchKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
        }
    }

    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    /// The regular expression, not yet compiled.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Parses a `@match` tag.
pub fn parse_match(text: &str) -> Result<MatchSpec> {
    let fields = tokenize(text);
    match fields.fields() {
        [kind, pattern] => kind
            .value()
            .parse::<MatchKind>()
            .map(|kind| MatchSpec::new(kind, pattern.value()))
            .map_err(|err| {
                Diagnostic::warning(err.to_string())
                    .with_code(ErrorCode::E004)
                    .with_label(kind.span(), "unknown match type")
                    .with_help("use class, interface, subclass, context, outgoingContext or package")
            }),
        _ => Err(field_count_diagnostic(
            &fields,
            ErrorCode::E005,
            "`@match` expects a match type and a pattern".to_string(),
            "example: `@match class com\\.acme\\..*`",
        )),
    }
}

/// One option setting, from an `@opt` tag or a configuration entry.
///
/// The name is stored without its `-`, `--` or `!` prefix; `!` sets
/// [`negated`](Self::negated), which clears or resets the option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRule {
    name: String,
    negated: bool,
    args: Vec<String>,
}

impl OptionRule {
    /// Creates a rule from a raw option name and its arguments.
    ///
    /// ```
    /// use trellis_parser::tags::OptionRule;
    ///
    /// let rule = OptionRule::new("-!hide", Vec::<String>::new());
    /// assert_eq!(rule.name(), "hide");
    /// assert!(rule.negated());
    /// ```
    pub fn new(raw_name: &str, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut name = raw_name;
        for _ in 0..2 {
            if name.len() > 1 {
                name = name.strip_prefix('-').unwrap_or(name);
            }
        }
        let (name, negated) = match name.strip_prefix('!') {
            Some(rest) if !rest.is_empty() => (rest, true),
            _ => (name, false),
        };
        Self {
            name: name.to_string(),
            negated,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the rule clears or resets the option.
    pub fn negated(&self) -> bool {
        self.negated
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }

    /// Case-insensitive comparison with an option name.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for OptionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Parses an `@opt` tag, or an option string in the same syntax.
///
/// ```
/// use trellis_parser::tags::parse_option;
///
/// let rule = parse_option("collpackages java\\.util\\..*").unwrap();
/// assert_eq!(rule.name(), "collpackages");
/// assert_eq!(rule.arg(0), Some("java\\.util\\..*"));
/// ```
pub fn parse_option(text: &str) -> Result<OptionRule> {
    let fields = tokenize(text);
    match fields.fields().split_first() {
        Some((name, args)) if !name.value().is_empty() => {
            Ok(OptionRule::new(name.value(), args.iter().map(|f| f.value())))
        }
        _ => Err(Diagnostic::warning("`@opt` without an option name")
            .with_code(ErrorCode::E005)
            .with_label(Span::new(0..text.len()), "option name expected")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relation_four_fields() {
        let rel = parse_relation(RelationKind::Assoc, "0..1 owner * a.B").unwrap();
        assert_eq!(rel.kind(), RelationKind::Assoc);
        assert_eq!(rel.tail_label(), "0..1");
        assert_eq!(rel.label(), "owner");
        assert_eq!(rel.head_label(), "*");
        assert_eq!(rel.target(), "a.B");
    }

    #[test]
    fn test_parse_relation_placeholders() {
        let rel = parse_relation(RelationKind::Depend, "- - - a.B").unwrap();
        assert_eq!(rel.tail_label(), "");
        assert_eq!(rel.label(), "");
        assert_eq!(rel.head_label(), "");
    }

    #[test]
    fn test_parse_relation_wrong_field_count() {
        let err = parse_relation(RelationKind::NavAssoc, "- - a.B").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E002));
        assert!(err.severity().is_warning());
        assert_eq!(err.labels()[0].message(), "found 3 fields");

        let err = parse_relation(RelationKind::Has, "1 2 3 4 5").unwrap_err();
        assert_eq!(err.labels()[0].message(), "found 5 fields");
    }

    #[test]
    fn test_parse_relation_unterminated_quote_is_reported() {
        let err = parse_relation(RelationKind::Has, r#"1 "broken * a.B"#).unwrap_err();
        assert_eq!(err.labels().len(), 2);
        assert!(err.labels()[1].is_secondary());
    }

    #[test]
    fn test_parse_relation_empty_target() {
        let err = parse_relation(RelationKind::Has, "1 - * -").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E002));
    }

    #[test]
    fn test_parse_stereotype_and_tag_value() {
        assert_eq!(parse_stereotype("entity").unwrap(), "entity");
        assert_eq!(parse_stereotype(r#""value object""#).unwrap(), "value object");
        assert_eq!(
            parse_stereotype("two words").unwrap_err().code(),
            Some(ErrorCode::E003)
        );

        let tv = parse_tag_value(r#"author "Ada L.""#).unwrap();
        assert_eq!(tv.name(), "author");
        assert_eq!(tv.value(), "Ada L.");
        assert!(parse_tag_value("lonely").is_err());
    }

    #[test]
    fn test_parse_match() {
        let spec = parse_match("interface .*Repository").unwrap();
        assert_eq!(spec.kind(), MatchKind::Interface);
        assert_eq!(spec.pattern(), ".*Repository");

        let spec = parse_match("outgoingContext a\\.A").unwrap();
        assert_eq!(spec.kind(), MatchKind::OutgoingContext);

        let err = parse_match("friends .*").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E004));

        let err = parse_match("class").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E005));
    }

    #[test]
    fn test_option_rule_prefixes() {
        let plain = OptionRule::new("attributes", Vec::<String>::new());
        assert_eq!(plain.name(), "attributes");
        assert!(!plain.negated());

        let dashed = OptionRule::new("--inferrel", Vec::<String>::new());
        assert_eq!(dashed.name(), "inferrel");

        let negated = OptionRule::new("!hide", Vec::<String>::new());
        assert_eq!(negated.name(), "hide");
        assert!(negated.negated());

        let dash_bang = OptionRule::new("-!qualify", Vec::<String>::new());
        assert_eq!(dash_bang.name(), "qualify");
        assert!(dash_bang.negated());

        assert_eq!(OptionRule::new("-", Vec::<String>::new()).name(), "-");
    }

    #[test]
    fn test_parse_option() {
        let rule = parse_option("nodefillcolor LightGray").unwrap();
        assert!(rule.is("NodeFillColor"));
        assert_eq!(rule.args(), ["LightGray"]);
        assert_eq!(rule.to_string(), "nodefillcolor LightGray");

        let rule = parse_option(r#"contextPattern navassoc out"#).unwrap();
        assert_eq!(rule.arg(1), Some("out"));
        assert_eq!(rule.arg(2), None);

        assert!(parse_option("   ").is_err());
    }
}
