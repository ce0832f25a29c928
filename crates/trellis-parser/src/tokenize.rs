//! Field splitting for tag text.
//!
//! Tag text is a sequence of fields separated by whitespace. A field that
//! starts with `"` runs to the next `"` and may contain spaces. A field
//! consisting of a single `-` stands for the empty string, so
//! `@navassoc - uses * Order` has an empty tail label.
//!
//! An unterminated quote ends the field list: the fields before it are kept
//! and the position of the quote is reported alongside them.

use winnow::{
    Parser as _,
    ascii::multispace0,
    combinator::delimited,
    error::{ContextError, ModalResult},
    stream::{LocatingSlice, Location},
    token::take_till,
};

use crate::span::Span;

type Input<'a> = LocatingSlice<&'a str>;
type PResult<O> = ModalResult<O, ContextError>;

/// One field of a tag, with `-` already mapped to the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    value: &'a str,
    span: Span,
}

impl<'a> Field<'a> {
    fn new(raw: &'a str, span: Span) -> Self {
        let value = if raw == "-" { "" } else { raw };
        Self { value, span }
    }

    pub fn value(&self) -> &'a str {
        self.value
    }

    /// Byte range of the field in the tag text, quotes included.
    pub fn span(&self) -> Span {
        self.span
    }
}

/// The fields of a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields<'a> {
    fields: Vec<Field<'a>>,
    unterminated: Option<Span>,
}

impl<'a> Fields<'a> {
    pub fn fields(&self) -> &[Field<'a>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.fields.get(i).map(Field::value)
    }

    /// Field values as owned strings.
    pub fn values(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.value().to_string()).collect()
    }

    /// Span from an opening quote that was never closed to the end of the
    /// text, if there was one.
    pub fn unterminated(&self) -> Option<Span> {
        self.unterminated
    }

    /// Span covering every field.
    pub fn span(&self) -> Span {
        self.fields
            .iter()
            .map(Field::span)
            .reduce(|a, b| a.union(b))
            .unwrap_or_default()
    }
}

fn skip_space(input: &mut Input<'_>) -> PResult<()> {
    multispace0.void().parse_next(input)
}

fn quoted<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    delimited('"', take_till(0.., '"'), '"').parse_next(input)
}

fn bare<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_till(1.., char::is_whitespace).parse_next(input)
}

/// Splits tag text into fields.
///
/// ```
/// use trellis_parser::tokenize;
///
/// let fields = tokenize(r#"1 "owns many" * com.acme.Order"#);
/// assert_eq!(fields.values(), vec!["1", "owns many", "*", "com.acme.Order"]);
///
/// assert_eq!(tokenize("- - - Order").values(), vec!["", "", "", "Order"]);
/// ```
pub fn tokenize(text: &str) -> Fields<'_> {
    let mut input = LocatingSlice::new(text);
    let mut fields = Fields::default();

    loop {
        // multispace0 cannot fail
        let _ = skip_space(&mut input);
        if input.is_empty() {
            return fields;
        }

        let start = input.current_token_start();
        let parsed = if input.starts_with('"') {
            quoted(&mut input)
        } else {
            bare(&mut input)
        };
        match parsed {
            Ok(raw) => {
                let end = input.current_token_start();
                fields.fields.push(Field::new(raw, Span::new(start..end)));
            }
            Err(_) => {
                fields.unterminated = Some(Span::new(start..text.len()));
                return fields;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_fields() {
        let fields = tokenize("  tail label head target  ");
        assert_eq!(fields.values(), vec!["tail", "label", "head", "target"]);
        assert!(fields.unterminated().is_none());
    }

    #[test]
    fn test_tokenize_quoted_fields() {
        let fields = tokenize(r#""0..1" "is owned by" - a.B"#);
        assert_eq!(fields.values(), vec!["0..1", "is owned by", "", "a.B"]);
        assert_eq!(fields.fields()[1].span(), Span::new(7..20));
    }

    #[test]
    fn test_tokenize_dash_is_empty() {
        let fields = tokenize("- - - a.B");
        assert_eq!(fields.len(), 4);
        assert_eq!(fields.get(0), Some(""));
        assert_eq!(fields.get(3), Some("a.B"));
        assert_eq!(fields.get(4), None);
    }

    #[test]
    fn test_tokenize_quoted_dash_is_empty() {
        assert_eq!(tokenize(r#""-" x"#).values(), vec!["", "x"]);
    }

    #[test]
    fn test_tokenize_empty_quotes() {
        assert_eq!(tokenize(r#""" x"#).values(), vec!["", "x"]);
    }

    #[test]
    fn test_tokenize_unterminated_quote_keeps_prefix() {
        let text = r#"1 "never closed *"#;
        let fields = tokenize(text);
        assert_eq!(fields.values(), vec!["1"]);
        assert_eq!(fields.unterminated(), Some(Span::new(2..text.len())));
    }

    #[test]
    fn test_tokenize_empty_text() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
        assert_eq!(tokenize("").span(), Span::default());
    }

    #[test]
    fn test_tokenize_tabs_and_newlines_separate() {
        assert_eq!(tokenize("a\tb\nc").values(), vec!["a", "b", "c"]);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn word_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_.*]{1,8}".prop_filter("dash is a placeholder", |w| w != "-")
    }

    fn phrase_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 ]{0,12}"
    }

    proptest! {
        #[test]
        fn bare_words_split_on_whitespace(words in prop::collection::vec(word_strategy(), 0..6)) {
            let text = words.join("  ");
            prop_assert_eq!(tokenize(&text).values(), words);
        }

        #[test]
        fn quoted_phrase_is_one_field(phrase in phrase_strategy(), tail in word_strategy()) {
            let text = format!("\"{phrase}\" {tail}");
            let fields = tokenize(&text);
            prop_assert_eq!(fields.len(), 2);
            prop_assert_eq!(fields.get(0), Some(phrase.as_str()).filter(|p| *p != "-"));
            prop_assert_eq!(fields.get(1), Some(tail.as_str()));
        }
    }
}
