//! Labeled spans for diagnostic messages.

use crate::span::Span;

/// A message attached to a span of the text being parsed.
///
/// Spans are byte offsets into whatever text the diagnostic is about: the
/// raw text of a tag, a type expression or a whole model file.
///
/// # Example
///
/// ```text
/// warning[E002]: `@navassoc` expects four fields
///   |
///   | 1 - Order
///   | ^^^^^^^^^ found 3 fields
///   |
///   = help: use `-` for an empty label: `1 - * Order`
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a primary label, marking where the problem is.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a secondary label, pointing at related text.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }

    pub(crate) fn shift(&mut self, offset: usize) {
        self.span = self.span.shift(offset);
    }
}
