//! [`Diagnostic`]: why a declaration was skipped or a model failed to load.

use std::fmt;

use log::warn;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    span::Span,
};

/// A warning or error about some parsed text, with an optional code, spans
/// into that text and a hint.
///
/// ```
/// # use trellis_parser::error::{Diagnostic, ErrorCode};
/// # use trellis_parser::Span;
/// let diag = Diagnostic::warning("`@depend` expects four fields")
///     .with_code(ErrorCode::E002)
///     .with_label(Span::new(0..9), "found 3 fields")
///     .with_help("use `-` for an empty field");
/// assert_eq!(diag.to_string(), "warning[E002]: `@depend` expects four fields");
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }

    /// A problem that makes a model file unusable.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// A problem that only skips the declaration it is about.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Marks `span` as the place of the problem.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Points at text related to the problem, such as an earlier definition.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Moves every label `offset` bytes forward. Used when the diagnostic
    /// was produced on a slice of a larger text.
    pub fn shifted(mut self, offset: usize) -> Self {
        for label in &mut self.labels {
            label.shift(offset);
        }
        self
    }

    /// Logs the diagnostic as a warning about `subject`, the type or view
    /// whose declaration is skipped.
    pub fn log_skip(&self, subject: &str) {
        let code = self.code.map(|code| code.as_str()).unwrap_or("-");
        match self.help() {
            Some(help) => warn!(subject, code, help; "{}", self.message),
            None => warn!(subject, code; "{}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diag = Diagnostic::warning("`@navassoc` expects four fields").with_code(ErrorCode::E002);
        assert_eq!(diag.to_string(), "warning[E002]: `@navassoc` expects four fields");

        let diag = Diagnostic::error("model file is empty");
        assert!(diag.severity().is_error());
        assert_eq!(diag.to_string(), "error: model file is empty");
    }

    #[test]
    fn test_shifted_moves_every_label() {
        let diag = Diagnostic::warning("bad field")
            .with_label(Span::new(0..3), "here")
            .with_secondary_label(Span::new(4..6), "and here")
            .shifted(100);

        assert_eq!(diag.labels()[0].span(), Span::new(100..103));
        assert!(diag.labels()[0].is_primary());
        assert_eq!(diag.labels()[1].span(), Span::new(104..106));
        assert!(diag.labels()[1].is_secondary());
    }
}
