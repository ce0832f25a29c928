//! Renders a [`TrellisError`] with miette.
//!
//! A model file error becomes one [`Report`] per diagnostic, shown against
//! the model source. Every other error becomes a single report.

use std::{error::Error, fmt};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity, SourceSpan};

use trellis::TrellisError;
use trellis_parser::error::Diagnostic;

/// One message ready for a miette report handler.
#[derive(Debug)]
pub struct Report<'a> {
    message: String,
    code: Option<String>,
    severity: Severity,
    help: Option<String>,
    labels: Vec<LabeledSpan>,
    src: Option<&'a str>,
    cause: Option<&'a (dyn Error + 'static)>,
}

impl<'a> Report<'a> {
    fn from_diagnostic(diag: &Diagnostic, src: &'a str) -> Self {
        let labels = diag
            .labels()
            .iter()
            .map(|label| {
                let span = SourceSpan::new(label.span().start().into(), label.span().len());
                let text = Some(label.message().to_string());
                if label.is_primary() {
                    LabeledSpan::new_primary_with_span(text, span)
                } else {
                    LabeledSpan::new_with_span(text, span)
                }
            })
            .collect();
        let severity = match diag.severity().is_warning() {
            true => Severity::Warning,
            false => Severity::Error,
        };
        Self {
            message: diag.message().to_string(),
            code: diag.code().map(|code| code.to_string()),
            severity,
            help: diag.help().map(str::to_string),
            labels,
            src: Some(src),
            cause: None,
        }
    }

    fn from_error(err: &'a TrellisError) -> Self {
        let code = match err {
            TrellisError::Io(_) => "trellis::io",
            TrellisError::Parse { .. } => "trellis::parse",
            TrellisError::Config(_) => "trellis::config",
            TrellisError::Export(_) => "trellis::export",
        };
        let help = matches!(err, TrellisError::Config(_)).then(|| {
            "check the `view` option and the `[options]` rules of the configuration".to_string()
        });
        Self {
            message: err.to_string(),
            code: Some(code.to_string()),
            severity: Severity::Error,
            help,
            labels: Vec::new(),
            src: None,
            cause: err.source(),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for Report<'_> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
    }
}

impl MietteDiagnostic for Report<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.code
            .as_deref()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn help<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.help
            .as_deref()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.src.as_ref().map(|src| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Box::new(self.labels.iter().cloned()))
    }
}

/// The reports of `err`: one per diagnostic of a model file error.
pub fn to_reports(err: &TrellisError) -> Vec<Report<'_>> {
    match err {
        TrellisError::Parse { err: parse_err, src } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Report::from_diagnostic(diag, src))
            .collect(),
        _ => vec![Report::from_error(err)],
    }
}
