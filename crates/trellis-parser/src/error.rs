//! Error and diagnostic system for the Trellis parsers.
//!
//! - Error codes for documentation and searchability
//! - Labeled spans for context
//! - Severity levels separating fatal load errors from skipped declarations
//! - A collector for accumulating every problem in a model file
//!
//! # Overview
//!
//! Single declarations (a relation tag, an `@opt` rule, a type expression)
//! parse into [`Result`], whose error side is the [`Diagnostic`] explaining
//! why the declaration is skipped. Loading a whole model returns
//! [`ParseError`], which wraps every diagnostic of the load.
//!
//! # Example
//!
//! ```
//! # use trellis_parser::error::{Diagnostic, ErrorCode};
//! # use trellis_parser::Span;
//!
//! let diag = Diagnostic::warning("`@navhas` expects four fields")
//!     .with_code(ErrorCode::E002)
//!     .with_label(Span::new(0..12), "found 2 fields")
//!     .with_help("use `-` for an empty field");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::{ParseError, Result};
pub use severity::Severity;
