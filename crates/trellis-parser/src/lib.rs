//! Trellis Parser
//!
//! Readers for the textual inputs of a Trellis diagram:
//!
//! - **Tags**: the field tokenizer and the parsers for relation, stereotype,
//!   tagged value, `@match` and `@opt` tags ([`tokenize`], [`tags`])
//! - **Type expressions**: `java.util.Map<String, Item[]>` and friends
//!   ([`parse_type`], [`parse_type_param`])
//! - **Model files**: TOML descriptions of a type model ([`load_model`])
//!
//! Parsers for single declarations return [`error::Result`]; its error side
//! is the [`error::Diagnostic`] a caller logs before skipping the
//! declaration.

pub mod error;
pub mod tags;

mod model_file;
mod span;
mod tokenize;
mod type_expr;

pub use model_file::load_model;
pub use span::Span;
pub use tokenize::{Field, Fields, tokenize};
pub use type_expr::{PRIMITIVES, parse_type, parse_type_param};
