//! Error codes for the Trellis diagnostic system.
//!
//! Error codes are organized by what was being read:
//! - `E0xx` - Tag errors
//! - `E1xx` - Type expression errors
//! - `E2xx` - Model file errors
//! - `E3xx` - Option and pattern errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Tag Errors (E0xx)
    // =========================================================================
    /// Unterminated quoted field.
    ///
    /// A tag field was opened with `"` but never closed. Fields before the
    /// quote are kept; the rest of the tag is ignored.
    E001,

    /// Wrong number of fields in a relation tag.
    ///
    /// Relation tags such as `@navassoc` take exactly four fields: tail
    /// label, label, head label and target type.
    E002,

    /// Wrong number of fields in a stereotype or tagged value.
    ///
    /// `@stereotype` takes one field and `@tagvalue` takes two.
    E003,

    /// Unknown match type in a view.
    ///
    /// `@match` accepts `class`, `interface`, `subclass`, `context` and
    /// `outgoingContext`.
    E004,

    /// Missing tag argument.
    ///
    /// A tag that needs a value was given none.
    E005,

    // =========================================================================
    // Type Expression Errors (E1xx)
    // =========================================================================
    /// Unexpected character in a type expression.
    E100,

    /// Incomplete type expression.
    ///
    /// The expression ended before a type argument list was closed.
    E101,

    // =========================================================================
    // Model File Errors (E2xx)
    // =========================================================================
    /// Malformed model file.
    ///
    /// The file is not valid TOML or does not follow the model schema.
    E200,

    /// Duplicate type definition.
    ///
    /// Two `[[types]]` entries share the same qualified name.
    E201,

    /// Invalid type expression in the model file.
    E202,

    /// Malformed tag line.
    ///
    /// Tags are written as `"@name text"`.
    E203,

    // =========================================================================
    // Option Errors (E3xx)
    // =========================================================================
    /// Invalid regular expression.
    ///
    /// The rule using the pattern is skipped.
    E300,

    /// Unknown option.
    E301,

    /// Missing option argument.
    E302,

    /// Invalid option value.
    ///
    /// The value has the wrong form for the option, e.g. a non-numeric
    /// `nodesep` or an unknown relation kind for `inferreltype`.
    E303,

    /// Unreadable documentation link file.
    ///
    /// The package list of `link`/`linkoffline` or the `apidocmap` file
    /// could not be read. No link is added.
    E304,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Tag errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            // Type expression errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            // Model file errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            // Option errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Tag errors
            ErrorCode::E001 => "unterminated quoted field",
            ErrorCode::E002 => "wrong number of relation fields",
            ErrorCode::E003 => "wrong number of annotation fields",
            ErrorCode::E004 => "unknown match type",
            ErrorCode::E005 => "missing tag argument",
            // Type expression errors
            ErrorCode::E100 => "unexpected character",
            ErrorCode::E101 => "incomplete type expression",
            // Model file errors
            ErrorCode::E200 => "malformed model file",
            ErrorCode::E201 => "duplicate type definition",
            ErrorCode::E202 => "invalid type expression",
            ErrorCode::E203 => "malformed tag",
            // Option errors
            ErrorCode::E300 => "invalid pattern",
            ErrorCode::E301 => "unknown option",
            ErrorCode::E302 => "missing option argument",
            ErrorCode::E303 => "invalid option value",
            ErrorCode::E304 => "unreadable link file",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
