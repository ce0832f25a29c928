//! Diagram exporters.

pub mod dot;

use std::{fmt, io};

use crate::{diagram::Diagram, options::ResolvedOptions};

/// Writes a built diagram somewhere.
pub trait Exporter {
    /// Exports `diagram`, drawn with the diagram-wide `options`.
    fn export_diagram(&mut self, diagram: &Diagram, options: &ResolvedOptions)
    -> Result<(), Error>;
}

#[derive(Debug)]
pub enum Error {
    Render(String),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Render(msg) => write!(f, "Render error: {msg}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Render(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
