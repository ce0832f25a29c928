//! UML node shapes.

use std::{fmt, str::FromStr};

use trellis_core::error::UnknownNameError;

/// The outline a node is drawn with.
///
/// `Class` and `ActiveClass` draw their outline through the label table and
/// leave the Graphviz shape at the global `plaintext`; every other shape
/// sets a Graphviz shape of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Shape {
    #[default]
    Class,
    Note,
    Node,
    Component,
    Package,
    Collaboration,
    UseCase,
    ActiveClass,
}

impl Shape {
    const ALL: [Shape; 8] = [
        Shape::Class,
        Shape::Note,
        Shape::Node,
        Shape::Component,
        Shape::Package,
        Shape::Collaboration,
        Shape::UseCase,
        Shape::ActiveClass,
    ];

    fn keyword(self) -> &'static str {
        match self {
            Shape::Class => "class",
            Shape::Note => "note",
            Shape::Node => "node",
            Shape::Component => "component",
            Shape::Package => "package",
            Shape::Collaboration => "collaboration",
            Shape::UseCase => "usecase",
            Shape::ActiveClass => "activeclass",
        }
    }

    /// Node attributes contributed by the shape, as `(name, value)` pairs.
    pub fn graphviz_attributes(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Shape::Class | Shape::ActiveClass => &[],
            Shape::Note => &[("shape", "note")],
            Shape::Node => &[("shape", "box3d")],
            Shape::Component => &[("shape", "component")],
            Shape::Package => &[("shape", "tab")],
            Shape::Collaboration => &[("shape", "ellipse"), ("style", "dashed")],
            Shape::UseCase => &[("shape", "ellipse")],
        }
    }

    /// Port edges attach to, for shapes whose outline is the label table.
    pub fn landing_port(self) -> Option<&'static str> {
        self.draws_outline().then_some("p")
    }

    /// Cell border width of the label table.
    pub fn cell_border(self) -> u8 {
        u8::from(self.draws_outline())
    }

    /// Active classes get an extra empty column on both sides of the label.
    pub fn extra_column(self, rows: usize) -> Option<String> {
        (self == Shape::ActiveClass).then(|| format!("<td rowspan=\"{rows}\"></td>"))
    }

    fn draws_outline(self) -> bool {
        matches!(self, Shape::Class | Shape::ActiveClass)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Shape {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.keyword() == s)
            .ok_or_else(|| UnknownNameError::new("shape", s))
    }
}
