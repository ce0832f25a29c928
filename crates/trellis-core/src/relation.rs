//! Relation kinds and the direction algebra.
//!
//! Every edge the diagram builder emits is one of the nine [`RelationKind`]s.
//! Between any two nodes the builder keeps a [`RelationPattern`]: one
//! [`RelationDirection`] per kind, summed every time a relation of that kind
//! is observed. The inference passes and the context matcher consult these
//! patterns to decide whether an existing relation already covers a new one.

use std::{fmt, ops::Add, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownNameError;

/// The kinds of relation a class diagram can draw between two types.
///
/// The order of the variants is significant: it is the index of the kind
/// inside a [`RelationPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Plain association, drawn without arrowheads.
    Assoc,
    /// Navigable association.
    NavAssoc,
    /// Aggregation.
    Has,
    /// Navigable aggregation.
    NavHas,
    /// Composition.
    Composed,
    /// Navigable composition.
    NavComposed,
    /// Dependency.
    Depend,
    /// Generalization, from a subtype to its superclass.
    Extends,
    /// Realization, from a type to an implemented interface.
    Implements,
}

impl RelationKind {
    /// Number of relation kinds, and the length of a [`RelationPattern`].
    pub const COUNT: usize = 9;

    /// All kinds in pattern index order.
    pub const ALL: [RelationKind; Self::COUNT] = [
        RelationKind::Assoc,
        RelationKind::NavAssoc,
        RelationKind::Has,
        RelationKind::NavHas,
        RelationKind::Composed,
        RelationKind::NavComposed,
        RelationKind::Depend,
        RelationKind::Extends,
        RelationKind::Implements,
    ];

    /// The kinds that can be declared through tags on a type.
    pub const DECLARED: [RelationKind; 7] = [
        RelationKind::Assoc,
        RelationKind::NavAssoc,
        RelationKind::Has,
        RelationKind::NavHas,
        RelationKind::Composed,
        RelationKind::NavComposed,
        RelationKind::Depend,
    ];

    /// Position of this kind inside a [`RelationPattern`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Tag name used to declare the relation (`@navassoc ...`).
    pub fn tag_name(self) -> &'static str {
        match self {
            RelationKind::Assoc => "assoc",
            RelationKind::NavAssoc => "navassoc",
            RelationKind::Has => "has",
            RelationKind::NavHas => "navhas",
            RelationKind::Composed => "composed",
            RelationKind::NavComposed => "navcomposed",
            RelationKind::Depend => "depend",
            RelationKind::Extends => "extends",
            RelationKind::Implements => "implements",
        }
    }

    /// Direction recorded on the source node of a new relation of this kind.
    ///
    /// Undirected kinds are recorded as [`RelationDirection::Both`], the
    /// navigable association, the dependency and the two inheritance kinds
    /// as [`RelationDirection::Out`].
    pub fn source_direction(self) -> RelationDirection {
        match self {
            RelationKind::NavAssoc
            | RelationKind::Depend
            | RelationKind::Extends
            | RelationKind::Implements => RelationDirection::Out,
            _ => RelationDirection::Both,
        }
    }

    /// Direction recorded on the target node, or `None` if the target does
    /// not learn about the relation at all.
    pub fn target_direction(self) -> Option<RelationDirection> {
        match self {
            RelationKind::NavAssoc | RelationKind::Depend => None,
            RelationKind::Extends | RelationKind::Implements => Some(RelationDirection::In),
            _ => Some(RelationDirection::Both),
        }
    }

    /// Whether the target node records the relation too.
    pub fn is_reciprocal(self) -> bool {
        self.target_direction().is_some()
    }

    /// Whether this kind is one of the two inheritance kinds.
    pub fn is_inheritance(self) -> bool {
        matches!(self, RelationKind::Extends | RelationKind::Implements)
    }

    /// Arrow styling for edges of this kind.
    pub fn edge_style(self) -> EdgeStyle {
        match self {
            RelationKind::Assoc => EdgeStyle::new("none"),
            RelationKind::NavAssoc => EdgeStyle::new("open"),
            RelationKind::Has => EdgeStyle::new("none").with_tail("ediamond", "both"),
            RelationKind::NavHas => EdgeStyle::new("open").with_tail("ediamond", "both"),
            RelationKind::Composed => EdgeStyle::new("none").with_tail("diamond", "both"),
            RelationKind::NavComposed => EdgeStyle::new("open").with_tail("diamond", "both"),
            RelationKind::Depend => EdgeStyle::new("open").dashed(),
            RelationKind::Extends => EdgeStyle::new("none").with_tail("empty", "back"),
            RelationKind::Implements => EdgeStyle::new("none").with_tail("empty", "back").dashed(),
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

impl FromStr for RelationKind {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationKind::ALL
            .into_iter()
            .find(|kind| kind.tag_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownNameError::new("relation kind", s))
    }
}

/// Arrow decoration of an edge, independent of the output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeStyle {
    arrowhead: &'static str,
    arrowtail: Option<&'static str>,
    dir: Option<&'static str>,
    dashed: bool,
}

impl EdgeStyle {
    fn new(arrowhead: &'static str) -> Self {
        Self {
            arrowhead,
            arrowtail: None,
            dir: None,
            dashed: false,
        }
    }

    fn with_tail(mut self, arrowtail: &'static str, dir: &'static str) -> Self {
        self.arrowtail = Some(arrowtail);
        self.dir = Some(dir);
        self
    }

    fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }

    pub fn arrowhead(&self) -> &'static str {
        self.arrowhead
    }

    pub fn arrowtail(&self) -> Option<&'static str> {
        self.arrowtail
    }

    pub fn dir(&self) -> Option<&'static str> {
        self.dir
    }

    pub fn is_dashed(&self) -> bool {
        self.dashed
    }
}

/// Observed directionality of one relation kind between two nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationDirection {
    #[default]
    None,
    In,
    Out,
    Both,
}

impl RelationDirection {
    /// Combines two observations.
    ///
    /// `None` is the identity, `Both` absorbs everything and `In` plus
    /// `Out` gives `Both`.
    pub fn sum(self, other: RelationDirection) -> RelationDirection {
        if self == other || other == RelationDirection::None {
            self
        } else if self == RelationDirection::None {
            other
        } else {
            RelationDirection::Both
        }
    }

    /// Whether an observation of `self` already covers `other`.
    pub fn contains(self, other: RelationDirection) -> bool {
        self == RelationDirection::Both || self == other
    }

    /// Swaps `In` and `Out`.
    pub fn inverse(self) -> RelationDirection {
        match self {
            RelationDirection::In => RelationDirection::Out,
            RelationDirection::Out => RelationDirection::In,
            other => other,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            RelationDirection::None => "none",
            RelationDirection::In => "in",
            RelationDirection::Out => "out",
            RelationDirection::Both => "both",
        }
    }
}

impl Add for RelationDirection {
    type Output = RelationDirection;

    fn add(self, rhs: RelationDirection) -> RelationDirection {
        self.sum(rhs)
    }
}

impl fmt::Display for RelationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for RelationDirection {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            RelationDirection::None,
            RelationDirection::In,
            RelationDirection::Out,
            RelationDirection::Both,
        ]
        .into_iter()
        .find(|dir| dir.keyword().eq_ignore_ascii_case(s))
        .ok_or_else(|| UnknownNameError::new("relation direction", s))
    }
}

/// One node's view of its relations toward another node: a direction per
/// [`RelationKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelationPattern([RelationDirection; RelationKind::COUNT]);

impl RelationPattern {
    /// Creates a pattern with every cell set to `direction`.
    pub fn new(direction: RelationDirection) -> Self {
        Self([direction; RelationKind::COUNT])
    }

    /// Sums `direction` into the cell of `kind`.
    pub fn add_relation(&mut self, kind: RelationKind, direction: RelationDirection) {
        let cell = &mut self.0[kind.index()];
        *cell = cell.sum(direction);
    }

    pub fn direction(&self, kind: RelationKind) -> RelationDirection {
        self.0[kind.index()]
    }

    /// True if, for at least one kind, this pattern's direction contains the
    /// direction `other` holds for the same kind.
    pub fn matches_one(&self, other: &RelationPattern) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .any(|(mine, theirs)| mine.contains(*theirs))
    }

    /// Iterates over the kinds with a direction other than `None`.
    pub fn observed(&self) -> impl Iterator<Item = (RelationKind, RelationDirection)> + '_ {
        RelationKind::ALL
            .into_iter()
            .map(|kind| (kind, self.direction(kind)))
            .filter(|(_, dir)| *dir != RelationDirection::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use RelationDirection::{Both, In, None as Unset, Out};

    #[test]
    fn test_sum_table() {
        assert_eq!(Out.sum(In), Both);
        assert_eq!(In.sum(Out), Both);
        assert_eq!(Out.sum(Out), Out);
        assert_eq!(Unset.sum(In), In);
        assert_eq!(In.sum(Unset), In);
        assert_eq!(Both.sum(Unset), Both);
        assert_eq!(Out + In, Both);
    }

    #[test]
    fn test_contains() {
        assert!(Both.contains(Unset));
        assert!(Out.contains(Out));
        assert!(!Out.contains(Both));
        assert!(!Out.contains(In));
        assert!(Unset.contains(Unset));
    }

    #[test]
    fn test_inverse() {
        assert_eq!(In.inverse(), Out);
        assert_eq!(Out.inverse(), In);
        assert_eq!(Both.inverse(), Both);
        assert_eq!(Unset.inverse(), Unset);
    }

    #[test]
    fn test_relation_kind_from_str_is_case_insensitive() {
        assert_eq!("NavAssoc".parse::<RelationKind>(), Ok(RelationKind::NavAssoc));
        assert_eq!("DEPEND".parse::<RelationKind>(), Ok(RelationKind::Depend));
        assert!("friend".parse::<RelationKind>().is_err());
    }

    #[test]
    fn test_relation_direction_from_str() {
        assert_eq!("out".parse::<RelationDirection>(), Ok(Out));
        assert_eq!("BOTH".parse::<RelationDirection>(), Ok(Both));
        assert!("sideways".parse::<RelationDirection>().is_err());
    }

    #[test]
    fn test_direction_rules() {
        assert!(!RelationKind::NavAssoc.is_reciprocal());
        assert!(!RelationKind::Depend.is_reciprocal());
        assert_eq!(RelationKind::Has.source_direction(), Both);
        assert_eq!(RelationKind::Has.target_direction(), Some(Both));
        assert_eq!(RelationKind::Extends.source_direction(), Out);
        assert_eq!(RelationKind::Implements.target_direction(), Some(In));
    }

    #[test]
    fn test_edge_styles() {
        let has = RelationKind::NavHas.edge_style();
        assert_eq!(has.arrowhead(), "open");
        assert_eq!(has.arrowtail(), Some("ediamond"));
        assert_eq!(has.dir(), Some("both"));

        let depend = RelationKind::Depend.edge_style();
        assert!(depend.is_dashed());
        assert_eq!(depend.arrowtail(), None);

        let implements = RelationKind::Implements.edge_style();
        assert_eq!(implements.dir(), Some("back"));
        assert!(implements.is_dashed());
        assert!(!RelationKind::Extends.edge_style().is_dashed());
    }

    #[test]
    fn test_pattern_add_and_match() {
        let mut pattern = RelationPattern::default();
        assert!(pattern.observed().next().is_none());

        pattern.add_relation(RelationKind::NavAssoc, Out);
        pattern.add_relation(RelationKind::NavAssoc, Out);
        assert_eq!(pattern.direction(RelationKind::NavAssoc), Out);

        assert!(RelationPattern::new(Out).matches_one(&pattern));
        assert!(pattern.matches_one(&RelationPattern::new(Out)));
        assert!(!pattern.matches_one(&RelationPattern::new(In)));

        pattern.add_relation(RelationKind::NavAssoc, In);
        assert_eq!(pattern.direction(RelationKind::NavAssoc), Both);
        assert_eq!(
            pattern.observed().collect::<Vec<_>>(),
            vec![(RelationKind::NavAssoc, Both)]
        );
    }

    #[test]
    fn test_default_pattern_matches_nothing_directional() {
        let empty = RelationPattern::default();
        assert!(!empty.matches_one(&RelationPattern::new(Out)));
        assert!(RelationPattern::new(Both).matches_one(&empty));
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn direction_strategy() -> impl Strategy<Value = RelationDirection> {
        prop_oneof![
            Just(RelationDirection::None),
            Just(RelationDirection::In),
            Just(RelationDirection::Out),
            Just(RelationDirection::Both),
        ]
    }

    fn kind_strategy() -> impl Strategy<Value = RelationKind> {
        (0..RelationKind::COUNT).prop_map(|i| RelationKind::ALL[i])
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_sum_laws(a: RelationDirection, b: RelationDirection) -> Result<(), TestCaseError> {
        prop_assert_eq!(a.sum(b), b.sum(a));
        prop_assert_eq!(RelationDirection::None.sum(a), a);
        prop_assert_eq!(RelationDirection::Both.sum(a), RelationDirection::Both);
        prop_assert_eq!(a.sum(a), a);
        Ok(())
    }

    fn check_inverse_involution(d: RelationDirection) -> Result<(), TestCaseError> {
        prop_assert_eq!(d.inverse().inverse(), d);
        prop_assert!(RelationDirection::Both.contains(d));
        Ok(())
    }

    fn check_sum_contains_operand(
        a: RelationDirection,
        b: RelationDirection,
    ) -> Result<(), TestCaseError> {
        let total = a.sum(b);
        if b != RelationDirection::None {
            prop_assert!(total.contains(b));
        }
        Ok(())
    }

    fn check_add_relation_is_idempotent(
        kind: RelationKind,
        d: RelationDirection,
    ) -> Result<(), TestCaseError> {
        let mut once = RelationPattern::default();
        once.add_relation(kind, d);
        let mut twice = once;
        twice.add_relation(kind, d);
        prop_assert_eq!(once, twice);
        Ok(())
    }

    proptest! {
        #[test]
        fn sum_laws(a in direction_strategy(), b in direction_strategy()) {
            check_sum_laws(a, b)?;
        }

        #[test]
        fn inverse_involution(d in direction_strategy()) {
            check_inverse_involution(d)?;
        }

        #[test]
        fn sum_contains_operand(a in direction_strategy(), b in direction_strategy()) {
            check_sum_contains_operand(a, b)?;
        }

        #[test]
        fn add_relation_is_idempotent(kind in kind_strategy(), d in direction_strategy()) {
            check_add_relation_is_idempotent(kind, d)?;
        }
    }
}
