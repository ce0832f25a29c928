use thiserror::Error;

/// Returned when a keyword does not name a member of one of the closed
/// vocabularies (relation kinds, directions, visibilities, type kinds).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {vocabulary} `{value}`")]
pub struct UnknownNameError {
    vocabulary: &'static str,
    value: String,
}

impl UnknownNameError {
    pub fn new(vocabulary: &'static str, value: impl Into<String>) -> Self {
        Self {
            vocabulary,
            value: value.into(),
        }
    }

    /// The name of the vocabulary that was searched, e.g. `relation kind`.
    pub fn vocabulary(&self) -> &'static str {
        self.vocabulary
    }

    /// The rejected input.
    pub fn value(&self) -> &str {
        &self.value
    }
}
