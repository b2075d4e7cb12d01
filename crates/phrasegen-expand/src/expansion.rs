use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::variant::Variant;

/// `(macro name, occurrence index)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
    name: String,
    index: usize,
}

impl OccurrenceKey {
    #[must_use]
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.index)
    }
}

/// Half-open token range `[start, end)` within an expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    #[must_use]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// One concrete utterance produced from a template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Expansion {
    pub(crate) tokens: Vec<String>,
    pub(crate) positions: BTreeMap<OccurrenceKey, TokenSpan>,
    pub(crate) bindings: BTreeMap<OccurrenceKey, Arc<Variant>>,
}

impl Expansion {
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Tokens joined by single spaces; the stored form of training inputs.
    #[must_use]
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    #[must_use]
    pub fn span(&self, name: &str, occurrence: usize) -> Option<TokenSpan> {
        self.positions
            .get(&OccurrenceKey::new(name, occurrence))
            .copied()
    }

    /// The full variant chosen for an occurrence.
    #[must_use]
    pub fn variant(&self, name: &str, occurrence: usize) -> Option<&Variant> {
        self.bindings
            .get(&OccurrenceKey::new(name, occurrence))
            .map(|variant| &**variant)
    }

    #[must_use]
    pub fn positions(&self) -> &BTreeMap<OccurrenceKey, TokenSpan> {
        &self.positions
    }

    #[must_use]
    pub fn bindings(&self) -> &BTreeMap<OccurrenceKey, Arc<Variant>> {
        &self.bindings
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
