use std::fmt;

use phrasegen_source::Span;

/// Variable bound by every anonymous macro created from an inline alternation.
pub const ANONYMOUS_VARIABLE: &str = "W";

/// Built-in macro that contributes no tokens: `{empty:W}`.
pub const EMPTY_MACRO: &str = "empty";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal { text: String, span: Span },
    MacroRef(MacroRef),
}

impl Segment {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Segment::Literal { span, .. } => *span,
            Segment::MacroRef(macro_ref) => macro_ref.span,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal { text, .. } => write!(f, "{text:?}"),
            Segment::MacroRef(macro_ref) => write!(f, "{macro_ref}"),
        }
    }
}

/// One use of a macro inside a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroRef {
    pub name: String,
    pub variable: String,
    /// Position of this use among uses of the same name, counted from 0.
    pub occurrence: usize,
    pub span: Span,
}

impl fmt::Display for MacroRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}:{}#{}}}", self.name, self.variable, self.occurrence)
    }
}

/// A macro materialized from an inline alternation, visible only inside the
/// template that defines it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnonymousMacro {
    name: String,
    alternatives: Vec<String>,
    span: Span,
}

impl AnonymousMacro {
    pub(crate) fn new(ordinal: usize, alternatives: Vec<String>, span: Span) -> Self {
        Self {
            name: Self::name_for(ordinal),
            alternatives,
            span,
        }
    }

    /// `#` never appears in authored macro names, so these cannot shadow or be
    /// shadowed by registered macros.
    #[must_use]
    pub fn name_for(ordinal: usize) -> String {
        format!("#{ordinal}")
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw alternative texts, in authored order, untokenized.
    #[must_use]
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTemplate {
    source: String,
    segments: Vec<Segment>,
    anonymous_macros: Vec<AnonymousMacro>,
}

impl ParsedTemplate {
    pub(crate) fn new(
        source: String,
        segments: Vec<Segment>,
        anonymous_macros: Vec<AnonymousMacro>,
    ) -> Self {
        Self {
            source,
            segments,
            anonymous_macros,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn anonymous_macros(&self) -> &[AnonymousMacro] {
        &self.anonymous_macros
    }

    #[must_use]
    pub fn anonymous_macro(&self, name: &str) -> Option<&AnonymousMacro> {
        self.anonymous_macros.iter().find(|m| m.name == name)
    }

    pub fn macro_refs(&self) -> impl Iterator<Item = &MacroRef> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::MacroRef(macro_ref) => Some(macro_ref),
            Segment::Literal { .. } => None,
        })
    }

    /// Find the reference for a given occurrence, for diagnostics.
    #[must_use]
    pub fn find_ref(&self, name: &str, occurrence: usize) -> Option<&MacroRef> {
        self.macro_refs()
            .find(|r| r.name == name && r.occurrence == occurrence)
    }
}

impl fmt::Display for ParsedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
