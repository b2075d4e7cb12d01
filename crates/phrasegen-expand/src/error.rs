use phrasegen_source::Span;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExpandError {
    #[error("unknown macro \"{name}\"[{language}] called")]
    UnknownMacro {
        name: String,
        language: String,
        span: Span,
    },

    #[error("a variant of macro \"{name}\" does not bind variable \"{variable}\" (occurrence {occurrence})")]
    MissingVariable {
        name: String,
        variable: String,
        occurrence: usize,
        span: Span,
    },

    #[error("template expands to more than {limit} utterances")]
    TooManyExpansions { limit: usize },
}

impl ExpandError {
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        match self {
            ExpandError::UnknownMacro { span, .. } | ExpandError::MissingVariable { span, .. } => {
                Some(*span)
            }
            ExpandError::TooManyExpansions { .. } => None,
        }
    }

    #[must_use]
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            ExpandError::UnknownMacro { .. } => "E100",
            ExpandError::MissingVariable { .. } => "E101",
            ExpandError::TooManyExpansions { .. } => "E102",
        }
    }
}
