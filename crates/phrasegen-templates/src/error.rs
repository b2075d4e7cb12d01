use phrasegen_source::Span;
use thiserror::Error;

/// Syntax errors in an authored template.
///
/// Every variant is fatal for the template being parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("inline alternation is never closed, `)` missing")]
    UnterminatedAlternation { span: Span },

    #[error("nested alternations are not supported")]
    NestedAlternation { span: Span },

    #[error("macro references are not allowed inside an inline alternation")]
    MacroInAlternation { span: Span },

    #[error("unmatched `{delimiter}`")]
    UnmatchedClose { delimiter: char, span: Span },

    #[error("macro reference is never closed, `}}` missing")]
    UnterminatedMacroRef { span: Span },

    #[error("syntax error in macro call `{{{content}}}`, expected `{{name:variable}}`")]
    MalformedMacroRef { content: String, span: Span },

    #[error("invalid macro {kind} `{name}`")]
    InvalidName {
        kind: &'static str,
        name: String,
        span: Span,
    },

    #[error("trailing `\\` escapes nothing")]
    DanglingEscape { span: Span },
}

impl ParseError {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnterminatedAlternation { span }
            | ParseError::NestedAlternation { span }
            | ParseError::MacroInAlternation { span }
            | ParseError::UnmatchedClose { span, .. }
            | ParseError::UnterminatedMacroRef { span }
            | ParseError::MalformedMacroRef { span, .. }
            | ParseError::InvalidName { span, .. }
            | ParseError::DanglingEscape { span } => *span,
        }
    }

    #[must_use]
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            ParseError::UnterminatedAlternation { .. } => "P100",
            ParseError::NestedAlternation { .. } => "P101",
            ParseError::MacroInAlternation { .. } => "P102",
            ParseError::UnmatchedClose { .. } => "P103",
            ParseError::UnterminatedMacroRef { .. } => "P104",
            ParseError::MalformedMacroRef { .. } => "P105",
            ParseError::InvalidName { .. } => "P106",
            ParseError::DanglingEscape { .. } => "P107",
        }
    }
}
