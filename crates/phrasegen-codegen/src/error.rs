use phrasegen_source::Span;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodegenError {
    #[error("{placeholder}: could not determine \"{name}\" occurrence {occurrence}")]
    Unresolved {
        placeholder: String,
        name: String,
        occurrence: usize,
        span: Span,
    },

    #[error("{message}")]
    Syntax { message: String, span: Span },
}

impl CodegenError {
    pub(crate) fn syntax(message: impl Into<String>, span: Span) -> Self {
        CodegenError::Syntax {
            message: message.into(),
            span,
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            CodegenError::Unresolved { span, .. } | CodegenError::Syntax { span, .. } => *span,
        }
    }

    #[must_use]
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            CodegenError::Unresolved { .. } => "G100",
            CodegenError::Syntax { .. } => "G101",
        }
    }
}
