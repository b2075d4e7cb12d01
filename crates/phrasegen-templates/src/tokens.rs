use phrasegen_source::Span;

pub(crate) const ALT_OPEN: char = '(';
pub(crate) const ALT_CLOSE: char = ')';
pub(crate) const ALT_SEPARATOR: char = '|';
pub(crate) const MACRO_OPEN: char = '{';
pub(crate) const MACRO_CLOSE: char = '}';
pub(crate) const ESCAPE: char = '\\';

/// Characters that lose their meaning when preceded by [`ESCAPE`].
pub(crate) const ESCAPABLE: &[char] = &[
    ALT_OPEN,
    ALT_CLOSE,
    ALT_SEPARATOR,
    MACRO_OPEN,
    MACRO_CLOSE,
    ESCAPE,
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Literal text with escapes already resolved.
    Text { content: String, span: Span },
    AltOpen { span: Span },
    AltClose { span: Span },
    AltSeparator { span: Span },
    /// Raw contents between `{` and `}`; the span covers both braces.
    MacroRef { content: String, span: Span },
    /// `{` without a closing `}`; the span runs to the end of the template.
    UnclosedMacroRef { span: Span },
    StrayMacroClose { span: Span },
    /// Trailing `\` with nothing to escape.
    DanglingEscape { span: Span },
    Eof { span: Span },
}

impl Token {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Token::Text { span, .. }
            | Token::AltOpen { span }
            | Token::AltClose { span }
            | Token::AltSeparator { span }
            | Token::MacroRef { span, .. }
            | Token::UnclosedMacroRef { span }
            | Token::StrayMacroClose { span }
            | Token::DanglingEscape { span }
            | Token::Eof { span } => *span,
        }
    }
}
