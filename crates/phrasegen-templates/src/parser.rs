use phrasegen_source::Span;
use rustc_hash::FxHashMap;

use crate::error::ParseError;
use crate::segment::AnonymousMacro;
use crate::segment::MacroRef;
use crate::segment::ParsedTemplate;
use crate::segment::Segment;
use crate::segment::ANONYMOUS_VARIABLE;
use crate::tokens::Token;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    current: usize,
    segments: Vec<Segment>,
    anonymous_macros: Vec<AnonymousMacro>,
    occurrences: FxHashMap<String, usize>,
    literal: Option<(String, Span)>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            current: 0,
            segments: Vec::new(),
            anonymous_macros: Vec::new(),
            occurrences: FxHashMap::default(),
            literal: None,
        }
    }

    pub fn parse(mut self) -> Result<ParsedTemplate, ParseError> {
        loop {
            let token = self.consume();

            match token {
                Token::Eof { .. } => break,
                Token::Text { content, span } => self.push_literal(&content, span),
                // A bare `|` outside an alternation is ordinary text.
                Token::AltSeparator { span } => self.push_literal("|", span),
                Token::AltOpen { span } => self.parse_alternation(span)?,
                Token::MacroRef { content, span } => {
                    let (name, variable) = Self::parse_macro_ref(&content, span)?;
                    self.push_macro_ref(name, variable, span);
                }
                Token::AltClose { span } => {
                    return Err(ParseError::UnmatchedClose {
                        delimiter: ')',
                        span,
                    })
                }
                Token::StrayMacroClose { span } => {
                    return Err(ParseError::UnmatchedClose {
                        delimiter: '}',
                        span,
                    })
                }
                Token::UnclosedMacroRef { span } => {
                    return Err(ParseError::UnterminatedMacroRef { span })
                }
                Token::DanglingEscape { span } => return Err(ParseError::DanglingEscape { span }),
            }
        }

        self.flush_literal();

        Ok(ParsedTemplate::new(
            self.source.to_string(),
            self.segments,
            self.anonymous_macros,
        ))
    }

    fn parse_alternation(&mut self, open: Span) -> Result<(), ParseError> {
        let mut alternatives = Vec::with_capacity(4);
        let mut current = String::new();

        let close = loop {
            match self.consume() {
                Token::Text { content, .. } => current.push_str(&content),
                Token::AltSeparator { .. } => alternatives.push(std::mem::take(&mut current)),
                Token::AltClose { span } => break span,
                Token::AltOpen { span } => return Err(ParseError::NestedAlternation { span }),
                Token::MacroRef { span, .. } | Token::UnclosedMacroRef { span } => {
                    return Err(ParseError::MacroInAlternation { span })
                }
                Token::StrayMacroClose { span } => {
                    return Err(ParseError::UnmatchedClose {
                        delimiter: '}',
                        span,
                    })
                }
                Token::DanglingEscape { span } => {
                    return Err(ParseError::DanglingEscape { span })
                }
                Token::Eof { span } => {
                    return Err(ParseError::UnterminatedAlternation {
                        span: open.cover(span),
                    })
                }
            }
        };
        alternatives.push(current);

        let span = open.cover(close);
        let anonymous = AnonymousMacro::new(self.anonymous_macros.len(), alternatives, span);
        let name = anonymous.name().to_string();
        self.anonymous_macros.push(anonymous);
        self.push_macro_ref(name, ANONYMOUS_VARIABLE.to_string(), span);

        Ok(())
    }

    fn parse_macro_ref(content: &str, span: Span) -> Result<(String, String), ParseError> {
        let mut parts = content.split(':');
        let (Some(name), Some(variable), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseError::MalformedMacroRef {
                content: content.to_string(),
                span,
            });
        };

        let name = name.trim();
        let variable = variable.trim();
        Self::validate_name("name", name, span)?;
        Self::validate_name("variable", variable, span)?;

        Ok((name.to_string(), variable.to_string()))
    }

    fn validate_name(kind: &'static str, name: &str, span: Span) -> Result<(), ParseError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if valid {
            Ok(())
        } else {
            Err(ParseError::InvalidName {
                kind,
                name: name.to_string(),
                span,
            })
        }
    }

    fn push_literal(&mut self, text: &str, span: Span) {
        match &mut self.literal {
            Some((buffer, buffer_span)) => {
                buffer.push_str(text);
                *buffer_span = buffer_span.cover(span);
            }
            None => self.literal = Some((text.to_string(), span)),
        }
    }

    fn flush_literal(&mut self) {
        if let Some((text, span)) = self.literal.take() {
            self.segments.push(Segment::Literal { text, span });
        }
    }

    fn push_macro_ref(&mut self, name: String, variable: String, span: Span) {
        self.flush_literal();

        let next = self.occurrences.entry(name.clone()).or_insert(0);
        let occurrence = *next;
        *next += 1;

        self.segments.push(Segment::MacroRef(MacroRef {
            name,
            variable,
            occurrence,
            span,
        }));
    }

    fn consume(&mut self) -> Token {
        let token = self.tokens.get(self.current).cloned().unwrap_or(Token::Eof {
            span: Span::from_bounds(self.source.len(), self.source.len()),
        });
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::ParseError;
    use crate::Segment;

    mod segments {
        use super::*;

        #[test]
        fn test_parse_literal_only() {
            let template = parse("what is the time").unwrap();
            insta::assert_snapshot!(template.to_string(), @r#""what is the time""#);
        }

        #[test]
        fn test_parse_macro_ref() {
            let template = parse("go to {loc:W}").unwrap();
            insta::assert_snapshot!(template.to_string(), @r#""go to " {loc:W#0}"#);
        }

        #[test]
        fn test_parse_trims_whitespace_in_braces() {
            let template = parse("{ loc : W }").unwrap();
            insta::assert_snapshot!(template.to_string(), @"{loc:W#0}");
        }

        #[test]
        fn test_parse_inline_alternation() {
            let template = parse("(a|b) c").unwrap();
            insta::assert_snapshot!(template.to_string(), @r#"{#0:W#0} " c""#);

            let anonymous = &template.anonymous_macros()[0];
            assert_eq!(anonymous.name(), "#0");
            assert_eq!(anonymous.alternatives(), ["a", "b"]);
        }

        #[test]
        fn test_parse_empty_alternative() {
            let template = parse("(please|) stop").unwrap();
            assert_eq!(template.anonymous_macros()[0].alternatives(), ["please", ""]);
        }

        #[test]
        fn test_parse_anonymous_macros_numbered_in_order() {
            let template = parse("(hi|hello) (there|you)").unwrap();
            insta::assert_snapshot!(template.to_string(), @r#"{#0:W#0} " " {#1:W#0}"#);
            assert_eq!(template.anonymous_macros()[1].alternatives(), ["there", "you"]);
        }

        #[test]
        fn test_parse_bare_separator_is_literal() {
            let template = parse("a | b").unwrap();
            insta::assert_snapshot!(template.to_string(), @r#""a | b""#);
        }

        #[test]
        fn test_parse_escaped_delimiters_are_literal() {
            let template = parse(r"say \(hi\) \{x\}").unwrap();
            insta::assert_snapshot!(template.to_string(), @r#""say (hi) {x}""#);
            assert!(template.anonymous_macros().is_empty());
        }

        #[test]
        fn test_parse_escaped_separator_inside_alternation() {
            let template = parse(r"(a\|b|c)").unwrap();
            assert_eq!(template.anonymous_macros()[0].alternatives(), ["a|b", "c"]);
        }

        #[test]
        fn test_literal_span_covers_escapes() {
            let template = parse(r"x\(y").unwrap();
            assert_eq!(template.segments()[0].span().length(), 4);
        }
    }

    mod occurrences {
        use super::*;

        #[test]
        fn test_repeated_macro_gets_increasing_indices() {
            let template = parse("{loc:W} then {loc:W}").unwrap();
            insta::assert_snapshot!(template.to_string(), @r#"{loc:W#0} " then " {loc:W#1}"#);
        }

        #[test]
        fn test_indices_are_per_name() {
            let template = parse("{a:X} {b:X} {a:Y} {b:X} {a:X}").unwrap();
            let indices: Vec<(&str, usize)> = template
                .macro_refs()
                .map(|r| (r.name.as_str(), r.occurrence))
                .collect();
            assert_eq!(
                indices,
                vec![("a", 0), ("b", 0), ("a", 1), ("b", 1), ("a", 2)]
            );
        }

        #[test]
        fn test_find_ref() {
            let template = parse("{loc:W} then {loc:W}").unwrap();
            let second = template.find_ref("loc", 1).unwrap();
            assert_eq!(second.span.start(), 13);
            assert!(template.find_ref("loc", 2).is_none());
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_unterminated_alternation() {
            let err = parse("go (home|work").unwrap_err();
            assert!(matches!(err, ParseError::UnterminatedAlternation { .. }));
            assert_eq!(err.span().start(), 3);
            assert_eq!(err.diagnostic_code(), "P100");
        }

        #[test]
        fn test_nested_alternation_rejected() {
            let err = parse("(a|(b|c))").unwrap_err();
            assert!(matches!(err, ParseError::NestedAlternation { .. }));
            assert_eq!(err.span().start(), 3);
        }

        #[test]
        fn test_macro_ref_inside_alternation_rejected() {
            let err = parse("(a|{loc:W})").unwrap_err();
            assert!(matches!(err, ParseError::MacroInAlternation { .. }));
        }

        #[test]
        fn test_stray_close_paren() {
            let err = parse("a) b").unwrap_err();
            assert_eq!(
                err,
                ParseError::UnmatchedClose {
                    delimiter: ')',
                    span: phrasegen_source::Span::new(1, 1),
                }
            );
        }

        #[test]
        fn test_stray_close_brace() {
            let err = parse("a} b").unwrap_err();
            assert!(matches!(
                err,
                ParseError::UnmatchedClose { delimiter: '}', .. }
            ));
        }

        #[test]
        fn test_unterminated_macro_ref() {
            let err = parse("go to {loc:W").unwrap_err();
            assert!(matches!(err, ParseError::UnterminatedMacroRef { .. }));
        }

        #[test]
        fn test_macro_ref_without_separator() {
            let err = parse("go to {loc}").unwrap_err();
            insta::assert_snapshot!(
                err.to_string(),
                @"syntax error in macro call `{loc}`, expected `{name:variable}`"
            );
        }

        #[test]
        fn test_macro_ref_with_two_separators() {
            let err = parse("{a:b:c}").unwrap_err();
            assert!(matches!(err, ParseError::MalformedMacroRef { .. }));
        }

        #[test]
        fn test_macro_ref_empty_variable() {
            let err = parse("{loc:}").unwrap_err();
            assert_eq!(
                err,
                ParseError::InvalidName {
                    kind: "variable",
                    name: String::new(),
                    span: phrasegen_source::Span::new(0, 6),
                }
            );
        }

        #[test]
        fn test_macro_ref_invalid_name() {
            let err = parse("{#0:W}").unwrap_err();
            assert!(matches!(err, ParseError::InvalidName { kind: "name", .. }));
        }

        #[test]
        fn test_dangling_escape() {
            let err = parse("oops\\").unwrap_err();
            assert!(matches!(err, ParseError::DanglingEscape { .. }));
        }
    }

    #[test]
    fn test_segments_are_literal_or_ref() {
        let template = parse("x {a:B} y").unwrap();
        let kinds: Vec<bool> = template
            .segments()
            .iter()
            .map(|s| matches!(s, Segment::Literal { .. }))
            .collect();
        assert_eq!(kinds, vec![true, false, true]);
    }
}
