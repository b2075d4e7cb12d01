use phrasegen_source::Span;

use crate::tokens::Token;
use crate::tokens::ALT_CLOSE;
use crate::tokens::ALT_OPEN;
use crate::tokens::ALT_SEPARATOR;
use crate::tokens::ESCAPABLE;
use crate::tokens::ESCAPE;
use crate::tokens::MACRO_CLOSE;
use crate::tokens::MACRO_OPEN;

pub struct Lexer<'a> {
    source: &'a str,
    start: usize,
    current: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            start: 0,
            current: 0,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.start = self.current;

            let token = match self.peek() {
                ALT_OPEN => self.lex_delimiter(|span| Token::AltOpen { span }),
                ALT_CLOSE => self.lex_delimiter(|span| Token::AltClose { span }),
                ALT_SEPARATOR => self.lex_delimiter(|span| Token::AltSeparator { span }),
                MACRO_CLOSE => self.lex_delimiter(|span| Token::StrayMacroClose { span }),
                MACRO_OPEN => self.lex_macro_ref(),
                _ => self.lex_text(),
            };

            tokens.push(token);
        }

        tokens.push(Token::Eof {
            span: Span::from_bounds(self.current, self.current),
        });

        tokens
    }

    fn lex_delimiter(&mut self, token_fn: impl FnOnce(Span) -> Token) -> Token {
        self.consume();
        token_fn(self.span())
    }

    fn lex_macro_ref(&mut self) -> Token {
        self.consume(); // {

        let content_start = self.current;
        while !self.is_at_end() && self.peek() != MACRO_CLOSE {
            self.consume();
        }

        if self.is_at_end() {
            return Token::UnclosedMacroRef { span: self.span() };
        }

        let content = self.source[content_start..self.current].to_string();
        self.consume(); // }

        Token::MacroRef {
            content,
            span: self.span(),
        }
    }

    fn lex_text(&mut self) -> Token {
        let mut content = String::new();

        while !self.is_at_end() {
            let c = self.peek();
            if matches!(c, ALT_OPEN | ALT_CLOSE | ALT_SEPARATOR | MACRO_OPEN | MACRO_CLOSE) {
                break;
            }

            if c == ESCAPE {
                let next = self.peek_next();
                if next == '\0' {
                    if content.is_empty() {
                        self.consume();
                        return Token::DanglingEscape { span: self.span() };
                    }
                    // Emit the text first; the backslash is lexed on its own next round.
                    break;
                }
                self.consume();
                if ESCAPABLE.contains(&next) {
                    content.push(next);
                    self.consume();
                } else {
                    content.push(ESCAPE);
                }
                continue;
            }

            content.push(c);
            self.consume();
        }

        Token::Text {
            content,
            span: self.span(),
        }
    }

    fn span(&self) -> Span {
        Span::from_bounds(self.start, self.current)
    }

    #[inline]
    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    #[inline]
    fn consume(&mut self) {
        if let Some(ch) = self.source[self.current..].chars().next() {
            self.current += ch.len_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize()
    }

    #[test]
    fn test_tokenize_plain_text() {
        let tokens = lex("what time is it");
        assert_eq!(
            tokens,
            vec![
                Token::Text {
                    content: "what time is it".to_string(),
                    span: Span::new(0, 15),
                },
                Token::Eof {
                    span: Span::new(15, 0),
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_alternation() {
        let tokens = lex("(a|bc) d");
        assert_eq!(
            tokens,
            vec![
                Token::AltOpen {
                    span: Span::new(0, 1)
                },
                Token::Text {
                    content: "a".to_string(),
                    span: Span::new(1, 1),
                },
                Token::AltSeparator {
                    span: Span::new(2, 1)
                },
                Token::Text {
                    content: "bc".to_string(),
                    span: Span::new(3, 2),
                },
                Token::AltClose {
                    span: Span::new(5, 1)
                },
                Token::Text {
                    content: " d".to_string(),
                    span: Span::new(6, 2),
                },
                Token::Eof {
                    span: Span::new(8, 0)
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_macro_ref() {
        let tokens = lex("go to {loc:W}");
        assert_eq!(
            tokens[1],
            Token::MacroRef {
                content: "loc:W".to_string(),
                span: Span::new(6, 7),
            }
        );
    }

    #[test]
    fn test_tokenize_unclosed_macro_ref() {
        let tokens = lex("go to {loc:W");
        assert_eq!(
            tokens[1],
            Token::UnclosedMacroRef {
                span: Span::new(6, 6)
            }
        );
    }

    #[test]
    fn test_tokenize_escapes() {
        let tokens = lex(r"a \(b\) \| c\\d \x");
        assert_eq!(
            tokens[0],
            Token::Text {
                content: r"a (b) | c\d \x".to_string(),
                span: Span::new(0, 18),
            }
        );
        assert!(matches!(tokens[1], Token::Eof { .. }));
    }

    #[test]
    fn test_tokenize_dangling_escape() {
        let tokens = lex("abc\\");
        assert_eq!(
            tokens[0],
            Token::Text {
                content: "abc".to_string(),
                span: Span::new(0, 3),
            }
        );
        assert_eq!(
            tokens[1],
            Token::DanglingEscape {
                span: Span::new(3, 1)
            }
        );
    }

    #[test]
    fn test_tokenize_multibyte_text() {
        let tokens = lex("größe {x:W}");
        assert_eq!(
            tokens[0],
            Token::Text {
                content: "größe ".to_string(),
                span: Span::new(0, 8),
            }
        );
    }
}
