//! Template parsing for utterance generation.
//!
//! A template mixes literal text with macro references (`{name:var}`) and
//! inline alternations (`(a|b|c)`). Parsing happens in two stages:
//!
//! 1. **Lexing**: template text is split into literal runs, delimiters and
//!    raw macro references, with backslash escapes resolved.
//! 2. **Parsing**: tokens become an ordered list of [`Segment`]s. Each inline
//!    alternation is desugared into a template-local [`AnonymousMacro`] and a
//!    reference to it, and every macro reference receives its occurrence index.
//!
//! ```
//! use phrasegen_templates::parse;
//!
//! let template = parse("(turn|switch) on the {device:W}").unwrap();
//! assert_eq!(template.segments().len(), 3);
//! assert_eq!(template.anonymous_macros()[0].alternatives(), ["turn", "switch"]);
//! ```

mod error;
mod lexer;
mod parser;
mod segment;
mod tokenizer;
mod tokens;

pub use error::ParseError;
pub use lexer::Lexer;
pub use parser::Parser;
pub use segment::AnonymousMacro;
pub use segment::MacroRef;
pub use segment::ParsedTemplate;
pub use segment::Segment;
pub use segment::ANONYMOUS_VARIABLE;
pub use segment::EMPTY_MACRO;
pub use tokenizer::DefaultTokenizer;
pub use tokenizer::Tokenizer;

/// Lex and parse a raw template.
pub fn parse(source: &str) -> Result<ParsedTemplate, ParseError> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(source, tokens).parse()
}
