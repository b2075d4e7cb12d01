use std::fmt;

use phrasegen_conf::MissingOccurrence;
use phrasegen_expand::Expansion;
use phrasegen_expand::Value;
use phrasegen_source::Span;

use crate::error::CodegenError;

const TSTART: &str = "tstart";
const TEND: &str = "tend";
const MVAR: &str = "mvar";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaceholderKind {
    Start,
    End,
    Var(String),
}

/// A `tstart`, `tend` or `mvar` call found in a code template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub name: String,
    pub occurrence: usize,
    pub span: Span,
}

impl Placeholder {
    fn from_args(keyword: &str, args: &[Arg], span: Span) -> Result<Self, CodegenError> {
        let (min, max) = if keyword == MVAR { (2, 3) } else { (1, 2) };
        if args.len() < min || args.len() > max {
            return Err(CodegenError::syntax(
                format!(
                    "`{keyword}` expects {min} or {max} arguments, found {}",
                    args.len()
                ),
                span,
            ));
        }

        let name = args[0].name(keyword, span)?;
        let occurrence = match args.get(min) {
            Some(arg) => arg.occurrence(keyword, span)?,
            None => 0,
        };
        let kind = match keyword {
            TSTART => PlaceholderKind::Start,
            TEND => PlaceholderKind::End,
            _ => PlaceholderKind::Var(args[1].name(keyword, span)?),
        };

        Ok(Self {
            kind,
            name,
            occurrence,
            span,
        })
    }

    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self.kind {
            PlaceholderKind::Start => TSTART,
            PlaceholderKind::End => TEND,
            PlaceholderKind::Var(_) => MVAR,
        }
    }

    fn resolve(
        &self,
        expansion: &Expansion,
        policy: MissingOccurrence,
    ) -> Result<String, CodegenError> {
        let resolved = match &self.kind {
            PlaceholderKind::Start => expansion
                .span(&self.name, self.occurrence)
                .map(|span| span.start.to_string()),
            PlaceholderKind::End => expansion
                .span(&self.name, self.occurrence)
                .map(|span| span.end.to_string()),
            PlaceholderKind::Var(variable) => expansion
                .variant(&self.name, self.occurrence)
                .and_then(|variant| variant.get(variable))
                .map(Value::to_string),
        };

        match (resolved, policy) {
            (Some(value), _) => Ok(value),
            (None, MissingOccurrence::Empty) => Ok(match self.kind {
                PlaceholderKind::Start | PlaceholderKind::End => "0".to_string(),
                PlaceholderKind::Var(_) => String::new(),
            }),
            (None, MissingOccurrence::Error) => Err(CodegenError::Unresolved {
                placeholder: self.keyword().to_string(),
                name: self.name.clone(),
                occurrence: self.occurrence,
                span: self.span,
            }),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PlaceholderKind::Start | PlaceholderKind::End => {
                write!(f, "{}({}, {})", self.keyword(), self.name, self.occurrence)
            }
            PlaceholderKind::Var(variable) => {
                write!(f, "mvar({}, {variable}, {})", self.name, self.occurrence)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece {
    Text(String),
    Placeholder(Placeholder),
}

/// A response-code template with its placeholders located.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeTemplate {
    source: String,
    pieces: Vec<Piece>,
}

impl CodeTemplate {
    pub fn parse(source: &str) -> Result<Self, CodegenError> {
        let pieces = Scanner::new(source).scan()?;
        Ok(Self {
            source: source.to_string(),
            pieces,
        })
    }

    /// A template whose text is emitted verbatim, never scanned for
    /// placeholders.
    #[must_use]
    pub fn literal(source: String) -> Self {
        Self {
            pieces: vec![Piece::Text(source.clone())],
            source,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Placeholder(placeholder) => Some(placeholder),
            Piece::Text(_) => None,
        })
    }

    /// Substitute every placeholder from `expansion`.
    pub fn generate(
        &self,
        expansion: &Expansion,
        policy: MissingOccurrence,
    ) -> Result<String, CodegenError> {
        let mut code = String::with_capacity(self.source.len());
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => code.push_str(text),
                Piece::Placeholder(placeholder) => {
                    code.push_str(&placeholder.resolve(expansion, policy)?);
                }
            }
        }
        Ok(code)
    }
}

/// One call argument; `quoted` arguments had their quotes stripped.
struct Arg {
    text: String,
    quoted: bool,
}

impl Arg {
    fn name(&self, keyword: &str, span: Span) -> Result<String, CodegenError> {
        let valid = !self.text.is_empty()
            && (self.quoted
                || !self
                    .text
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, '"' | '\'')));
        if valid {
            Ok(self.text.clone())
        } else {
            Err(CodegenError::syntax(
                format!("invalid name `{}` in `{keyword}`", self.text),
                span,
            ))
        }
    }

    fn occurrence(&self, keyword: &str, span: Span) -> Result<usize, CodegenError> {
        if self.quoted {
            return Err(CodegenError::syntax(
                format!("occurrence in `{keyword}` must be a number, found `{}`", self.text),
                span,
            ));
        }
        self.text.parse().map_err(|_| {
            CodegenError::syntax(
                format!("occurrence in `{keyword}` must be a number, found `{}`", self.text),
                span,
            )
        })
    }
}

struct Scanner<'a> {
    source: &'a str,
    current: usize,
    text_start: usize,
    pieces: Vec<Piece>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            current: 0,
            text_start: 0,
            pieces: Vec::new(),
        }
    }

    fn scan(mut self) -> Result<Vec<Piece>, CodegenError> {
        while let Some(c) = self.peek() {
            if is_ident_start(c) && !self.follows_ident() {
                self.scan_word()?;
            } else {
                self.current += c.len_utf8();
            }
        }

        self.flush_text(self.source.len());
        Ok(self.pieces)
    }

    fn scan_word(&mut self) -> Result<(), CodegenError> {
        let source = self.source;
        let start = self.current;
        while let Some(c) = self.peek().filter(|c| is_ident_char(*c)) {
            self.current += c.len_utf8();
        }
        let keyword = &source[start..self.current];
        if !matches!(keyword, TSTART | TEND | MVAR) {
            return Ok(());
        }

        let rest = &source[self.current..];
        let open = self.current + (rest.len() - rest.trim_start().len());
        if !source[open..].starts_with('(') {
            return Ok(());
        }

        let (args, close) = self.scan_args(start, open + 1)?;
        let span = Span::from_bounds(start, close);
        let placeholder = Placeholder::from_args(keyword, &args, span)?;

        self.flush_text(start);
        self.pieces.push(Piece::Placeholder(placeholder));
        self.current = close;
        self.text_start = close;
        Ok(())
    }

    /// Collect comma separated arguments up to the closing `)`. Returns them
    /// with the offset just past the parenthesis.
    fn scan_args(&self, start: usize, from: usize) -> Result<(Vec<Arg>, usize), CodegenError> {
        let mut args = Vec::new();
        let mut raw = String::new();
        let mut quote: Option<char> = None;

        for (offset, c) in self.source[from..].char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => {
                    quote = None;
                    raw.push(c);
                }
                (Some(_), c) => raw.push(c),
                (None, '"' | '\'') => {
                    quote = Some(c);
                    raw.push(c);
                }
                (None, ',') => args.push(Self::arg(&std::mem::take(&mut raw))),
                (None, ')') => {
                    if !(args.is_empty() && raw.trim().is_empty()) {
                        args.push(Self::arg(&raw));
                    }
                    return Ok((args, from + offset + 1));
                }
                (None, '(') => {
                    return Err(CodegenError::syntax(
                        "placeholder arguments cannot contain calls",
                        Span::from_bounds(start, from + offset + 1),
                    ));
                }
                (None, c) => raw.push(c),
            }
        }

        Err(CodegenError::syntax(
            "unterminated placeholder call",
            Span::from_bounds(start, self.source.len()),
        ))
    }

    fn arg(raw: &str) -> Arg {
        let trimmed = raw.trim();
        let quoted = trimmed.len() >= 2
            && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
                || (trimmed.starts_with('\'') && trimmed.ends_with('\'')));
        if quoted {
            Arg {
                text: trimmed[1..trimmed.len() - 1].to_string(),
                quoted: true,
            }
        } else {
            Arg {
                text: trimmed.to_string(),
                quoted: false,
            }
        }
    }

    fn flush_text(&mut self, end: usize) {
        if self.text_start < end {
            self.pieces
                .push(Piece::Text(self.source[self.text_start..end].to_string()));
        }
    }

    fn follows_ident(&self) -> bool {
        self.source[..self.current]
            .chars()
            .next_back()
            .is_some_and(is_ident_char)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
