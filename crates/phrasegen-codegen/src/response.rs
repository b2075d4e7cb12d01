use crate::error::CodegenError;
use crate::template::CodeTemplate;

/// Function name of generated canned-reply code.
pub const RESPONSE_FUNCTION: &str = "_resp";

/// What an authoring call answers with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// A code template defining `function`.
    Code { function: String, text: String },
    /// Fixed replies, one `c.resp(...)` call each.
    Say(Vec<String>),
}

impl Response {
    /// Code response; `text` is unindented so it can be authored inline.
    #[must_use]
    pub fn code(function: impl Into<String>, text: &str) -> Self {
        Response::Code {
            function: function.into(),
            text: unindent(text),
        }
    }

    #[must_use]
    pub fn say(line: impl Into<String>) -> Self {
        Response::Say(vec![line.into()])
    }

    #[must_use]
    pub fn function(&self) -> &str {
        match self {
            Response::Code { function, .. } => function,
            Response::Say(_) => RESPONSE_FUNCTION,
        }
    }

    /// The code template text before placeholder substitution.
    #[must_use]
    pub fn source(&self) -> String {
        match self {
            Response::Code { text, .. } => text.clone(),
            Response::Say(lines) => {
                let mut source = format!("def {RESPONSE_FUNCTION}(c):\n");
                for line in lines {
                    source.push_str("    c.resp(\"");
                    for c in line.chars() {
                        if matches!(c, '"' | '\\') {
                            source.push('\\');
                        }
                        source.push(c);
                    }
                    source.push_str("\", 0.0, [])\n");
                }
                source
            }
        }
    }

    /// Canned replies are taken literally; only code responses carry
    /// placeholders.
    pub fn template(&self) -> Result<CodeTemplate, CodegenError> {
        match self {
            Response::Code { text, .. } => CodeTemplate::parse(text),
            Response::Say(_) => Ok(CodeTemplate::literal(self.source())),
        }
    }
}

impl From<&str> for Response {
    fn from(line: &str) -> Self {
        Response::say(line)
    }
}

impl From<Vec<String>> for Response {
    fn from(lines: Vec<String>) -> Self {
        Response::Say(lines)
    }
}

/// Remove the indentation of the first non-blank line from every non-blank
/// line. Lines indented less than that lose only their leading whitespace.
#[must_use]
pub fn unindent(code: &str) -> String {
    let indent = code
        .lines()
        .find(|line| !line.trim().is_empty())
        .map_or(0, |line| line.len() - line.trim_start().len());
    if indent == 0 {
        return code.to_string();
    }

    code.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                return line;
            }
            let strip = line
                .char_indices()
                .take_while(|(i, c)| *i < indent && c.is_whitespace())
                .map(|(i, c)| i + c.len_utf8())
                .last()
                .unwrap_or(0);
            &line[strip..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}
