/// Splits utterance text into tokens for a language.
///
/// Implementations must be pure: the same `(text, language)` always yields the
/// same tokens, which is what lets the expansion engine memoize them.
pub trait Tokenizer {
    fn tokenize(&self, text: &str, language: &str) -> Vec<String>;
}

/// Lowercasing word tokenizer.
///
/// Words are runs of alphanumeric characters; an apostrophe or hyphen between
/// two word characters stays inside the word (`don't`, `wi-fi`). Any other
/// punctuation ends the current word and is either dropped or, with
/// `keep_punctuation`, emitted as a token of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokenizer {
    keep_punctuation: bool,
}

impl DefaultTokenizer {
    #[must_use]
    pub fn new(keep_punctuation: bool) -> Self {
        Self { keep_punctuation }
    }
}

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, text: &str, _language: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut chars = text.chars().flat_map(char::to_lowercase).peekable();

        while let Some(c) = chars.next() {
            if c.is_alphanumeric() {
                word.push(c);
                continue;
            }

            let joins_word = matches!(c, '\'' | '-')
                && !word.is_empty()
                && chars.peek().is_some_and(|next| next.is_alphanumeric());
            if joins_word {
                word.push(c);
                continue;
            }

            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }

            if self.keep_punctuation && !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        }

        if !word.is_empty() {
            tokens.push(word);
        }

        tokens
    }
}
