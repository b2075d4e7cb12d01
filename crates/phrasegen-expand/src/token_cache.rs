use std::fmt;
use std::sync::Arc;

use phrasegen_templates::Tokenizer;
use rustc_hash::FxHashMap;

/// Memo table of tokenized text keyed by `(language, raw text)`.
///
/// Variants are never rewritten with their tokenized form; repeated use of
/// the same text is served from here instead.
pub struct TokenCache {
    tokenizer: Box<dyn Tokenizer>,
    memo: FxHashMap<String, FxHashMap<String, Arc<[String]>>>,
    tokenized: usize,
}

impl TokenCache {
    #[must_use]
    pub fn new(tokenizer: impl Tokenizer + 'static) -> Self {
        Self {
            tokenizer: Box::new(tokenizer),
            memo: FxHashMap::default(),
            tokenized: 0,
        }
    }

    pub fn tokens(&mut self, language: &str, text: &str) -> Arc<[String]> {
        if let Some(tokens) = self.memo.get(language).and_then(|by_text| by_text.get(text)) {
            return Arc::clone(tokens);
        }

        let tokens: Arc<[String]> = self.tokenizer.tokenize(text, language).into();
        self.tokenized += 1;
        self.memo
            .entry(language.to_string())
            .or_default()
            .insert(text.to_string(), Arc::clone(&tokens));
        tokens
    }

    /// Number of times the underlying tokenizer actually ran.
    #[must_use]
    pub fn tokenized(&self) -> usize {
        self.tokenized
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("languages", &self.memo.len())
            .field("tokenized", &self.tokenized)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use phrasegen_templates::DefaultTokenizer;

    use super::*;

    #[test]
    fn test_memoizes_per_language_and_text() {
        let mut cache = TokenCache::new(DefaultTokenizer::default());

        let first = cache.tokens("en", "Go Home");
        let second = cache.tokens("en", "Go Home");
        assert_eq!(&*first, ["go", "home"]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.tokenized(), 1);

        cache.tokens("de", "Go Home");
        assert_eq!(cache.tokenized(), 2);
    }

    #[test]
    fn test_clear_forces_retokenization() {
        let mut cache = TokenCache::new(DefaultTokenizer::default());
        cache.tokens("en", "x");
        cache.clear();
        cache.tokens("en", "x");
        assert_eq!(cache.tokenized(), 2);
    }
}
