use std::sync::Arc;

use phrasegen_templates::MacroRef;
use phrasegen_templates::ParsedTemplate;
use phrasegen_templates::Segment;
use phrasegen_templates::ANONYMOUS_VARIABLE;
use phrasegen_templates::EMPTY_MACRO;
use rustc_hash::FxHashMap;

use crate::error::ExpandError;
use crate::expansion::Expansion;
use crate::expansion::OccurrenceKey;
use crate::expansion::TokenSpan;
use crate::registry::MacroRegistry;
use crate::token_cache::TokenCache;
use crate::variant::Value;
use crate::variant::Variant;

/// Expand `template` with no expansion limit.
pub fn expand(
    template: &ParsedTemplate,
    language: &str,
    registry: &MacroRegistry,
    tokens: &mut TokenCache,
) -> Result<Vec<Expansion>, ExpandError> {
    Expander::new(registry, tokens).expand(template, language)
}

pub struct Expander<'a> {
    registry: &'a MacroRegistry,
    tokens: &'a mut TokenCache,
    limit: Option<usize>,
}

/// A branch of the enumeration. Owned outright; fan-out clones it.
#[derive(Clone, Default)]
struct PartialExpansion {
    cursor: usize,
    built: Expansion,
}

impl<'a> Expander<'a> {
    #[must_use]
    pub fn new(registry: &'a MacroRegistry, tokens: &'a mut TokenCache) -> Self {
        Self {
            registry,
            tokens,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Enumerate every concrete utterance of `template`.
    ///
    /// The returned expansions form a set; their order follows variant
    /// registration order but callers must not depend on it.
    pub fn expand(
        &mut self,
        template: &ParsedTemplate,
        language: &str,
    ) -> Result<Vec<Expansion>, ExpandError> {
        tracing::debug!("Expanding macros of [{}] {:?}", language, template.source());

        let local = local_macros(template);
        let segments = template.segments();

        let mut done = Vec::new();
        let mut todo = vec![PartialExpansion::default()];

        while let Some(mut state) = todo.pop() {
            let Some(segment) = segments.get(state.cursor) else {
                if let Some(limit) = self.limit.filter(|limit| done.len() >= *limit) {
                    return Err(ExpandError::TooManyExpansions { limit });
                }
                done.push(state.built);
                continue;
            };
            state.cursor += 1;

            match segment {
                Segment::Literal { text, .. } => {
                    let tokens = self.tokens.tokens(language, text);
                    state.built.tokens.extend(tokens.iter().cloned());
                    todo.push(state);
                }
                Segment::MacroRef(macro_ref) if macro_ref.name == EMPTY_MACRO => {
                    todo.push(state);
                }
                Segment::MacroRef(macro_ref) => {
                    let variants = self.resolve(&local, language, macro_ref)?;

                    // Reverse so the first registered variant is popped first.
                    for variant in variants.iter().rev() {
                        let successor = self.branch(&state, language, macro_ref, variant)?;
                        todo.push(successor);
                    }
                }
            }
        }

        tracing::debug!("Expanded {:?} into {} utterances", template.source(), done.len());

        Ok(done)
    }

    fn resolve(
        &self,
        local: &FxHashMap<&str, Vec<Arc<Variant>>>,
        language: &str,
        macro_ref: &MacroRef,
    ) -> Result<Vec<Arc<Variant>>, ExpandError> {
        let variants = match self.registry.lookup(language, &macro_ref.name) {
            Some(registered) => registered
                .iter()
                .map(|r| Arc::clone(r.variant()))
                .collect(),
            None => local
                .get(macro_ref.name.as_str())
                .cloned()
                .unwrap_or_default(),
        };

        if variants.is_empty() {
            return Err(ExpandError::UnknownMacro {
                name: macro_ref.name.clone(),
                language: language.to_string(),
                span: macro_ref.span,
            });
        }

        Ok(variants)
    }

    /// Successor state for one variant choice, built on a copy of `state`.
    fn branch(
        &mut self,
        state: &PartialExpansion,
        language: &str,
        macro_ref: &MacroRef,
        variant: &Arc<Variant>,
    ) -> Result<PartialExpansion, ExpandError> {
        let value = variant
            .get(&macro_ref.variable)
            .ok_or_else(|| ExpandError::MissingVariable {
                name: macro_ref.name.clone(),
                variable: macro_ref.variable.clone(),
                occurrence: macro_ref.occurrence,
                span: macro_ref.span,
            })?;

        let mut successor = state.clone();
        let key = OccurrenceKey::new(macro_ref.name.as_str(), macro_ref.occurrence);

        let start = successor.built.tokens.len();
        match value {
            Value::Text(text) => {
                let tokens = self.tokens.tokens(language, text);
                successor.built.tokens.extend(tokens.iter().cloned());
            }
            Value::Tokens(tokens) => successor.built.tokens.extend(tokens.iter().cloned()),
        }
        let end = successor.built.tokens.len();

        successor
            .built
            .positions
            .insert(key.clone(), TokenSpan { start, end });
        successor.built.bindings.insert(key, Arc::clone(variant));

        Ok(successor)
    }
}

fn local_macros(template: &ParsedTemplate) -> FxHashMap<&str, Vec<Arc<Variant>>> {
    template
        .anonymous_macros()
        .iter()
        .map(|anonymous| {
            let variants = anonymous
                .alternatives()
                .iter()
                .map(|alternative| {
                    Arc::new(Variant::new().with(ANONYMOUS_VARIABLE, alternative.as_str()))
                })
                .collect();
            (anonymous.name(), variants)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    use itertools::Itertools;
    use phrasegen_templates::parse;
    use phrasegen_templates::DefaultTokenizer;
    use phrasegen_templates::Tokenizer;

    use super::*;

    fn registry_with_locations() -> MacroRegistry {
        let mut registry = MacroRegistry::new();
        registry.register("m", "en", "loc", Variant::new().with("W", "home"));
        registry.register("m", "en", "loc", Variant::new().with("W", "work"));
        registry
    }

    fn expand_texts(source: &str, registry: &MacroRegistry) -> Vec<String> {
        let template = parse(source).unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        expand(&template, "en", registry, &mut tokens)
            .unwrap()
            .iter()
            .map(Expansion::text)
            .sorted()
            .collect()
    }

    /// Counts tokenizer calls through a shared cell.
    struct CountingTokenizer(Rc<Cell<usize>>);

    impl Tokenizer for CountingTokenizer {
        fn tokenize(&self, text: &str, language: &str) -> Vec<String> {
            self.0.set(self.0.get() + 1);
            DefaultTokenizer::default().tokenize(text, language)
        }
    }

    #[test]
    fn test_literal_template_has_one_expansion() {
        let texts = expand_texts("What is the Time", &MacroRegistry::new());
        assert_eq!(texts, vec!["what is the time"]);
    }

    #[test]
    fn test_inline_alternation() {
        let texts = expand_texts("(a|b) c", &MacroRegistry::new());
        assert_eq!(texts, vec!["a c", "b c"]);
    }

    #[test]
    fn test_empty_alternative_contributes_no_tokens() {
        let texts = expand_texts("(please|) stop", &MacroRegistry::new());
        assert_eq!(texts, vec!["please stop", "stop"]);
    }

    #[test]
    fn test_registered_macro_positions_and_bindings() {
        let registry = registry_with_locations();
        let template = parse("go to {loc:W} now").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        let expansions = expand(&template, "en", &registry, &mut tokens).unwrap();

        assert_eq!(expansions.len(), 2);
        for expansion in &expansions {
            let span = expansion.span("loc", 0).unwrap();
            assert_eq!(span, TokenSpan { start: 2, end: 3 });
            let chosen = expansion.variant("loc", 0).unwrap();
            assert_eq!(
                chosen.get("W").unwrap().to_string(),
                expansion.tokens()[span.start]
            );
        }
        insta::assert_snapshot!(
            expansions.iter().map(Expansion::text).join("\n"),
            @r"
        go to home now
        go to work now
        "
        );
    }

    #[test]
    fn test_expansions_follow_registration_order() {
        let registry = registry_with_locations();
        let template = parse("{loc:W}").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        let texts: Vec<String> = expand(&template, "en", &registry, &mut tokens)
            .unwrap()
            .iter()
            .map(Expansion::text)
            .collect();
        assert_eq!(texts, vec!["home", "work"]);
    }

    #[test]
    fn test_repeated_occurrences_range_independently() {
        let registry = registry_with_locations();
        let template = parse("from {loc:W} to {loc:W}").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        let expansions = expand(&template, "en", &registry, &mut tokens).unwrap();

        assert_eq!(expansions.len(), 4);
        for expansion in &expansions {
            let first = expansion.span("loc", 0).unwrap();
            let second = expansion.span("loc", 1).unwrap();
            assert!(first.end <= second.start);
        }

        let texts: BTreeSet<String> = expansions.iter().map(Expansion::text).collect();
        assert!(texts.contains("from home to home"));
        assert!(texts.contains("from home to work"));
        assert!(texts.contains("from work to home"));
        assert!(texts.contains("from work to work"));
    }

    #[test]
    fn test_count_is_product_of_variant_counts() {
        let mut registry = registry_with_locations();
        for when in ["today", "tomorrow", "next week"] {
            registry.register("m", "en", "when", Variant::new().with("W", when));
        }
        let texts = expand_texts("(go|drive) to {loc:W} {when:W}", &registry);
        assert_eq!(texts.len(), 2 * 2 * 3);
        assert_eq!(texts.iter().unique().count(), texts.len());
    }

    #[test]
    fn test_multi_token_value_span() {
        let mut registry = MacroRegistry::new();
        registry.register("m", "en", "city", Variant::new().with("W", "New York"));
        let template = parse("fly to {city:W} today").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        let expansions = expand(&template, "en", &registry, &mut tokens).unwrap();

        let expansion = &expansions[0];
        assert_eq!(expansion.span("city", 0), Some(TokenSpan { start: 2, end: 4 }));
        assert_eq!(expansion.text(), "fly to new york today");
    }

    #[test]
    fn test_pretokenized_value_is_used_verbatim() {
        let mut registry = MacroRegistry::new();
        registry.register(
            "m",
            "en",
            "unit",
            Variant::new().with("W", vec!["Km/H".to_string()]),
        );
        let texts = expand_texts("speed in {unit:W}", &registry);
        assert_eq!(texts, vec!["speed in Km/H"]);
    }

    #[test]
    fn test_empty_macro_contributes_nothing() {
        let texts = expand_texts("stop {empty:W} now", &MacroRegistry::new());
        assert_eq!(texts, vec!["stop now"]);
    }

    #[test]
    fn test_anonymous_and_registered_macros_combine() {
        let registry = registry_with_locations();
        let texts = expand_texts("(to|at) {loc:W}", &registry);
        assert_eq!(texts, vec!["at home", "at work", "to home", "to work"]);
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let registry = registry_with_locations();
        let template = parse("(hi|hello) {loc:W} (a|b)").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        let first = expand(&template, "en", &registry, &mut tokens).unwrap();
        let second = expand(&template, "en", &registry, &mut tokens).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_macro() {
        let template = parse("go to {nowhere:W}").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        let err = expand(&template, "en", &MacroRegistry::new(), &mut tokens).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r#"unknown macro "nowhere"[en] called"#);
        assert_eq!(err.span().map(|span| span.start()), Some(6));
        assert_eq!(err.diagnostic_code(), "E100");
    }

    #[test]
    fn test_macro_in_other_language_is_unknown() {
        let registry = registry_with_locations();
        let template = parse("{loc:W}").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        let err = expand(&template, "de", &registry, &mut tokens).unwrap_err();
        assert!(matches!(err, ExpandError::UnknownMacro { .. }));
    }

    #[test]
    fn test_missing_variable() {
        let registry = registry_with_locations();
        let template = parse("{loc:X}").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());
        let err = expand(&template, "en", &registry, &mut tokens).unwrap_err();
        assert_eq!(
            err,
            ExpandError::MissingVariable {
                name: "loc".to_string(),
                variable: "X".to_string(),
                occurrence: 0,
                span: phrasegen_source::Span::new(0, 7),
            }
        );
    }

    #[test]
    fn test_limit() {
        let registry = registry_with_locations();
        let template = parse("{loc:W} {loc:W} {loc:W}").unwrap();
        let mut tokens = TokenCache::new(DefaultTokenizer::default());

        let err = Expander::new(&registry, &mut tokens)
            .with_limit(Some(5))
            .expand(&template, "en")
            .unwrap_err();
        assert_eq!(err, ExpandError::TooManyExpansions { limit: 5 });

        let expansions = Expander::new(&registry, &mut tokens)
            .with_limit(Some(8))
            .expand(&template, "en")
            .unwrap();
        assert_eq!(expansions.len(), 8);
    }

    #[test]
    fn test_text_is_tokenized_once() {
        let calls = Rc::new(Cell::new(0));
        let mut tokens = TokenCache::new(CountingTokenizer(Rc::clone(&calls)));
        let registry = registry_with_locations();
        let template = parse("{loc:W} and {loc:W}").unwrap();

        expand(&template, "en", &registry, &mut tokens).unwrap();
        // " and " plus "home" and "work".
        assert_eq!(calls.get(), 3);

        expand(&template, "en", &registry, &mut tokens).unwrap();
        assert_eq!(calls.get(), 3);
    }
}
