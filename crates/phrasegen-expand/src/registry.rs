use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::variant::Variant;

/// A variant together with the module that registered it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredVariant {
    module: String,
    variant: Arc<Variant>,
}

impl RegisteredVariant {
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn variant(&self) -> &Arc<Variant> {
        &self.variant
    }
}

/// Named macros, scoped by language.
///
/// Variants keep registration order across modules so expansion order is
/// reproducible when reading debug logs.
#[derive(Debug, Default)]
pub struct MacroRegistry {
    languages: FxHashMap<String, FxHashMap<String, Vec<RegisteredVariant>>>,
}

impl MacroRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variant to `(language, name)`, creating the macro if needed.
    pub fn register(&mut self, module: &str, language: &str, name: &str, variant: Variant) {
        tracing::trace!("Registering macro {}[{}] for module {}", name, language, module);

        self.languages
            .entry(language.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default()
            .push(RegisteredVariant {
                module: module.to_string(),
                variant: Arc::new(variant),
            });
    }

    /// Variants of `(language, name)` in registration order.
    #[must_use]
    pub fn lookup(&self, language: &str, name: &str) -> Option<&[RegisteredVariant]> {
        self.languages
            .get(language)
            .and_then(|macros| macros.get(name))
            .map(Vec::as_slice)
            .filter(|variants| !variants.is_empty())
    }

    #[must_use]
    pub fn contains(&self, language: &str, name: &str) -> bool {
        self.lookup(language, name).is_some()
    }

    /// Drop every variant registered by `module`. Macros left without
    /// variants disappear.
    pub fn clear_module(&mut self, module: &str) {
        let mut removed = 0_usize;

        for macros in self.languages.values_mut() {
            for variants in macros.values_mut() {
                let before = variants.len();
                variants.retain(|registered| registered.module != module);
                removed += before - variants.len();
            }
            macros.retain(|_, variants| !variants.is_empty());
        }
        self.languages.retain(|_, macros| !macros.is_empty());

        tracing::debug!("Cleared {} macro variants of module {}", removed, module);
    }

    /// Names of the macros defined for `language`, sorted.
    #[must_use]
    pub fn macro_names(&self, language: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .languages
            .get(language)
            .map(|macros| macros.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Total number of registered variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.languages
            .values()
            .flat_map(|macros| macros.values())
            .map(Vec::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(word: &str) -> Variant {
        Variant::new().with("W", word)
    }

    #[test]
    fn test_lookup_keeps_registration_order() {
        let mut registry = MacroRegistry::new();
        registry.register("nav", "en", "loc", place("home"));
        registry.register("nav", "en", "loc", place("work"));
        registry.register("travel", "en", "loc", place("airport"));

        let words: Vec<String> = registry
            .lookup("en", "loc")
            .unwrap()
            .iter()
            .map(|r| r.variant().get("W").unwrap().to_string())
            .collect();
        assert_eq!(words, vec!["home", "work", "airport"]);
    }

    #[test]
    fn test_lookup_is_language_scoped() {
        let mut registry = MacroRegistry::new();
        registry.register("nav", "en", "loc", place("home"));
        registry.register("nav", "de", "loc", place("zuhause"));

        assert_eq!(registry.lookup("en", "loc").unwrap().len(), 1);
        assert_eq!(registry.lookup("de", "loc").unwrap()[0].module(), "nav");
        assert!(registry.lookup("fr", "loc").is_none());
        assert!(registry.lookup("en", "nope").is_none());
    }

    #[test]
    fn test_clear_module_only_drops_that_module() {
        let mut registry = MacroRegistry::new();
        registry.register("nav", "en", "loc", place("home"));
        registry.register("travel", "en", "loc", place("airport"));
        registry.register("travel", "en", "vehicle", place("train"));

        registry.clear_module("travel");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("en", "loc").unwrap().len(), 1);
        assert!(!registry.contains("en", "vehicle"));
        assert_eq!(registry.macro_names("en"), vec!["loc"]);
    }

    #[test]
    fn test_clear_everything_leaves_empty_registry() {
        let mut registry = MacroRegistry::new();
        registry.register("nav", "en", "loc", place("home"));
        registry.clear_module("nav");
        assert!(registry.is_empty());
        assert!(registry.macro_names("en").is_empty());
    }
}
