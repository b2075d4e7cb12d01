use camino::Utf8PathBuf;
use itertools::Itertools;
use phrasegen_codegen::CodeCache;
use phrasegen_codegen::CodeTemplate;
use phrasegen_codegen::Response;
use phrasegen_conf::Settings;
use phrasegen_expand::Expander;
use phrasegen_expand::MacroRegistry;
use phrasegen_expand::TokenCache;
use phrasegen_expand::Variant;
use phrasegen_source::DiagnosticRenderer;
use phrasegen_source::SourceLocation;
use phrasegen_store::CodeRecord;
use phrasegen_store::JsonStore;
use phrasegen_store::MacroRecord;
use phrasegen_store::ModuleBatch;
use phrasegen_store::Store;
use phrasegen_store::TestCaseRecord;
use phrasegen_store::TestRound;
use phrasegen_store::TrainingRecord;
use phrasegen_templates::DefaultTokenizer;
use phrasegen_templates::ParsedTemplate;
use phrasegen_templates::Tokenizer;
use phrasegen_templates::EMPTY_MACRO;
use rustc_hash::FxHashSet;

use crate::error::EngineError;
use crate::shape::group_exact;
use crate::shape::Datum;

/// Counts for the module being compiled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuleStats {
    pub training: usize,
    pub tests: usize,
    /// Distinct generated code bodies.
    pub code: usize,
}

struct ModuleState {
    name: String,
    macros: Vec<MacroRecord>,
    training: Vec<TrainingRecord>,
    tests: Vec<TestCaseRecord>,
    code: CodeCache,
    failures: Vec<String>,
}

impl ModuleState {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            macros: Vec::new(),
            training: Vec::new(),
            tests: Vec::new(),
            code: CodeCache::new(),
            failures: Vec::new(),
        }
    }

    fn stats(&self) -> ModuleStats {
        ModuleStats {
            training: self.training.len(),
            tests: self.tests.len(),
            code: self.code.len(),
        }
    }

    fn into_batch(self) -> ModuleBatch {
        let module = self.name;
        let code = self
            .code
            .into_entries()
            .into_iter()
            .map(|entry| CodeRecord {
                hash: entry.hash.into(),
                module: module.clone(),
                function: entry.function,
                text: entry.text,
                source_file: entry.source_file,
            })
            .collect();

        ModuleBatch {
            module,
            macros: self.macros,
            code,
            training: self.training,
            tests: self.tests,
        }
    }
}

/// Compiles authoring calls of one module at a time into a [`Store`].
pub struct DataEngine<S> {
    settings: Settings,
    store: S,
    registry: MacroRegistry,
    tokens: TokenCache,
    prefixes: Vec<String>,
    module: Option<ModuleState>,
    /// `(language, name)` pairs whose stored variants were already merged
    /// into the registry.
    loaded: FxHashSet<(String, String)>,
}

impl DataEngine<JsonStore> {
    /// Engine backed by the JSON snapshot at `settings.store_path`, or
    /// `store.json` in the platform data directory when unset.
    pub fn open(settings: Settings) -> Result<Self, EngineError> {
        let path = match &settings.store_path {
            Some(path) => path.clone(),
            None => phrasegen_conf::project_dirs()
                .and_then(|dirs| {
                    Utf8PathBuf::from_path_buf(dirs.data_dir().join("store.json")).ok()
                })
                .ok_or(EngineError::NoStorePath)?,
        };
        let store = JsonStore::open(path)?;
        Ok(Self::new(settings, store))
    }
}

impl<S: Store> DataEngine<S> {
    #[must_use]
    pub fn new(settings: Settings, store: S) -> Self {
        let tokenizer = DefaultTokenizer::new(settings.keep_punctuation);
        Self::with_tokenizer(settings, store, tokenizer)
    }

    #[must_use]
    pub fn with_tokenizer(
        settings: Settings,
        store: S,
        tokenizer: impl Tokenizer + 'static,
    ) -> Self {
        Self {
            prefixes: settings.prefixes.clone(),
            settings,
            store,
            registry: MacroRegistry::new(),
            tokens: TokenCache::new(tokenizer),
            module: None,
            loaded: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    #[must_use]
    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    /// Name of the module being compiled, if any.
    #[must_use]
    pub fn current_module(&self) -> Option<&str> {
        self.module.as_ref().map(|module| module.name.as_str())
    }

    /// Start compiling `name`. Its previously registered macros are dropped
    /// and the prefixes reset to the configured ones. A module that was begun
    /// but never finished is discarded.
    pub fn begin_module(&mut self, name: &str) {
        if let Some(previous) = self.module.take() {
            tracing::warn!("Discarding unfinished module {}", previous.name);
            self.registry.clear_module(&previous.name);
        }

        tracing::info!("Compiling module {}", name);
        self.registry.clear_module(name);
        self.loaded.clear();
        self.prefixes.clone_from(&self.settings.prefixes);
        self.module = Some(ModuleState::new(name));
    }

    /// Add one variant to the macro `name` of `language`.
    pub fn define_macro(
        &mut self,
        language: &str,
        name: &str,
        variant: Variant,
    ) -> Result<(), EngineError> {
        let module = self.module.as_mut().ok_or(EngineError::NoModule)?;

        module.macros.push(MacroRecord {
            language: language.to_string(),
            module: module.name.clone(),
            name: name.to_string(),
            variant: variant.clone(),
        });
        self.registry.register(&module.name, language, name, variant);
        Ok(())
    }

    /// Every following training input is generated once per prefix. An empty
    /// list means no prefix.
    pub fn set_prefixes(&mut self, prefixes: Vec<String>) {
        self.prefixes = prefixes;
    }

    /// Generate training data from `inputs` answered by `response`.
    ///
    /// Returns the number of samples added. On error nothing from this call
    /// is kept and the failure is recorded against the module.
    pub fn dt(
        &mut self,
        language: &str,
        inputs: &[&str],
        response: &Response,
        location: SourceLocation,
    ) -> Result<usize, EngineError> {
        if self.module.is_none() {
            return Err(EngineError::NoModule);
        }

        let generated = match self.generate(language, inputs, response, &location) {
            Ok(generated) => generated,
            Err(error) => {
                self.record_failure(&error);
                return Err(error);
            }
        };

        let interval = self.settings.progress_interval;
        let module = self.module.as_mut().ok_or(EngineError::NoModule)?;
        let added = generated.len();

        for (input_text, code) in generated {
            let (hash, _) = module
                .code
                .insert(response.function(), code, location.file());

            module.training.push(TrainingRecord {
                language: language.to_string(),
                module: module.name.clone(),
                input_text,
                code_hash: hash.into(),
                source_file: location.file().to_path_buf(),
                source_line: location.line(),
            });

            let count = module.training.len();
            if interval > 0 && count % interval == 0 {
                tracing::info!("{:6} training samples extracted so far...", count);
            }
        }

        Ok(added)
    }

    /// Note a failed authoring call against the module being compiled.
    fn record_failure(&mut self, error: &EngineError) {
        if self.settings.keep_going {
            tracing::warn!("{}", error.skipped_report(&DiagnosticRenderer::plain()));
        } else {
            tracing::warn!("{}", error);
        }
        if let Some(module) = self.module.as_mut() {
            module.failures.push(error.to_string());
        }
    }

    /// Expand every `prefix + input` and render the response for each
    /// expansion, as `(input text, code)` pairs.
    fn generate(
        &mut self,
        language: &str,
        inputs: &[&str],
        response: &Response,
        location: &SourceLocation,
    ) -> Result<Vec<(String, String)>, EngineError> {
        let code_template = response.template().map_err(|error| EngineError::Codegen {
            code: response.source(),
            location: location.clone(),
            error,
        })?;

        let prefixes = if self.prefixes.is_empty() {
            vec![String::new()]
        } else {
            self.prefixes.clone()
        };

        let mut generated = Vec::new();
        for prefix in &prefixes {
            for input in inputs {
                let template = format!("{prefix}{input}");
                let parsed =
                    phrasegen_templates::parse(&template).map_err(|error| EngineError::Template {
                        template: template.clone(),
                        location: location.clone(),
                        error,
                    })?;
                self.load_stored_macros(&parsed, language)?;

                let expansions = Expander::new(&self.registry, &mut self.tokens)
                    .with_limit(self.settings.max_expansions)
                    .expand(&parsed, language)
                    .map_err(|error| EngineError::Expand {
                        template: template.clone(),
                        location: location.clone(),
                        error,
                    })?;

                for expansion in &expansions {
                    let code = self.render(&code_template, expansion, location)?;
                    tracing::debug!("{:?} -> {:?}", expansion.text(), code);
                    generated.push((expansion.text(), code));
                }
            }
        }

        Ok(generated)
    }

    fn render(
        &self,
        code_template: &CodeTemplate,
        expansion: &phrasegen_expand::Expansion,
        location: &SourceLocation,
    ) -> Result<String, EngineError> {
        code_template
            .generate(expansion, self.settings.missing_occurrence)
            .map_err(|error| EngineError::Codegen {
                code: code_template.source().to_string(),
                location: location.clone(),
                error,
            })
    }

    /// Merge the stored variants of every macro `template` uses into the
    /// registry, once per `(language, name)`.
    ///
    /// Variants of modules already present in the registry are skipped, as
    /// are those of the module being compiled, whose stored version is about
    /// to be replaced.
    fn load_stored_macros(
        &mut self,
        template: &ParsedTemplate,
        language: &str,
    ) -> Result<(), EngineError> {
        let current = self.module.as_ref().map(|module| module.name.as_str());

        for macro_ref in template.macro_refs() {
            let name = macro_ref.name.as_str();
            if name == EMPTY_MACRO || template.anonymous_macro(name).is_some() {
                continue;
            }
            if !self.loaded.insert((language.to_string(), name.to_string())) {
                continue;
            }

            let present: FxHashSet<String> = self
                .registry
                .lookup(language, name)
                .unwrap_or_default()
                .iter()
                .map(|registered| registered.module().to_string())
                .collect();

            for record in self.store.macros(language, name)? {
                if Some(record.module.as_str()) == current || present.contains(&record.module) {
                    continue;
                }
                tracing::debug!(
                    "Loading stored variant of [{}] {} from module {}",
                    record.language,
                    record.name,
                    record.module
                );
                self.registry
                    .register(&record.module, &record.language, &record.name, record.variant);
            }
        }

        Ok(())
    }

    /// Add a test case. Inputs and outputs are stored tokenized.
    pub fn ts(
        &mut self,
        language: &str,
        name: &str,
        rounds: &[TestRound],
        prep: Option<&str>,
        location: SourceLocation,
    ) -> Result<(), EngineError> {
        let Some(module) = self.module.as_mut() else {
            return Err(EngineError::NoModule);
        };

        let rounds = rounds
            .iter()
            .map(|round| TestRound {
                input: self.tokens.tokens(language, &round.input).join(" "),
                output: self.tokens.tokens(language, &round.output).join(" "),
                actions: round.actions.clone(),
            })
            .collect();

        module.tests.push(TestCaseRecord {
            language: language.to_string(),
            module: module.name.clone(),
            name: name.to_string(),
            prep: prep.map(str::to_string),
            rounds,
            source_file: location.file().to_path_buf(),
            source_line: location.line(),
        });
        Ok(())
    }

    /// [`ts`](Self::ts) with rounds given as a flat `[input, output, actions]*` list.
    pub fn ts_flat(
        &mut self,
        language: &str,
        name: &str,
        data: &[Datum],
        prep: Option<&str>,
        location: SourceLocation,
    ) -> Result<(), EngineError> {
        let rounds: Vec<TestRound> = match group_exact(data, 3) {
            Ok(groups) => groups
                .map(|round| TestRound {
                    input: round[0].text(),
                    output: round[1].text(),
                    actions: round[2].list(),
                })
                .collect(),
            Err(error) => {
                let error = EngineError::DataShape { location, error };
                self.record_failure(&error);
                return Err(error);
            }
        };

        self.ts(language, name, &rounds, prep, location)
    }

    /// Counts for the module being compiled; zero when none is.
    #[must_use]
    pub fn stats(&self) -> ModuleStats {
        self.module
            .as_ref()
            .map(ModuleState::stats)
            .unwrap_or_default()
    }

    /// Replace the module in the store with everything collected since
    /// [`begin_module`](Self::begin_module).
    ///
    /// A module with failed authoring calls is not stored unless
    /// `keep_going` is set; its macros are dropped from the registry and the
    /// store keeps the previous version.
    pub fn finish(&mut self) -> Result<ModuleStats, EngineError> {
        let module = self.module.take().ok_or(EngineError::NoModule)?;
        let stats = module.stats();

        if !module.failures.is_empty() {
            if !self.settings.keep_going {
                self.registry.clear_module(&module.name);
                self.loaded.clear();
                return Err(EngineError::ModuleFailed {
                    module: module.name,
                    failures: module.failures,
                });
            }
            tracing::warn!(
                "Storing module {} despite {} failed authoring calls",
                module.name,
                module.failures.len()
            );
        }

        let name = module.name.clone();
        self.store.replace_module(module.into_batch())?;

        tracing::info!(
            "Compiled module {}: {} training samples, {} code bodies, {} tests",
            name,
            stats.training,
            stats.code,
            stats.tests
        );
        Ok(stats)
    }

    /// Drop a module from the registry and the store.
    pub fn clear_module(&mut self, name: &str) -> Result<(), EngineError> {
        self.registry.clear_module(name);
        self.loaded.clear();
        self.store.clear_module(name)?;
        tracing::info!("Cleared module {}", name);
        Ok(())
    }

    /// `(function, code)` stored under `hash`.
    pub fn lookup_code(&self, hash: &str) -> Result<Option<(String, String)>, EngineError> {
        Ok(self
            .store
            .code(hash)?
            .map(|record| (record.function, record.text)))
    }

    /// Samples for `input`, tokenized the same way stored inputs are.
    /// `language` defaults to the configured one.
    pub fn lookup_training(
        &mut self,
        input: &str,
        language: Option<&str>,
    ) -> Result<Vec<TrainingRecord>, EngineError> {
        let language = language.unwrap_or(self.settings.default_language.as_str());
        let normalized = self.tokens.tokens(language, input).join(" ");
        Ok(self.store.training(language, &normalized)?)
    }

    /// Test cases of `module`, ordered by name.
    pub fn lookup_tests(&self, module: &str) -> Result<Vec<TestCaseRecord>, EngineError> {
        Ok(self.store.tests(module)?)
    }

    /// Distinct stored inputs of `language`, optionally of one module only.
    ///
    /// With a `dictionary`, only inputs containing a word outside it are
    /// returned, and the first such word of each returned input joins the
    /// dictionary, so every returned input brings a new word.
    pub fn utterances(
        &self,
        language: Option<&str>,
        module: Option<&str>,
        mut dictionary: Option<&mut FxHashSet<String>>,
    ) -> Result<Vec<String>, EngineError> {
        let language = language.unwrap_or(self.settings.default_language.as_str());
        let mut utterances = Vec::new();

        for record in self.store.training_for_module(language, module)? {
            if let Some(dictionary) = dictionary.as_deref_mut() {
                let Some(unknown) = record
                    .input_text
                    .split_whitespace()
                    .find(|word| !dictionary.contains(*word))
                else {
                    continue;
                };
                dictionary.insert(unknown.to_string());
            }
            utterances.push(record.input_text);
        }

        Ok(utterances.into_iter().unique().collect())
    }
}
