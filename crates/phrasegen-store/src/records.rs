use camino::Utf8PathBuf;
use phrasegen_expand::Variant;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroRecord {
    pub language: String,
    pub module: String,
    pub name: String,
    pub variant: Variant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub hash: String,
    pub module: String,
    pub function: String,
    pub text: String,
    pub source_file: Utf8PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub language: String,
    pub module: String,
    /// Tokens joined by single spaces.
    pub input_text: String,
    pub code_hash: String,
    pub source_file: Utf8PathBuf,
    pub source_line: u32,
}

/// One exchange of a test dialog. Input and output are stored tokenized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRound {
    pub input: String,
    pub output: String,
    pub actions: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseRecord {
    pub language: String,
    pub module: String,
    pub name: String,
    pub prep: Option<String>,
    pub rounds: Vec<TestRound>,
    pub source_file: Utf8PathBuf,
    pub source_line: u32,
}

/// Everything one module compile produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleBatch {
    pub module: String,
    pub macros: Vec<MacroRecord>,
    pub code: Vec<CodeRecord>,
    pub training: Vec<TrainingRecord>,
    pub tests: Vec<TestCaseRecord>,
}

impl ModuleBatch {
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
            && self.code.is_empty()
            && self.training.is_empty()
            && self.tests.is_empty()
    }
}
