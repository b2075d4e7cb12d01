//! Persistence of compiled modules: macros, generated code, training samples
//! and test cases.
//!
//! A module is always written as a whole through [`Store::replace_module`];
//! readers never see half of a module.

mod error;
mod json;
mod memory;
mod records;

pub use error::StoreError;
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use records::CodeRecord;
pub use records::MacroRecord;
pub use records::ModuleBatch;
pub use records::TestCaseRecord;
pub use records::TestRound;
pub use records::TrainingRecord;

pub trait Store {
    /// Drop everything stored for `batch.module` and insert the batch in its
    /// place. On error the previous contents stay untouched.
    fn replace_module(&mut self, batch: ModuleBatch) -> Result<(), StoreError>;

    fn clear_module(&mut self, module: &str) -> Result<(), StoreError>;

    fn macros(&self, language: &str, name: &str) -> Result<Vec<MacroRecord>, StoreError>;

    fn code(&self, hash: &str) -> Result<Option<CodeRecord>, StoreError>;

    /// Samples whose input text equals `input`.
    fn training(&self, language: &str, input: &str) -> Result<Vec<TrainingRecord>, StoreError>;

    /// All samples of a language, optionally restricted to one module.
    fn training_for_module(
        &self,
        language: &str,
        module: Option<&str>,
    ) -> Result<Vec<TrainingRecord>, StoreError>;

    /// Test cases of `module`, ordered by name.
    fn tests(&self, module: &str) -> Result<Vec<TestCaseRecord>, StoreError>;

    fn modules(&self) -> Result<Vec<String>, StoreError>;
}
