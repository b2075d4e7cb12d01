use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use crate::error::StoreError;
use crate::records::CodeRecord;
use crate::records::MacroRecord;
use crate::records::ModuleBatch;
use crate::records::TestCaseRecord;
use crate::records::TrainingRecord;
use crate::Store;

/// Keeps every module's batch in memory, keyed by module name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    modules: BTreeMap<String, ModuleBatch>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_batches(batches: impl IntoIterator<Item = ModuleBatch>) -> Self {
        Self {
            modules: batches
                .into_iter()
                .map(|batch| (batch.module.clone(), batch))
                .collect(),
        }
    }

    pub(crate) fn batches(&self) -> impl Iterator<Item = &ModuleBatch> {
        self.modules.values()
    }

    fn validate(batch: &ModuleBatch) -> Result<(), StoreError> {
        let hashes: FxHashSet<&str> = batch.code.iter().map(|code| code.hash.as_str()).collect();
        match batch
            .training
            .iter()
            .find(|sample| !hashes.contains(sample.code_hash.as_str()))
        {
            Some(sample) => Err(StoreError::DanglingCode {
                module: batch.module.clone(),
                hash: sample.code_hash.clone(),
            }),
            None => Ok(()),
        }
    }

    fn training_records(&self) -> impl Iterator<Item = &TrainingRecord> {
        self.modules.values().flat_map(|batch| batch.training.iter())
    }
}

impl Store for MemoryStore {
    fn replace_module(&mut self, batch: ModuleBatch) -> Result<(), StoreError> {
        Self::validate(&batch)?;
        tracing::debug!(
            "Replacing module {}: {} code bodies, {} training samples, {} tests",
            batch.module,
            batch.code.len(),
            batch.training.len(),
            batch.tests.len()
        );
        self.modules.insert(batch.module.clone(), batch);
        Ok(())
    }

    fn clear_module(&mut self, module: &str) -> Result<(), StoreError> {
        if self.modules.remove(module).is_some() {
            tracing::debug!("Cleared module {}", module);
        }
        Ok(())
    }

    fn macros(&self, language: &str, name: &str) -> Result<Vec<MacroRecord>, StoreError> {
        Ok(self
            .modules
            .values()
            .flat_map(|batch| batch.macros.iter())
            .filter(|record| record.language == language && record.name == name)
            .cloned()
            .collect())
    }

    fn code(&self, hash: &str) -> Result<Option<CodeRecord>, StoreError> {
        Ok(self
            .modules
            .values()
            .flat_map(|batch| batch.code.iter())
            .find(|record| record.hash == hash)
            .cloned())
    }

    fn training(&self, language: &str, input: &str) -> Result<Vec<TrainingRecord>, StoreError> {
        Ok(self
            .training_records()
            .filter(|record| record.language == language && record.input_text == input)
            .cloned()
            .collect())
    }

    fn training_for_module(
        &self,
        language: &str,
        module: Option<&str>,
    ) -> Result<Vec<TrainingRecord>, StoreError> {
        Ok(self
            .training_records()
            .filter(|record| record.language == language)
            .filter(|record| module.is_none_or(|module| record.module == module))
            .cloned()
            .collect())
    }

    fn tests(&self, module: &str) -> Result<Vec<TestCaseRecord>, StoreError> {
        let mut tests = self
            .modules
            .get(module)
            .map(|batch| batch.tests.clone())
            .unwrap_or_default();
        tests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tests)
    }

    fn modules(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.modules.keys().cloned().collect())
    }
}
