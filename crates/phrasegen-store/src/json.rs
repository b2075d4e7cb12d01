use std::fs;
use std::io::BufWriter;
use std::io::Write;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::records::CodeRecord;
use crate::records::MacroRecord;
use crate::records::ModuleBatch;
use crate::records::TestCaseRecord;
use crate::records::TrainingRecord;
use crate::Store;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotEnvelope {
    format_version: u32,
    modules: Vec<ModuleBatch>,
}

/// A [`MemoryStore`] mirrored to a JSON snapshot file.
///
/// Every write serializes the next state to a temporary file beside the
/// snapshot and renames it over the old one, so an interrupted or failed write
/// leaves the previous snapshot intact.
#[derive(Debug)]
pub struct JsonStore {
    path: Utf8PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    /// Open the snapshot at `path`, starting empty when it does not exist yet.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let inner = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let envelope: SnapshotEnvelope = serde_json::from_str(&content)?;
            if envelope.format_version != FORMAT_VERSION {
                return Err(StoreError::Version {
                    found: envelope.format_version,
                    expected: FORMAT_VERSION,
                });
            }
            tracing::info!(
                "Loaded store snapshot {} ({} modules)",
                path,
                envelope.modules.len()
            );
            MemoryStore::from_batches(envelope.modules)
        } else {
            tracing::debug!("No store snapshot at {}, starting empty", path);
            MemoryStore::new()
        };

        Ok(Self { path, inner })
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Apply `change` to a copy of the current state, persist the copy, and
    /// only then make it current.
    fn commit(
        &mut self,
        change: impl FnOnce(&mut MemoryStore) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut next = self.inner.clone();
        change(&mut next)?;
        write_snapshot(&self.path, &next)?;
        self.inner = next;
        Ok(())
    }
}

fn write_snapshot(path: &Utf8Path, store: &MemoryStore) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let envelope = SnapshotEnvelope {
        format_version: FORMAT_VERSION,
        modules: store.batches().cloned().collect(),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = BufWriter::new(tmp);
    serde_json::to_writer(&mut writer, &envelope)?;
    writer.flush()?;
    let tmp = writer.into_inner().map_err(std::io::IntoInnerError::into_error)?;
    tmp.persist(path)?;

    tracing::debug!("Saved store snapshot to {}", path);
    Ok(())
}

impl Store for JsonStore {
    fn replace_module(&mut self, batch: ModuleBatch) -> Result<(), StoreError> {
        self.commit(|store| store.replace_module(batch))
    }

    fn clear_module(&mut self, module: &str) -> Result<(), StoreError> {
        self.commit(|store| store.clear_module(module))
    }

    fn macros(&self, language: &str, name: &str) -> Result<Vec<MacroRecord>, StoreError> {
        self.inner.macros(language, name)
    }

    fn code(&self, hash: &str) -> Result<Option<CodeRecord>, StoreError> {
        self.inner.code(hash)
    }

    fn training(&self, language: &str, input: &str) -> Result<Vec<TrainingRecord>, StoreError> {
        self.inner.training(language, input)
    }

    fn training_for_module(
        &self,
        language: &str,
        module: Option<&str>,
    ) -> Result<Vec<TrainingRecord>, StoreError> {
        self.inner.training_for_module(language, module)
    }

    fn tests(&self, module: &str) -> Result<Vec<TestCaseRecord>, StoreError> {
        self.inner.tests(module)
    }

    fn modules(&self) -> Result<Vec<String>, StoreError> {
        self.inner.modules()
    }
}
