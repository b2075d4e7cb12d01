use camino::Utf8Path;
use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;

use crate::hash::ContentHash;

/// A generated code body, stored once per distinct content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeEntry {
    pub hash: ContentHash,
    pub function: String,
    pub text: String,
    pub source_file: Utf8PathBuf,
}

/// Content-addressed store of generated bodies, in first-insertion order.
#[derive(Debug, Default)]
pub struct CodeCache {
    entries: Vec<CodeEntry>,
    index: FxHashMap<ContentHash, usize>,
}

impl CodeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `text` and store it unless an identical body is already present.
    ///
    /// Returns the hash and whether a new entry was created.
    pub fn insert(
        &mut self,
        function: &str,
        text: String,
        source_file: &Utf8Path,
    ) -> (ContentHash, bool) {
        let hash = ContentHash::of(&text);
        if self.index.contains_key(&hash) {
            return (hash, false);
        }

        tracing::trace!("New code body {} for {}", hash, function);
        self.index.insert(hash.clone(), self.entries.len());
        self.entries.push(CodeEntry {
            hash: hash.clone(),
            function: function.to_string(),
            text,
            source_file: source_file.to_path_buf(),
        });
        (hash, true)
    }

    #[must_use]
    pub fn get(&self, hash: &ContentHash) -> Option<&CodeEntry> {
        self.index.get(hash).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.index.contains_key(hash)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<CodeEntry> {
        self.entries
    }
}
