use std::fmt;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde::Serialize;

/// Where an authoring call lives: the source file and its 1-based line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    file: Utf8PathBuf,
    line: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<Utf8PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location used when the caller has nothing better to offer.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new("<unknown>", 0)
    }

    #[must_use]
    pub fn file(&self) -> &Utf8Path {
        &self.file
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
