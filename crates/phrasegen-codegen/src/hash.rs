use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// Hex-encoded SHA-256 digest of a generated code body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash `text` with a fresh digest context.
    #[must_use]
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        insta::assert_snapshot!(
            ContentHash::of("abc").to_string(),
            @"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_depends_only_on_content() {
        let first = ContentHash::of("c.resp(\"hi\")");
        ContentHash::of("something else entirely");
        let second = ContentHash::of("c.resp(\"hi\")");
        assert_eq!(first, second);
        assert_ne!(first, ContentHash::of("c.resp(\"ho\")"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let hash = ContentHash::of("");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
    }
}
