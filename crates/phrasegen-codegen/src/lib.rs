//! Response-code generation for expanded utterances.
//!
//! A [`CodeTemplate`] is parsed once per authoring call and then rendered
//! against every [`Expansion`](phrasegen_expand::Expansion) of the call's
//! input templates. Three placeholder forms are recognized:
//!
//! - `tstart(name[, occurrence])`: index of the first token of a macro occurrence
//! - `tend(name[, occurrence])`: index one past its last token
//! - `mvar(name, variable[, occurrence])`: the bound variable value, verbatim
//!
//! Rendered bodies are deduplicated by their SHA-256 content hash in a
//! [`CodeCache`].

mod cache;
mod error;
mod hash;
mod response;
mod template;

pub use cache::CodeCache;
pub use cache::CodeEntry;
pub use error::CodegenError;
pub use hash::ContentHash;
pub use response::unindent;
pub use response::Response;
pub use response::RESPONSE_FUNCTION;
pub use template::CodeTemplate;
pub use template::Placeholder;
pub use template::PlaceholderKind;
