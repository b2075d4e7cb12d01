//! Macro registry and combinatorial expansion of parsed templates.
//!
//! [`expand`] walks a [`ParsedTemplate`](phrasegen_templates::ParsedTemplate)
//! depth first with an explicit stack. Every macro reference fans out into one
//! successor per variant; each successor owns its own copy of the tokens built
//! so far, the position map and the variant bindings, so sibling branches never
//! observe each other. Variants themselves are immutable and shared.
//!
//! The number of expansions is the product of the variant counts of all macro
//! occurrences in the template, so it grows quickly. Keep variant counts per
//! template modest or set a limit with [`Expander::with_limit`].

mod error;
mod expander;
mod expansion;
mod registry;
mod token_cache;
mod variant;

pub use error::ExpandError;
pub use expander::expand;
pub use expander::Expander;
pub use expansion::Expansion;
pub use expansion::OccurrenceKey;
pub use expansion::TokenSpan;
pub use registry::MacroRegistry;
pub use registry::RegisteredVariant;
pub use token_cache::TokenCache;
pub use variant::Value;
pub use variant::Variant;
