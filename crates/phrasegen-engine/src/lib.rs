//! Module compilation: turns authoring calls into stored training data.
//!
//! A [`DataEngine`] compiles one module at a time. Between
//! [`DataEngine::begin_module`] and [`DataEngine::finish`] it collects macros,
//! training samples and test cases in memory; `finish` hands the whole module
//! to the [`Store`](phrasegen_store::Store) in a single replace.
//!
//! ```
//! use phrasegen_codegen::Response;
//! use phrasegen_conf::Settings;
//! use phrasegen_engine::DataEngine;
//! use phrasegen_expand::Variant;
//! use phrasegen_source::SourceLocation;
//! use phrasegen_store::MemoryStore;
//!
//! let mut engine = DataEngine::new(Settings::default(), MemoryStore::new());
//! engine.begin_module("smalltalk");
//! engine.define_macro("en", "greeting", Variant::new().with("W", "hello")).unwrap();
//! engine.define_macro("en", "greeting", Variant::new().with("W", "hi")).unwrap();
//! let added = engine
//!     .dt("en", &["{greeting:W} (computer|there)"], &Response::say("Hi!"), SourceLocation::new("smalltalk.rs", 3))
//!     .unwrap();
//! assert_eq!(added, 4);
//! let stats = engine.finish().unwrap();
//! assert_eq!(stats.code, 1);
//! ```

mod engine;
mod error;
pub mod logging;
mod shape;

pub use engine::DataEngine;
pub use engine::ModuleStats;
pub use error::EngineError;
pub use shape::group_exact;
pub use shape::training_rounds;
pub use shape::Datum;
pub use shape::ShapeError;
pub use shape::TrainingRound;
