use phrasegen_codegen::CodegenError;
use phrasegen_conf::ConfigError;
use phrasegen_expand::ExpandError;
use phrasegen_source::Diagnostic;
use phrasegen_source::DiagnosticRenderer;
use phrasegen_source::Severity;
use phrasegen_source::SourceLocation;
use phrasegen_source::Span;
use phrasegen_store::StoreError;
use phrasegen_templates::ParseError;
use thiserror::Error;

use crate::shape::ShapeError;

const SKIPPED_NOTE: &str = "the module is stored without this call";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{location}: {error}")]
    Template {
        template: String,
        location: SourceLocation,
        #[source]
        error: ParseError,
    },

    #[error("{location}: {error}")]
    Expand {
        template: String,
        location: SourceLocation,
        #[source]
        error: ExpandError,
    },

    #[error("{location}: {error}")]
    Codegen {
        code: String,
        location: SourceLocation,
        #[source]
        error: CodegenError,
    },

    #[error("{location}: {error}")]
    DataShape {
        location: SourceLocation,
        #[source]
        error: ShapeError,
    },

    #[error("no module is being compiled, call `begin_module` first")]
    NoModule,

    #[error("module `{module}` has {} failed authoring calls", .failures.len())]
    ModuleFailed {
        module: String,
        failures: Vec<String>,
    },

    #[error("no store path configured and no platform data directory available")]
    NoStorePath,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    #[must_use]
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            EngineError::Template { error, .. } => error.diagnostic_code(),
            EngineError::Expand { error, .. } => error.diagnostic_code(),
            EngineError::Codegen { error, .. } => error.diagnostic_code(),
            EngineError::DataShape { .. } => "D100",
            EngineError::NoModule => "M100",
            EngineError::ModuleFailed { .. } => "M101",
            EngineError::NoStorePath => "M102",
            EngineError::Store(_) => "S100",
            EngineError::Config(_) => "C100",
        }
    }

    #[must_use]
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            EngineError::Template { location, .. }
            | EngineError::Expand { location, .. }
            | EngineError::Codegen { location, .. }
            | EngineError::DataShape { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The authored text the error points into, with the offending span.
    fn snippet(&self) -> Option<(&str, Option<Span>, &'static str)> {
        match self {
            EngineError::Template {
                template, error, ..
            } => Some((template.as_str(), Some(error.span()), "syntax error")),
            EngineError::Expand {
                template, error, ..
            } => Some((template.as_str(), error.span(), "cannot expand")),
            EngineError::Codegen { code, error, .. } => {
                Some((code.as_str(), Some(error.span()), "in this placeholder"))
            }
            _ => None,
        }
    }

    /// Render the error for humans, with an annotated snippet where the error
    /// points into authored text.
    #[must_use]
    pub fn report(&self, renderer: &DiagnosticRenderer) -> String {
        self.render(renderer, Severity::Error, None)
    }

    /// Render the error as a warning about an authoring call that was left
    /// out of a module stored under `keep_going`.
    #[must_use]
    pub fn skipped_report(&self, renderer: &DiagnosticRenderer) -> String {
        self.render(renderer, Severity::Warning, Some(SKIPPED_NOTE))
    }

    fn render(
        &self,
        renderer: &DiagnosticRenderer,
        severity: Severity,
        note: Option<&str>,
    ) -> String {
        let Some((source, span, label)) = self.snippet() else {
            let level = match severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            let mut report = format!("{level}[{}]: {self}", self.diagnostic_code());
            if let Some(note) = note {
                report.push_str("\n  = note: ");
                report.push_str(note);
            }
            return report;
        };
        let location = self.location().cloned().unwrap_or_default();

        let message = match self {
            EngineError::Template { error, .. } => error.to_string(),
            EngineError::Expand { error, .. } => error.to_string(),
            EngineError::Codegen { error, .. } => error.to_string(),
            _ => self.to_string(),
        };

        let mut diagnostic =
            Diagnostic::new(source, &location, self.diagnostic_code(), &message, severity);
        if let Some(span) = span {
            diagnostic = diagnostic.annotation(span, label);
        }
        if let Some(note) = note {
            diagnostic = diagnostic.note(note);
        }

        renderer.render(&diagnostic)
    }
}
