mod location;
mod render;
mod span;

pub use location::SourceLocation;
pub use render::Diagnostic;
pub use render::DiagnosticAnnotation;
pub use render::DiagnosticRenderer;
pub use render::Severity;
pub use span::Span;
