use annotate_snippets::AnnotationKind;
use annotate_snippets::Level;
use annotate_snippets::Renderer;
use annotate_snippets::Snippet;

use crate::SourceLocation;
use crate::Span;

/// Severity level for rendered diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single annotation to render on a template snippet.
#[derive(Debug, Clone)]
pub struct DiagnosticAnnotation<'a> {
    pub span: Span,
    pub label: &'a str,
}

/// A diagnostic ready for rendering.
///
/// `source` is the template text and `location` the authoring call it came
/// from, so rendered line numbers point into the module source file.
#[derive(Debug)]
pub struct Diagnostic<'a> {
    pub source: &'a str,
    pub location: &'a SourceLocation,
    pub code: &'a str,
    pub message: &'a str,
    pub severity: Severity,
    pub annotations: Vec<DiagnosticAnnotation<'a>>,
    pub notes: Vec<&'a str>,
}

impl<'a> Diagnostic<'a> {
    /// Create a diagnostic without any annotation.
    ///
    /// Errors that are not tied to a byte range of the template (an unknown
    /// macro reached through a prefix, a store failure) render as a bare header.
    #[must_use]
    pub fn new(
        source: &'a str,
        location: &'a SourceLocation,
        code: &'a str,
        message: &'a str,
        severity: Severity,
    ) -> Self {
        Self {
            source,
            location,
            code,
            message,
            severity,
            annotations: Vec::new(),
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn annotation(mut self, span: Span, label: &'a str) -> Self {
        self.annotations.push(DiagnosticAnnotation { span, label });
        self
    }

    #[must_use]
    pub fn note(mut self, note: &'a str) -> Self {
        self.notes.push(note);
        self
    }
}

/// Renders diagnostics as formatted text using `annotate-snippets`.
#[derive(Debug)]
pub struct DiagnosticRenderer {
    renderer: Renderer,
}

impl DiagnosticRenderer {
    /// No ANSI colors. Use for snapshot tests and log files.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            renderer: Renderer::plain(),
        }
    }

    #[must_use]
    pub fn styled() -> Self {
        Self {
            renderer: Renderer::styled(),
        }
    }

    #[must_use]
    pub fn render(&self, diagnostic: &Diagnostic<'_>) -> String {
        let level = match diagnostic.severity {
            Severity::Error => Level::ERROR,
            Severity::Warning => Level::WARNING,
        };

        let path = diagnostic.location.file().as_str();
        let line_start = usize::try_from(diagnostic.location.line().max(1)).unwrap_or(1);

        let mut snippet = Snippet::source(diagnostic.source)
            .path(path)
            .line_start(line_start);

        for ann in &diagnostic.annotations {
            let start = ann.span.start_usize().min(diagnostic.source.len());
            let end = ann.span.end_usize().min(diagnostic.source.len());
            snippet = snippet.annotation(AnnotationKind::Primary.span(start..end).label(ann.label));
        }

        let mut title = level
            .primary_title(diagnostic.message)
            .id(diagnostic.code)
            .element(snippet);

        for note in &diagnostic.notes {
            title = title.element(Level::NOTE.message(*note));
        }

        let report = &[title];
        self.renderer.render(report).clone()
    }
}
