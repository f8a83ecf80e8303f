//! [`Diagnostic`] and its [`Label`]s.

use bis_ir::Span;
use std::fmt;

use crate::span_utils::LineOffsetTable;
use crate::ErrorCode;

/// A span and what to say about it.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
    /// Whether this is the main error location.
    pub is_primary: bool,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
            is_primary: false,
        }
    }
}

/// A diagnostic with everything needed to act on it without the graph.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a primary label at the error location.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label for context, such as an earlier declaration.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.iter().find(|l| l.is_primary).map(|l| l.span)
    }

    /// `error`, or `internal error` for the E9xxx range.
    pub fn headline(&self) -> &'static str {
        if self.code.is_internal_error() {
            "internal error"
        } else {
            "error"
        }
    }

    /// Render against the source text, with `path:line:col` locations and
    /// the offending line underlined.
    pub fn render(&self, path: &str, source: &str) -> String {
        let table = LineOffsetTable::build(source);
        let mut out = format!("{}[{}]: {}", self.headline(), self.code, self.message);

        for label in &self.labels {
            if label.span.is_dummy() {
                out.push_str(&format!("\n  = builtin: {}", label.message));
                continue;
            }
            let (line, col) = table.offset_to_line_col(source, label.span.start);
            let marker = if label.is_primary { "-->" } else { ":::" };
            out.push_str(&format!("\n {marker} {path}:{line}:{col}"));
            if let Some(text) = table.line_text(source, line) {
                let gutter = line.to_string();
                let pad = " ".repeat(gutter.len());
                let width = (label.span.len() as usize).max(1);
                let underline = if label.is_primary { "^" } else { "-" };
                out.push_str(&format!("\n{pad} |\n{gutter} | {text}"));
                out.push_str(&format!(
                    "\n{pad} | {}{} {}",
                    " ".repeat(col.saturating_sub(1) as usize),
                    underline.repeat(width),
                    label.message
                ));
            }
        }

        for note in &self.notes {
            out.push_str(&format!("\n  = note: {note}"));
        }
        for suggestion in &self.suggestions {
            out.push_str(&format!("\n  = help: {suggestion}"));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.headline(), self.code, self.message)?;
        for label in &self.labels {
            let role = if label.is_primary { "at" } else { "see" };
            write!(f, "\n  {role} {}: {}", label.span, label.message)?;
        }
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        self.suggestions
            .iter()
            .try_for_each(|help| write!(f, "\n  = help: {help}"))
    }
}
