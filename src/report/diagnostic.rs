//! Diagnostic records.
//!
//! Every finding the analysis produces, from a stray character to an
//! inconsistently cased keyword, is reported as a [`Diagnostic`] with a
//! category, a line number and the offending text. Rendering is left to
//! whichever [`DiagnosticSink`](super::DiagnosticSink) consumes them.

use std::fmt;

/// Category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// A physical line could not be tokenized and was skipped
    LexError,
    /// A statement the parser does not recognize in its position
    GrammarMismatch,
    /// An end statement names a different kind than the unit it closes
    EndKindMismatch,
    /// Input ended inside a unit or construct
    UnexpectedEof,
    MissingInclude,
    IncludeCycle,
    MalformedDirective,
    UnsupportedDirective,
    /// `undef` of a name that was never defined
    UndefinedMacro,
    LineWidth,
    TrailingWhitespace,
    TokenSpacing,
    CaseInconsistency,
}

impl DiagnosticKind {
    /// Style checks, as opposed to lexing, parsing and preprocessing findings
    #[must_use]
    pub fn is_style(self) -> bool {
        matches!(
            self,
            DiagnosticKind::LineWidth
                | DiagnosticKind::TrailingWhitespace
                | DiagnosticKind::TokenSpacing
                | DiagnosticKind::CaseInconsistency
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::LexError => "lex-error",
            DiagnosticKind::GrammarMismatch => "unresolved",
            DiagnosticKind::EndKindMismatch => "end-kind-mismatch",
            DiagnosticKind::UnexpectedEof => "unexpected-eof",
            DiagnosticKind::MissingInclude => "missing-include",
            DiagnosticKind::IncludeCycle => "include-cycle",
            DiagnosticKind::MalformedDirective => "malformed-directive",
            DiagnosticKind::UnsupportedDirective => "unsupported-directive",
            DiagnosticKind::UndefinedMacro => "undefined-macro",
            DiagnosticKind::LineWidth => "line-width",
            DiagnosticKind::TrailingWhitespace => "trailing-whitespace",
            DiagnosticKind::TokenSpacing => "token-spacing",
            DiagnosticKind::CaseInconsistency => "case",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 1-based line number; 0 for whole-file findings
    pub line: usize,
    /// Offending text
    pub text: String,
    /// Extra context, such as the section a statement was found in
    pub note: Option<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, line: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            text: text.into(),
            note: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.text)?;
        if let Some(note) = &self.note {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}
