//! Per-file diagnostics aggregation
//!
//! A [`Report`] is created for the analyzed file and for every include it
//! pulls in. Style checks feed it line by line while the file is scanned;
//! lexing, preprocessing and parsing findings are pushed as
//! [`Diagnostic`]s. [`Report::check_keyword_case`] runs once at the end.

pub mod checks;
pub mod diagnostic;
pub mod sink;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::parser::tokenizer::Token;

pub use checks::{CaseViolation, SpacingViolation, WidthViolation};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use sink::{DiagnosticSink, WriterSink};

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub path: PathBuf,
    pub line_width: Vec<WidthViolation>,
    /// Lines ending in whitespace
    pub trailing_whitespace: Vec<usize>,
    pub token_spacing: Vec<SpacingViolation>,
    /// Lowercase token to every casing seen in code
    pub cases: BTreeMap<String, BTreeSet<String>>,
    pub case_violations: Vec<CaseViolation>,
    /// Leading whitespace width of each tokenized line, in line order
    pub indents: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn check_line_width(&mut self, raw: &str, line: usize, limit: usize) {
        if let Some(width) = checks::line_width(raw, limit) {
            self.line_width.push(WidthViolation { line, width });
        }
    }

    /// Run the token-level checks for one physical line
    pub fn check_tokens(&mut self, tokens: &[Token], line: usize, check_spacing: bool) {
        if checks::has_trailing_whitespace(tokens) {
            self.trailing_whitespace.push(line);
        }
        if check_spacing {
            self.token_spacing.extend(
                checks::spacing_violations(tokens)
                    .into_iter()
                    .map(|(column, operator)| SpacingViolation {
                        line,
                        column,
                        operator,
                    }),
            );
        }
        self.indents.push(checks::leading_indent(tokens));
        checks::record_cases(&mut self.cases, tokens);
    }

    /// Flag every token spelled with more than one casing
    pub fn check_keyword_case(&mut self) {
        self.case_violations = checks::inconsistent_cases(&self.cases);
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Number of diagnostics of one kind, style findings included
    #[must_use]
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        match kind {
            DiagnosticKind::LineWidth => self.line_width.len(),
            DiagnosticKind::TrailingWhitespace => self.trailing_whitespace.len(),
            DiagnosticKind::TokenSpacing => self.token_spacing.len(),
            DiagnosticKind::CaseInconsistency => self.case_violations.len(),
            _ => self.diagnostics.iter().filter(|d| d.kind == kind).count(),
        }
    }

    /// Statements the parser could not place
    pub fn grammar_mismatches(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::GrammarMismatch)
    }

    /// Every finding as a diagnostic, ordered by line
    #[must_use]
    pub fn records(&self) -> Vec<Diagnostic> {
        let mut records: Vec<Diagnostic> = self.diagnostics.clone();
        records.extend(self.line_width.iter().map(|v| {
            Diagnostic::new(
                DiagnosticKind::LineWidth,
                v.line,
                format!("line is {} characters", v.width),
            )
        }));
        records.extend(self.trailing_whitespace.iter().map(|&line| {
            Diagnostic::new(DiagnosticKind::TrailingWhitespace, line, "trailing whitespace")
        }));
        records.extend(self.token_spacing.iter().map(|v| {
            Diagnostic::new(
                DiagnosticKind::TokenSpacing,
                v.line,
                format!("'{}' at column {} touches a word", v.operator, v.column),
            )
        }));
        records.extend(self.case_violations.iter().map(|v| {
            Diagnostic::new(
                DiagnosticKind::CaseInconsistency,
                0,
                format!("{} spelled as {}", v.key, v.spellings.join(", ")),
            )
        }));
        records.sort_by_key(|d| d.line);
        records
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
            && self.line_width.is_empty()
            && self.trailing_whitespace.is_empty()
            && self.token_spacing.is_empty()
            && self.case_violations.is_empty()
    }
}
