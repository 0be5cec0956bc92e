//! Single-file analysis pipeline
//!
//! Implements the analysis of one source file:
//! - Scan: every physical line is width-checked, then either handled as a
//!   preprocessor directive or tokenized, style-checked, macro-substituted
//!   and normalized. Includes are scanned depth first into the same line
//!   sequence, each with its own [`Report`].
//! - Parse: the normalized lines are assembled into statements and parsed
//!   into a unit tree; parser diagnostics are routed back to the report of
//!   the file each statement came from.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, warn};

use super::project::{normalize, ProjectContext};
use crate::config::Config;
use crate::directive::{is_directive_line, parse_directive, resolve_include, Directive, MacroTable};
use crate::error::{AnalysisError, ParseResult};
use crate::parser::{FileId, LogicalLines, SourceLine, StringDelimiter, TokenKind, Tokenizer};
use crate::report::{Diagnostic, DiagnosticKind, DiagnosticSink, Report};
use crate::units::{Parser, Unit, UnitKind};
use crate::Result;

/// Result of analyzing one file
#[derive(Debug)]
pub struct Analysis {
    pub path: PathBuf,
    /// Path relative to the project root, or `path` when there is no project
    pub relative_path: PathBuf,
    pub units: Vec<Unit>,
    pub report: Report,
    /// Reports of included files, keyed by resolved path
    pub include_reports: BTreeMap<PathBuf, Report>,
    /// Macro table as it stood at the end of the file
    pub macros: MacroTable,
}

impl Analysis {
    /// Find a unit by kind and name anywhere in the file
    #[must_use]
    pub fn find_unit(&self, kind: UnitKind, name: &str) -> Option<&Unit> {
        self.units.iter().find_map(|unit| {
            if unit.kind == kind && unit.name.as_deref() == Some(name) {
                Some(unit)
            } else {
                unit.find(kind, name)
            }
        })
    }

    /// The main report followed by every include report
    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        std::iter::once(&self.report).chain(self.include_reports.values())
    }

    /// True when neither the file nor its includes have any finding
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.reports().all(Report::is_clean)
    }

    /// Style findings across the file and its includes
    #[must_use]
    pub fn style_count(&self) -> usize {
        self.reports()
            .flat_map(Report::records)
            .filter(|record| record.kind.is_style())
            .count()
    }

    /// Send every finding to a sink, returning how many were sent
    pub fn emit(&self, sink: &mut dyn DiagnosticSink) -> io::Result<usize> {
        let mut count = 0;
        for report in self.reports() {
            for record in report.records() {
                sink.emit(report.path(), &record)?;
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Find a unit by kind and name across every analyzed file
///
/// Unit names are stored lowercase, so `name` matches case-insensitively.
/// Files are searched in order and the first match wins.
#[must_use]
pub fn find_unit_in<'a>(
    analyses: &'a [Analysis],
    kind: UnitKind,
    name: &str,
) -> Option<(&'a Analysis, &'a Unit)> {
    let name = name.to_ascii_lowercase();
    analyses
        .iter()
        .find_map(|analysis| analysis.find_unit(kind, &name).map(|unit| (analysis, unit)))
}

/// Analyze a file on disk
///
/// Undecodable bytes are replaced rather than failing the read.
pub fn analyze_file(
    path: &Path,
    config: &Config,
    project: Option<&dyn ProjectContext>,
) -> Result<Analysis> {
    let bytes = std::fs::read(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    analyze_source(path, &text, config, project)
}

/// Analyze source text that belongs to `path`
///
/// `path` locates includes and names the report; it need not exist.
pub fn analyze_source(
    path: &Path,
    text: &str,
    config: &Config,
    project: Option<&dyn ProjectContext>,
) -> Result<Analysis> {
    let mut scanner = Scanner::new(config, project);
    scanner.reports.push(Report::new(path));
    scanner
        .scan(FileId(0), path, text)
        .with_context(|| path.display().to_string())?;

    let Scanner {
        lines,
        mut reports,
        macros,
        ..
    } = scanner;

    let output = Parser::new(LogicalLines::new(lines), config)
        .parse()
        .with_context(|| path.display().to_string())?;
    for (file, diagnostic) in output.diagnostics {
        if let Some(report) = reports.get_mut(file.0) {
            report.push(diagnostic);
        }
    }

    let mut reports = reports.into_iter();
    let report = reports.next().unwrap_or_else(|| Report::new(path));
    let mut include_reports: BTreeMap<PathBuf, Report> = BTreeMap::new();
    for included in reports {
        match include_reports.get_mut(&included.path) {
            // Included more than once: style findings repeat, parse findings do not
            Some(existing) => existing.diagnostics.extend(included.diagnostics),
            None => {
                include_reports.insert(included.path.clone(), included);
            }
        }
    }

    let relative_path = project.map_or_else(|| path.to_path_buf(), |p| p.relative_path(path));
    Ok(Analysis {
        path: path.to_path_buf(),
        relative_path,
        units: output.units,
        report,
        include_reports,
        macros,
    })
}

/// Encoding marker some editors put at the start of a file
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Line-level state for one analysis, shared across includes
struct Scanner<'a> {
    config: &'a Config,
    project: Option<&'a dyn ProjectContext>,
    tokenizer: Tokenizer,
    macros: MacroTable,
    lines: Vec<SourceLine>,
    /// Indexed by `FileId`
    reports: Vec<Report>,
    /// Files currently being scanned, outermost first
    include_stack: Vec<PathBuf>,
}

impl<'a> Scanner<'a> {
    fn new(config: &'a Config, project: Option<&'a dyn ProjectContext>) -> Self {
        Self {
            config,
            project,
            tokenizer: Tokenizer::new(config.comment_marker, config.directive_marker),
            macros: MacroTable::new(),
            lines: Vec::new(),
            reports: Vec::new(),
            include_stack: Vec::new(),
        }
    }

    fn report(&mut self, file: FileId) -> &mut Report {
        &mut self.reports[file.0]
    }

    fn scan(&mut self, file: FileId, path: &Path, text: &str) -> ParseResult<()> {
        self.include_stack.push(normalize(path));
        let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
        let mut state = StringDelimiter::None;

        for (idx, raw) in text.lines().enumerate() {
            let number = idx + 1;
            let line_length = self.config.line_length;
            self.report(file).check_line_width(raw, number, line_length);

            if self.config.preprocess
                && !state.is_open()
                && is_directive_line(raw, self.config.directive_marker)
            {
                self.directive(file, path, raw, number)?;
                continue;
            }

            let line = match self.tokenizer.tokenize(raw, state) {
                Ok(line) => line,
                Err(err) => {
                    if self.config.strict {
                        return Err(AnalysisError::Lex {
                            line: number,
                            column: err.column,
                            found: err.found,
                        });
                    }
                    self.report(file).push(
                        Diagnostic::new(DiagnosticKind::LexError, number, raw.trim())
                            .with_note(format!("cannot tokenize {:?} at column {}", err.found, err.column)),
                    );
                    state = StringDelimiter::None;
                    continue;
                }
            };
            state = line.state;

            let check_spacing = self.config.check_spacing;
            self.report(file).check_tokens(&line.tokens, number, check_spacing);
            if self.config.trace {
                for token in line
                    .tokens
                    .iter()
                    .filter(|t| t.kind == TokenKind::Word && self.macros.contains(&t.text))
                {
                    debug!("macro replacement: {} at line {number}", token.text);
                }
            }
            let tokens = self.macros.substitute(line.tokens);
            self.lines.push(SourceLine::from_tokens(
                file,
                number,
                &tokens,
                state.is_open(),
                self.config.comment_marker,
            ));
        }

        self.report(file).check_keyword_case();
        self.include_stack.pop();
        Ok(())
    }

    fn directive(&mut self, file: FileId, path: &Path, raw: &str, number: usize) -> ParseResult<()> {
        let Some(parsed) = parse_directive(raw, self.config.directive_marker) else {
            return Ok(());
        };
        if self.config.trace {
            debug!("directive: {}", raw.trim());
        }

        match parsed {
            Err(err) => {
                if self.config.strict {
                    return Err(AnalysisError::Structural {
                        line: number,
                        message: err.message,
                    });
                }
                warn!("{}:{number}: {}", path.display(), err.message);
                self.report(file).push(
                    Diagnostic::new(DiagnosticKind::MalformedDirective, number, raw.trim())
                        .with_note(err.message),
                );
            }
            Ok(Directive::Define { name, value }) => {
                if let Err(err) = self.macros.define(&name, value.as_deref(), &self.tokenizer) {
                    if self.config.strict {
                        return Err(AnalysisError::Lex {
                            line: number,
                            column: err.column,
                            found: err.found,
                        });
                    }
                    warn!("{}:{number}: cannot tokenize value of {name}", path.display());
                    self.report(file).push(
                        Diagnostic::new(DiagnosticKind::MalformedDirective, number, raw.trim())
                            .with_note(format!("cannot tokenize {:?} in macro value", err.found)),
                    );
                }
            }
            Ok(Directive::Undef { name }) => {
                if !self.macros.undef(&name) {
                    warn!("{}:{number}: undef of unset macro {name}", path.display());
                    self.report(file)
                        .push(Diagnostic::new(DiagnosticKind::UndefinedMacro, number, name));
                }
            }
            Ok(Directive::Include { target }) => self.include(file, path, &target, number)?,
            Ok(Directive::Unsupported { name }) => {
                warn!("{}:{number}: unsupported directive {name}", path.display());
                self.report(file).push(
                    Diagnostic::new(DiagnosticKind::UnsupportedDirective, number, raw.trim())
                        .with_note("directive ignored"),
                );
            }
        }
        Ok(())
    }

    /// Resolve an include and scan it in place
    fn include(&mut self, file: FileId, path: &Path, target: &str, number: usize) -> ParseResult<()> {
        let mut search_dirs = self.config.include_dirs.clone();
        if let Some(project) = self.project {
            search_dirs.extend(project.include_dirs().iter().cloned());
        }

        let project = self.project;
        let join = |dir: &Path, relative: &Path| match project {
            Some(project) => project.join(dir, relative),
            None => normalize(&dir.join(relative)),
        };
        let Some(resolved) = resolve_include(target, path.parent(), &search_dirs, join) else {
            warn!("{}:{number}: include file {target} not found", path.display());
            self.report(file).push(
                Diagnostic::new(DiagnosticKind::MissingInclude, number, target)
                    .with_note("include skipped"),
            );
            return Ok(());
        };

        if self.include_stack.contains(&resolved) {
            warn!("{}:{number}: {} includes itself", path.display(), resolved.display());
            self.report(file).push(
                Diagnostic::new(DiagnosticKind::IncludeCycle, number, target)
                    .with_note(format!("{} is already being read", resolved.display())),
            );
            return Ok(());
        }

        let bytes = std::fs::read(&resolved).map_err(|source| AnalysisError::Io {
            path: resolved.clone(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        if self.config.trace {
            debug!("include: {}", resolved.display());
        }

        let id = FileId(self.reports.len());
        self.reports.push(Report::new(resolved.clone()));
        self.scan(id, &resolved, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> Analysis {
        analyze_source(Path::new("test.f90"), text, &Config::default(), None).unwrap()
    }

    #[test]
    fn test_module_tree_and_report() {
        let analysis = analyze("module m\ncontains\nsubroutine s\ninteger :: x\nend subroutine\nend module\n");
        assert_eq!(analysis.units.len(), 1);
        assert!(analysis.find_unit(UnitKind::Subroutine, "s").is_some());
        assert!(analysis.find_unit(UnitKind::Module, "m").is_some());
        assert!(analysis.report.diagnostics.is_empty());
        assert_eq!(analysis.report.indents.len(), 6);
    }

    #[test]
    fn test_macro_substitution_reaches_parser() {
        let analysis = analyze("#define KIND_TYPE integer\nmodule m\nKIND_TYPE :: n\nend module\n");
        let module = &analysis.units[0];
        assert_eq!(module.variables[0].type_spec.name(), "integer");
        assert!(analysis.macros.contains("KIND_TYPE"));
    }

    #[test]
    fn test_preprocessing_disabled() {
        let config = Config {
            preprocess: false,
            ..Config::default()
        };
        let analysis = analyze_source(
            Path::new("test.f90"),
            "#define X 1\nmodule m\nend module\n",
            &config,
            None,
        )
        .unwrap();
        assert!(analysis.macros.is_empty());
        assert!(analysis.report.diagnostics.is_empty());
    }

    #[test]
    fn test_undef_unset_is_warning() {
        let analysis = analyze("#undef NOPE\nmodule m\nend module\n");
        assert_eq!(analysis.report.count(DiagnosticKind::UndefinedMacro), 1);
        assert_eq!(analysis.units.len(), 1);
    }

    #[test]
    fn test_unsupported_directive() {
        let analysis = analyze("#ifdef MPI\nmodule m\nend module\n");
        assert_eq!(analysis.report.count(DiagnosticKind::UnsupportedDirective), 1);
    }

    #[test]
    fn test_malformed_include_strict() {
        let config = Config {
            strict: true,
            ..Config::default()
        };
        let err = analyze_source(Path::new("test.f90"), "#include defs.inc\n", &config, None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::Structural { line: 1, .. })
        ));
    }

    #[test]
    fn test_lex_error_skips_line() {
        let analysis = analyze("module m\ninteger :: x `oops`\ninteger :: y\nend module\n");
        assert_eq!(analysis.report.count(DiagnosticKind::LexError), 1);
        assert_eq!(analysis.units[0].variables.len(), 1);
        assert_eq!(analysis.units[0].variables[0].name, "y");
    }

    #[test]
    fn test_lex_error_strict() {
        let config = Config {
            strict: true,
            ..Config::default()
        };
        let err = analyze_source(Path::new("test.f90"), "x = `y`\n", &config, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::Lex { line: 1, column: 5, .. })
        ));
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let analysis = analyze("\u{feff}module m\nend module\n");
        assert_eq!(analysis.units.len(), 1);
        assert_eq!(analysis.report.count(DiagnosticKind::LexError), 0);
        assert!(analysis.is_clean());
    }

    #[test]
    fn test_style_count_and_clean() {
        let analysis = analyze("module m\ninteger::a \nfrobnicate\nend module\n");
        assert!(!analysis.is_clean());
        // Trailing whitespace and operator spacing; the unresolved statement is not style
        assert_eq!(analysis.style_count(), 2);
        assert_eq!(analysis.report.grammar_mismatches().count(), 1);
    }

    #[test]
    fn test_find_unit_across_files() {
        let analyses = vec![
            analyze_source(Path::new("a.f90"), "module a\nend module\n", &Config::default(), None)
                .unwrap(),
            analyze_source(
                Path::new("b.f90"),
                "module b\ncontains\nsubroutine helper\nend subroutine\nend module\n",
                &Config::default(),
                None,
            )
            .unwrap(),
        ];

        let (owner, unit) = find_unit_in(&analyses, UnitKind::Subroutine, "Helper").unwrap();
        assert_eq!(owner.path, PathBuf::from("b.f90"));
        assert_eq!(unit.name.as_deref(), Some("helper"));

        let (owner, _) = find_unit_in(&analyses, UnitKind::Module, "a").unwrap();
        assert_eq!(owner.path, PathBuf::from("a.f90"));
        assert!(find_unit_in(&analyses, UnitKind::Module, "helper").is_none());
    }

    #[test]
    fn test_emit_counts_records() {
        let analysis = analyze("module m\nfrobnicate\nend module \n");
        let mut sink: Vec<(PathBuf, Diagnostic)> = Vec::new();
        let count = analysis.emit(&mut sink).unwrap();
        assert_eq!(count, 2);
        assert_eq!(sink[0].1.kind, DiagnosticKind::GrammarMismatch);
        assert_eq!(sink[1].1.kind, DiagnosticKind::TrailingWhitespace);
    }
}
