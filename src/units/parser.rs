/// Recursive-descent parser over logical statements
///
/// Each program unit is parsed in three parts: specification, execution and
/// subprograms. A part ends at the first statement it does not handle, and
/// that statement is handed to the next part. Statements that no part
/// handles are recorded as grammar mismatches and skipped.
use log::debug;

use super::construct::{
    construct_opening, is_branch, is_construct_end, Construct, ConstructExit, ConstructKind,
};
use super::declaration::{parse_namelist, parse_type_declaration};
use super::kinds::{
    find_unit_keyword, is_declaration_keyword, is_intrinsic_type, skip_group, unit_end,
    unit_opening, EndStatement, UnitKind, ACCESS_SPECS,
};
use super::unit::Unit;
use super::variable::Variable;
use crate::config::Config;
use crate::error::{AnalysisError, ParseResult};
use crate::parser::patterns::is_identifier;
use crate::parser::stream::{FileId, LogicalLines, Statement};
use crate::report::{Diagnostic, DiagnosticKind};

/// Units and diagnostics produced from one token stream
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub units: Vec<Unit>,
    /// Diagnostics tagged with the file the offending statement came from
    pub diagnostics: Vec<(FileId, Diagnostic)>,
}

pub struct Parser<'a> {
    lines: LogicalLines,
    config: &'a Config,
    diagnostics: Vec<(FileId, Diagnostic)>,
    depth: usize,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(lines: LogicalLines, config: &'a Config) -> Self {
        Self {
            lines,
            config,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    /// Parse every top-level unit in the stream
    ///
    /// # Errors
    /// Returns [`AnalysisError::DepthLimit`] when nesting exceeds the
    /// configured limit, and [`AnalysisError::Structural`] for malformed
    /// declarations in strict mode.
    pub fn parse(mut self) -> ParseResult<ParseOutput> {
        let mut units = Vec::new();
        while let Some(stmt) = self.lines.next_statement() {
            if let Some((idx, kind)) = unit_opening(&stmt.tokens) {
                units.push(self.parse_unit(stmt, idx, kind)?);
            } else {
                self.mismatch(&stmt, "outside any program unit");
            }
        }
        // Comments after the last terminator close out the final unit
        let trailing = self.lines.docs.take_pending();
        if let Some(last) = units.last_mut() {
            if !trailing.is_empty() {
                if !last.doc.footer.is_empty() {
                    last.doc.footer.push('\n');
                }
                last.doc.footer.push_str(&trailing.join("\n"));
            }
        }
        Ok(ParseOutput {
            units,
            diagnostics: self.diagnostics,
        })
    }

    fn parse_unit(&mut self, header: Statement, idx: usize, kind: UnitKind) -> ParseResult<Unit> {
        self.enter(header.line)?;

        let mut unit = Unit::new(kind, unit_name(&header.tokens, idx, kind), header.line);
        unit.doc.docstring = self.lines.docs.take_pending().join("\n");
        unit.doc.header = header.text();
        self.lines.docs.last_variable = None;
        self.trace(kind.keyword(), &header);

        let stopper = self.parse_specification(&mut unit)?;
        let stopper = self.parse_execution(&mut unit, stopper)?;
        self.parse_subprograms(&mut unit, &header, stopper)?;

        unit.doc.footer = self.lines.docs.take_pending().join("\n");
        self.lines.docs.last_variable = None;
        self.leave();
        Ok(unit)
    }

    /// Consume use, import, implicit and declaration statements
    ///
    /// Returns the first statement that is none of these.
    fn parse_specification(&mut self, unit: &mut Unit) -> ParseResult<Option<Statement>> {
        while let Some(stmt) = self.lines.next_statement() {
            let first = stmt.first().unwrap_or_default();
            match first {
                "use" => {
                    if let Some(module) = use_module(&stmt.tokens) {
                        unit.uses.push(module);
                    }
                    self.trace("use", &stmt);
                }
                "import" => self.trace("import", &stmt),
                "implicit" => self.trace("implicit", &stmt),
                _ if opens_subprogram(&stmt.tokens) => return Ok(Some(stmt)),
                word if is_declaration_keyword(word) => {
                    self.parse_declaration_construct(unit, stmt)?;
                }
                _ => return Ok(Some(stmt)),
            }
        }
        Ok(None)
    }

    fn parse_declaration_construct(&mut self, unit: &mut Unit, stmt: Statement) -> ParseResult<()> {
        let first = stmt.first().unwrap_or_default();
        let second = stmt.token(1);

        let opens_block = match first {
            "enum" | "interface" => true,
            "type" => second != Some("("),
            "abstract" => second == Some("interface"),
            _ => false,
        };
        if opens_block {
            if let Some((idx, kind)) = find_unit_keyword(&stmt.tokens) {
                let block = self.parse_unit(stmt, idx, kind)?;
                unit.blocks.push(block);
                return Ok(());
            }
        }

        if ACCESS_SPECS.contains(&first) || first == "data" || first == "parameter" {
            self.trace("specification", &stmt);
        } else if first == "namelist" {
            match parse_namelist(&stmt.tokens) {
                Ok(groups) => {
                    for (group, members) in groups {
                        unit.namelists.entry(group).or_default().extend(members);
                    }
                    self.trace("namelist", &stmt);
                }
                Err(message) => self.structural(&stmt, message)?,
            }
        } else if is_intrinsic_type(first) || first == "type" || first == "class" {
            match parse_type_declaration(&stmt.tokens) {
                Ok(decl) => {
                    for name in decl.names {
                        let var = Variable::new(name, decl.type_spec.clone(), decl.attributes.clone());
                        self.add_variable(unit, var);
                    }
                    self.trace("declaration", &stmt);
                }
                Err(message) => self.structural(&stmt, message)?,
            }
        } else {
            self.trace("specification", &stmt);
        }
        Ok(())
    }

    /// Attach pending docstrings and append a variable
    ///
    /// The last pending comment line documents the new variable. Earlier
    /// lines are appended to the previous variable of the unit, if any.
    fn add_variable(&mut self, unit: &mut Unit, mut var: Variable) {
        let mut pending = self.lines.docs.take_pending();
        let doc = pending.pop();

        let previous = self
            .lines
            .docs
            .last_variable
            .and_then(|idx| unit.variables.get_mut(idx));
        match previous {
            Some(prev) => prev.append_doc(&pending),
            None => var.append_doc(&pending),
        }
        if let Some(doc) = doc {
            var.append_doc(&[doc]);
        }

        unit.variables.push(var);
        self.lines.docs.last_variable = Some(unit.variables.len() - 1);
    }

    /// Consume executable statements
    ///
    /// Returns the `end` or `contains` statement that stopped the part, or
    /// None at end of input.
    fn parse_execution(
        &mut self,
        unit: &mut Unit,
        stopper: Option<Statement>,
    ) -> ParseResult<Option<Statement>> {
        if !unit.kind.has_execution_part() {
            return Ok(stopper);
        }

        let mut next = stopper;
        loop {
            let Some(stmt) = next.take().or_else(|| self.lines.next_statement()) else {
                return Ok(None);
            };
            if unit_end(&stmt.tokens).is_some() || stmt.is_contains() {
                return Ok(Some(stmt));
            }
            if let Some((label, kind)) = construct_opening(&stmt.tokens) {
                let (construct, exit) = self.parse_construct(stmt, label, kind)?;
                unit.constructs.push(construct);
                match exit {
                    ConstructExit::Closed => {}
                    ConstructExit::Interrupted(stmt) => next = Some(stmt),
                    ConstructExit::Eof => return Ok(None),
                }
                continue;
            }
            self.mismatch(&stmt, "execution part");
        }
    }

    fn parse_subprograms(
        &mut self,
        unit: &mut Unit,
        header: &Statement,
        stopper: Option<Statement>,
    ) -> ParseResult<()> {
        let mut next = stopper;
        loop {
            let Some(stmt) = next.take().or_else(|| self.lines.next_statement()) else {
                let name = unit.name.as_deref().unwrap_or("(anonymous)");
                self.push(
                    header.file,
                    Diagnostic::new(
                        DiagnosticKind::UnexpectedEof,
                        header.line,
                        format!("unterminated {} {name}", unit.kind),
                    ),
                );
                return Ok(());
            };

            if let Some(end) = unit_end(&stmt.tokens) {
                if let EndStatement::Kind(kind) = end {
                    if kind != unit.kind {
                        self.push(
                            stmt.file,
                            Diagnostic::new(DiagnosticKind::EndKindMismatch, stmt.line, stmt.text())
                                .with_note(format!("closes {} opened on line {}", unit.kind, unit.line)),
                        );
                    }
                }
                self.trace("end", &stmt);
                return Ok(());
            }
            if stmt.is_contains() {
                self.trace("contains", &stmt);
                continue;
            }
            if let Some((idx, kind)) = unit_opening(&stmt.tokens) {
                let child = self.parse_unit(stmt, idx, kind)?;
                unit.subprograms.push(child);
                continue;
            }
            if matches!(unit.kind, UnitKind::Type | UnitKind::Interface) && is_binding(&stmt.tokens) {
                self.trace("binding", &stmt);
                continue;
            }
            self.mismatch(&stmt, "subprogram part");
        }
    }

    fn parse_construct(
        &mut self,
        opening: Statement,
        label: Option<String>,
        kind: ConstructKind,
    ) -> ParseResult<(Construct, ConstructExit<Statement>)> {
        self.enter(opening.line)?;
        self.trace("construct", &opening);
        let mut construct = Construct::new(kind, label, opening.line, opening.text());

        let exit = loop {
            let Some(stmt) = self.lines.next_statement() else {
                break ConstructExit::Eof;
            };
            if is_construct_end(&stmt.tokens, kind) {
                break ConstructExit::Closed;
            }
            if is_branch(&stmt.tokens, kind) {
                construct.branches.push(stmt.text());
                continue;
            }
            if let Some((child_label, child_kind)) = construct_opening(&stmt.tokens) {
                let (child, child_exit) = self.parse_construct(stmt, child_label, child_kind)?;
                construct.children.push(child);
                match child_exit {
                    ConstructExit::Closed => continue,
                    other => break other,
                }
            }
            if unit_end(&stmt.tokens).is_some() || stmt.is_contains() || opens_subprogram(&stmt.tokens) {
                break ConstructExit::Interrupted(stmt);
            }
            construct.statements += 1;
            self.mismatch(&stmt, &format!("{kind} construct"));
        };

        if exit != ConstructExit::Closed {
            self.push(
                opening.file,
                Diagnostic::new(
                    DiagnosticKind::UnexpectedEof,
                    opening.line,
                    format!("unterminated {kind} construct"),
                ),
            );
        }
        self.leave();
        Ok((construct, exit))
    }

    fn enter(&mut self, line: usize) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(AnalysisError::DepthLimit {
                line,
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn push(&mut self, file: FileId, diagnostic: Diagnostic) {
        self.diagnostics.push((file, diagnostic));
    }

    fn mismatch(&mut self, stmt: &Statement, section: &str) {
        self.trace("unresolved", stmt);
        self.push(
            stmt.file,
            Diagnostic::new(DiagnosticKind::GrammarMismatch, stmt.line, stmt.text()).with_note(section),
        );
    }

    /// Malformed statement structure: an error in strict mode, a mismatch otherwise
    fn structural(&mut self, stmt: &Statement, message: String) -> ParseResult<()> {
        if self.config.strict {
            return Err(AnalysisError::Structural {
                line: stmt.line,
                message,
            });
        }
        self.trace("unresolved", stmt);
        self.push(
            stmt.file,
            Diagnostic::new(DiagnosticKind::GrammarMismatch, stmt.line, stmt.text()).with_note(message),
        );
        Ok(())
    }

    fn trace(&self, tag: &str, stmt: &Statement) {
        if self.config.trace {
            debug!("{tag}: {}", stmt.text());
        }
    }
}

/// Unit openings that start a new scope of code
fn opens_subprogram(tokens: &[String]) -> bool {
    unit_opening(tokens).is_some_and(|(_, kind)| kind.is_subprogram())
}

/// Procedure binding statements allowed after `contains` in a type or in an interface body
fn is_binding(tokens: &[String]) -> bool {
    match tokens.first().map(String::as_str) {
        Some("procedure" | "generic" | "final") => true,
        Some("module") => tokens.get(1).is_some_and(|t| t == "procedure"),
        _ => false,
    }
}

/// Module named by a use statement
fn use_module(tokens: &[String]) -> Option<String> {
    let idx = tokens.iter().position(|t| t == "::").map_or(1, |pos| pos + 1);
    tokens.get(idx).filter(|t| is_identifier(t)).cloned()
}

/// Name of a unit from its header
///
/// A `::` separator takes precedence (`type, public :: t`). Submodules skip
/// their parent group, `block data` skips `data`, and generic interfaces
/// keep the whole `operator(+)` spelling.
fn unit_name(tokens: &[String], idx: usize, kind: UnitKind) -> Option<String> {
    if let Some(pos) = tokens.iter().position(|t| t == "::") {
        return tokens.get(pos + 1).filter(|t| is_identifier(t)).cloned();
    }

    let mut i = idx + 1;
    match kind {
        UnitKind::Submodule if tokens.get(i).is_some_and(|t| t == "(") => {
            i = skip_group(tokens, i)?;
        }
        UnitKind::Block if tokens.get(i).is_some_and(|t| t == "data") => i += 1,
        UnitKind::Interface
            if tokens
                .get(i)
                .is_some_and(|t| t == "operator" || t == "assignment") =>
        {
            let end = skip_group(tokens, i + 1)?;
            return Some(tokens[i..end].concat());
        }
        _ => {}
    }
    tokens.get(i).filter(|t| is_identifier(t)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::stream::lines_from_str;
    use crate::units::variable::TypeSpec;

    fn parse_with(text: &str, config: &Config) -> ParseOutput {
        Parser::new(lines_from_str(text), config).parse().unwrap()
    }

    fn parse(text: &str) -> ParseOutput {
        parse_with(text, &Config::default())
    }

    fn kinds(output: &ParseOutput) -> Vec<DiagnosticKind> {
        output.diagnostics.iter().map(|(_, d)| d.kind).collect()
    }

    #[test]
    fn test_subroutine_end_forms() {
        for end in ["end", "end subroutine", "end subroutine foo", "endsubroutine"] {
            let output = parse(&format!("subroutine foo(x)\n{end}\n"));
            assert_eq!(output.units.len(), 1, "{end}");
            assert_eq!(output.units[0].kind, UnitKind::Subroutine);
            assert_eq!(output.units[0].name.as_deref(), Some("foo"));
            assert!(output.diagnostics.is_empty(), "{end}");
        }
    }

    #[test]
    fn test_module_with_subroutine() {
        let output = parse(
            "module m\n\
             contains\n\
             subroutine s\n\
             integer :: x\n\
             frobnicate x\n\
             end subroutine s\n\
             end module m\n",
        );
        assert_eq!(output.units.len(), 1);
        let module = &output.units[0];
        assert_eq!(module.depth(), 2);
        let sub = &module.subprograms[0];
        assert_eq!(sub.variables.len(), 1);
        assert_eq!(sub.variables[0].type_spec, TypeSpec::Intrinsic("integer".into()));
        assert_eq!(kinds(&output), vec![DiagnosticKind::GrammarMismatch]);
        assert_eq!(output.diagnostics[0].1.line, 5);
    }

    #[test]
    fn test_function_with_prefix() {
        let output = parse("pure real(8) function norm(v) result(r)\nend function\n");
        let unit = &output.units[0];
        assert_eq!(unit.kind, UnitKind::Function);
        assert_eq!(unit.name.as_deref(), Some("norm"));
        assert_eq!(unit.doc.header, "pure real ( 8 ) function norm ( v ) result ( r )");
    }

    #[test]
    fn test_specification_statements() {
        let output = parse(
            "module m\n\
             use iso_fortran_env, only: real64\n\
             use, intrinsic :: iso_c_binding\n\
             implicit none\n\
             private\n\
             integer, parameter :: n = 3\n\
             namelist /grp1/ a, b /grp2/ c\n\
             end module\n",
        );
        let module = &output.units[0];
        assert_eq!(module.uses, vec!["iso_fortran_env", "iso_c_binding"]);
        assert_eq!(module.variables.len(), 1);
        assert_eq!(module.namelists["grp1"], vec!["a", "b"]);
        assert_eq!(module.namelists["grp2"], vec!["c"]);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_type_block() {
        let output = parse(
            "module m\n\
             type, public :: point\n\
             real :: x, y\n\
             contains\n\
             procedure :: norm\n\
             end type point\n\
             end module m\n",
        );
        let module = &output.units[0];
        assert_eq!(module.blocks.len(), 1);
        let block = &module.blocks[0];
        assert_eq!(block.kind, UnitKind::Type);
        assert_eq!(block.name.as_deref(), Some("point"));
        assert_eq!(block.variables.len(), 2);
        assert!(output.diagnostics.is_empty());
        assert!(module.find(UnitKind::Type, "point").is_some());
    }

    #[test]
    fn test_interface_block() {
        let output = parse(
            "module m\n\
             interface norm\n\
             module procedure norm2, norm3\n\
             end interface\n\
             abstract interface\n\
             subroutine cb(x)\n\
             real :: x\n\
             end subroutine\n\
             end interface\n\
             end module\n",
        );
        let module = &output.units[0];
        assert_eq!(module.blocks.len(), 2);
        assert_eq!(module.blocks[0].name.as_deref(), Some("norm"));
        assert_eq!(module.blocks[1].subprograms[0].name.as_deref(), Some("cb"));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_constructs_nest() {
        let output = parse(
            "subroutine s\n\
             outer: do i = 1, n\n\
             if (i > 2) then\n\
             exit outer\n\
             else\n\
             cycle\n\
             end if\n\
             end do outer\n\
             end subroutine\n",
        );
        let unit = &output.units[0];
        assert_eq!(unit.constructs.len(), 1);
        let outer = &unit.constructs[0];
        assert_eq!(outer.label.as_deref(), Some("outer"));
        assert_eq!(outer.children[0].kind, ConstructKind::If);
        assert_eq!(outer.children[0].branches, vec!["else"]);
        assert_eq!(outer.children[0].statements, 2);
        // exit and cycle are not classified
        assert_eq!(kinds(&output), vec![DiagnosticKind::GrammarMismatch; 2]);
    }

    #[test]
    fn test_unterminated_construct_is_interrupted() {
        let output = parse("subroutine s\ndo i = 1, n\nend subroutine\n");
        assert_eq!(output.units.len(), 1);
        assert_eq!(kinds(&output), vec![DiagnosticKind::UnexpectedEof]);
        assert_eq!(output.diagnostics[0].1.line, 2);
    }

    #[test]
    fn test_unterminated_unit() {
        let output = parse("module m\ninteger :: x\n");
        assert_eq!(output.units[0].variables.len(), 1);
        assert_eq!(kinds(&output), vec![DiagnosticKind::UnexpectedEof]);
    }

    #[test]
    fn test_end_kind_mismatch_is_accepted() {
        let output = parse("function f(x)\nend subroutine\n");
        assert_eq!(output.units.len(), 1);
        assert_eq!(kinds(&output), vec![DiagnosticKind::EndKindMismatch]);
    }

    #[test]
    fn test_statement_outside_unit() {
        let output = parse("x = 1\n");
        assert!(output.units.is_empty());
        assert_eq!(kinds(&output), vec![DiagnosticKind::GrammarMismatch]);
    }

    #[test]
    fn test_malformed_namelist_recoverable() {
        let output = parse("module m\nnamelist grp a\ninteger :: y\nend module\n");
        assert_eq!(output.units[0].variables.len(), 1);
        assert_eq!(kinds(&output), vec![DiagnosticKind::GrammarMismatch]);
    }

    #[test]
    fn test_malformed_namelist_strict() {
        let config = Config {
            strict: true,
            ..Config::default()
        };
        let result = Parser::new(lines_from_str("module m\nnamelist grp a\nend module\n"), &config).parse();
        assert!(matches!(result, Err(AnalysisError::Structural { line: 2, .. })));
    }

    #[test]
    fn test_depth_limit() {
        let config = Config {
            max_depth: 2,
            ..Config::default()
        };
        let text = "subroutine s\ndo\ndo\nend do\nend do\nend subroutine\n";
        let result = Parser::new(lines_from_str(text), &config).parse();
        assert!(matches!(result, Err(AnalysisError::DepthLimit { line: 3, limit: 2 })));
    }

    #[test]
    fn test_docstrings() {
        let output = parse(
            "!> Module docs\n\
             module m\n\
             !> doc for a\n\
             integer :: a\n\
             !> more about a\n\
             !> doc for b\n\
             integer :: b\n\
             ! footer\n\
             end module\n",
        );
        let module = &output.units[0];
        assert_eq!(module.doc.docstring, "Module docs");
        assert_eq!(module.variables[0].doc, "doc for a\nmore about a");
        assert_eq!(module.variables[1].doc, "doc for b");
        assert_eq!(module.doc.footer, "footer");
    }

    #[test]
    fn test_trailing_comments_join_last_footer() {
        let output = parse(
            "module a\nend module\n! between\nmodule b\n! inside\nend module\n! end of file\n! really\n",
        );
        assert_eq!(output.units[0].doc.footer, "");
        assert_eq!(output.units[1].doc.docstring, "between");
        assert_eq!(output.units[1].doc.footer, "inside\nend of file\nreally");
    }

    #[test]
    fn test_unit_names() {
        let names = |text: &str| {
            let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
            let (idx, kind) = find_unit_keyword(&tokens).unwrap();
            unit_name(&tokens, idx, kind)
        };
        assert_eq!(names("submodule ( parent ) child"), Some("child".to_string()));
        assert_eq!(names("block data init"), Some("init".to_string()));
        assert_eq!(names("interface operator ( + )"), Some("operator(+)".to_string()));
        assert_eq!(names("type , extends ( base ) :: derived"), Some("derived".to_string()));
        assert_eq!(names("program"), None);
        assert_eq!(names("abstract interface"), None);
    }
}
