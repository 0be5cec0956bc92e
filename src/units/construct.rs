/// Executable block constructs
///
/// Recognition only: openings, branch markers (`else`, `case`, ...) and
/// terminators. The parser drives the recursion.
use std::fmt;

use super::kinds::skip_group;
use crate::parser::patterns::{is_identifier, STATEMENT_LABEL_RE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructKind {
    Do,
    If,
    /// `select case`, `select type` and `select rank`
    Select,
    Where,
    Forall,
    Associate,
    Block,
    Critical,
    ChangeTeam,
}

impl ConstructKind {
    /// Word that follows `end` in the terminator
    #[must_use]
    pub fn end_word(self) -> &'static str {
        match self {
            ConstructKind::Do => "do",
            ConstructKind::If => "if",
            ConstructKind::Select => "select",
            ConstructKind::Where => "where",
            ConstructKind::Forall => "forall",
            ConstructKind::Associate => "associate",
            ConstructKind::Block => "block",
            ConstructKind::Critical => "critical",
            ConstructKind::ChangeTeam => "team",
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstructKind::ChangeTeam => "change team",
            other => other.end_word(),
        };
        f.write_str(name)
    }
}

/// A parsed executable construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construct {
    pub kind: ConstructKind,
    /// `name:` prefix of the opening statement
    pub label: Option<String>,
    pub line: usize,
    /// Opening statement text
    pub header: String,
    /// Branch statements (`else`, `case (1)`, ...) in order
    pub branches: Vec<String>,
    pub children: Vec<Construct>,
    /// Plain statements directly inside this construct
    pub statements: usize,
}

impl Construct {
    #[must_use]
    pub fn new(kind: ConstructKind, label: Option<String>, line: usize, header: String) -> Self {
        Self {
            kind,
            label,
            line,
            header,
            branches: Vec::new(),
            children: Vec::new(),
            statements: 0,
        }
    }
}

/// How parsing of a construct stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructExit<S> {
    /// Matching terminator found
    Closed,
    /// A statement that belongs to an enclosing unit was reached; the caller
    /// must examine it
    Interrupted(S),
    /// Input ended
    Eof,
}

/// Split a `name:` construct label off a statement
#[must_use]
pub fn split_label(tokens: &[String]) -> (Option<&str>, &[String]) {
    match tokens {
        [label, colon, rest @ ..] if colon == ":" && !rest.is_empty() && is_identifier(label) => {
            (Some(label.as_str()), rest)
        }
        _ => (None, tokens),
    }
}

/// Whether a parenthesized group starting at `start` runs to the end
fn group_ends_statement(tokens: &[String], start: usize) -> bool {
    tokens.get(start).is_some_and(|t| t == "(") && skip_group(tokens, start) == Some(tokens.len())
}

/// Classify a statement as a construct opening
#[must_use]
pub fn construct_opening(tokens: &[String]) -> Option<(Option<String>, ConstructKind)> {
    let (label, body) = split_label(tokens);
    let first = body.first()?.as_str();
    let second = body.get(1).map(String::as_str);

    let kind = match first {
        // `do 10 i = 1, n` is a labelled non-block loop
        "do" if !second.is_some_and(|w| STATEMENT_LABEL_RE.is_match(w)) => ConstructKind::Do,
        "if" if second == Some("(") && body.last().is_some_and(|t| t == "then") => {
            ConstructKind::If
        }
        "select" if matches!(second, Some("case" | "type" | "rank")) => ConstructKind::Select,
        "selectcase" | "selecttype" | "selectrank" => ConstructKind::Select,
        "where" if group_ends_statement(body, 1) => ConstructKind::Where,
        "forall" if group_ends_statement(body, 1) => ConstructKind::Forall,
        "associate" if second == Some("(") => ConstructKind::Associate,
        "block" if second.is_none() => ConstructKind::Block,
        "critical" if second.is_none() || second == Some("(") => ConstructKind::Critical,
        "change" if second == Some("team") => ConstructKind::ChangeTeam,
        "changeteam" => ConstructKind::ChangeTeam,
        _ => return None,
    };
    Some((label.map(str::to_string), kind))
}

/// Whether a statement is a branch marker of `kind`
#[must_use]
pub fn is_branch(tokens: &[String], kind: ConstructKind) -> bool {
    let first = tokens.first().map_or("", String::as_str);
    let second = tokens.get(1).map(String::as_str);
    match kind {
        ConstructKind::If => first == "else" || first == "elseif",
        ConstructKind::Select => match first {
            "case" | "rank" | "typeis" | "classis" | "classdefault" => true,
            "type" => second == Some("is"),
            "class" => matches!(second, Some("is" | "default")),
            _ => false,
        },
        ConstructKind::Where => first == "elsewhere" || (first == "else" && second == Some("where")),
        _ => false,
    }
}

/// Whether a statement terminates a construct of `kind`
#[must_use]
pub fn is_construct_end(tokens: &[String], kind: ConstructKind) -> bool {
    let word = kind.end_word();
    match tokens.first().map(String::as_str) {
        Some("end") => tokens.get(1).is_some_and(|t| t == word),
        Some(first) => first.strip_prefix("end") == Some(word),
        None => false,
    }
}
