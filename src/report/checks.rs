/// Per-line style checks
///
/// Pure functions over a raw line or its tokens. They never alter the token
/// stream; the [`Report`](super::Report) records what they find.
use std::collections::{BTreeMap, BTreeSet};

use crate::parser::tokenizer::{Token, TokenKind};

/// Which neighbours of an operator must be separated from it by whitespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    After,
    Both,
}

/// Operators that must not touch a word
const SPACING_RULES: &[(&str, Side)] = &[
    ("::", Side::Both),
    ("==", Side::Both),
    ("/=", Side::Both),
    ("<=", Side::Both),
    (">=", Side::Both),
    ("<", Side::Both),
    (">", Side::Both),
    ("=>", Side::Both),
    (",", Side::After),
];

/// Dotted tokens that are literals rather than operators
const LOGICAL_LITERALS: &[&str] = &[".true.", ".false."];

/// A line longer than the column limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthViolation {
    pub line: usize,
    pub width: usize,
}

/// An operator directly touching a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacingViolation {
    pub line: usize,
    pub column: usize,
    pub operator: String,
}

/// A lowercase spelling seen with more than one casing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseViolation {
    pub key: String,
    pub spellings: Vec<String>,
}

/// Width of a raw line in characters, if it exceeds `limit`
#[must_use]
pub fn line_width(raw: &str, limit: usize) -> Option<usize> {
    let width = raw.trim_end_matches(['\n', '\r']).chars().count();
    (width > limit).then_some(width)
}

/// Whether the last token of a line is a whitespace run
#[must_use]
pub fn has_trailing_whitespace(tokens: &[Token]) -> bool {
    tokens
        .last()
        .is_some_and(|t| t.kind == TokenKind::Whitespace)
}

/// Width of the leading whitespace of a line
#[must_use]
pub fn leading_indent(tokens: &[Token]) -> usize {
    match tokens.first() {
        Some(t) if t.kind == TokenKind::Whitespace => t.text.chars().count(),
        _ => 0,
    }
}

fn spacing_rule(token: &Token) -> Option<Side> {
    if token.kind != TokenKind::Operator {
        return None;
    }
    if let Some((_, side)) = SPACING_RULES.iter().find(|(op, _)| *op == token.text) {
        return Some(*side);
    }
    let lower = token.text.to_ascii_lowercase();
    (lower.len() > 2 && lower.starts_with('.') && !LOGICAL_LITERALS.contains(&lower.as_str()))
        .then_some(Side::Both)
}

/// Find operators that touch a word with no whitespace in between
///
/// Returns (column, operator) pairs.
#[must_use]
pub fn spacing_violations(tokens: &[Token]) -> Vec<(usize, String)> {
    let is_word = |idx: Option<usize>| {
        idx.and_then(|i| tokens.get(i))
            .is_some_and(|t| t.kind == TokenKind::Word)
    };

    tokens
        .iter()
        .enumerate()
        .filter_map(|(i, token)| {
            let side = spacing_rule(token)?;
            let before = side == Side::Both && is_word(i.checked_sub(1));
            let after = is_word(Some(i + 1));
            (before || after).then(|| (token.column, token.text.clone()))
        })
        .collect()
}

/// Add the casing of every code token to the case map
pub fn record_cases(cases: &mut BTreeMap<String, BTreeSet<String>>, tokens: &[Token]) {
    for token in tokens.iter().filter(|t| t.kind.is_code()) {
        if token.text.chars().any(|c| c.is_ascii_alphabetic()) {
            cases
                .entry(token.text.to_lowercase())
                .or_default()
                .insert(token.text.clone());
        }
    }
}

/// Keys spelled with more than one casing
#[must_use]
pub fn inconsistent_cases(cases: &BTreeMap<String, BTreeSet<String>>) -> Vec<CaseViolation> {
    cases
        .iter()
        .filter(|(_, spellings)| spellings.len() > 1)
        .map(|(key, spellings)| CaseViolation {
            key: key.clone(),
            spellings: spellings.iter().cloned().collect(),
        })
        .collect()
}
