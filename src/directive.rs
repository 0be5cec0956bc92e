//! Preprocessor directive handling for `#define`, `#undef` and `#include`
//!
//! Directive lines are intercepted before tokenization. `define` and `undef`
//! maintain a [`MacroTable`]; every later word token that names a macro is
//! replaced by the tokens of its value. Replacement is single-pass: tokens
//! produced by one expansion are never expanded again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::parser::patterns::{DIRECTIVE_BODY_RE, INCLUDE_TARGET_RE};
use crate::parser::tokenizer::{LexError, StringDelimiter, Token, TokenKind, Tokenizer};

/// A parsed directive line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `define NAME [VALUE]`; a missing value defines the name as empty
    Define { name: String, value: Option<String> },
    /// `undef NAME`
    Undef { name: String },
    /// `include "path"` or `include <path>`
    Include { target: String },
    /// Any other directive word (`if`, `ifdef`, `pragma`, ...)
    Unsupported { name: String },
}

/// Why a directive line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveError {
    pub message: String,
}

impl DirectiveError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Check if a line is a directive line (first non-blank character is the marker)
#[must_use]
pub fn is_directive_line(line: &str, marker: char) -> bool {
    line.trim_start().starts_with(marker)
}

/// Parse a directive line
///
/// # Returns
/// * `None` if the line is not a directive
/// * `Some(Err(_))` if the directive is malformed
#[must_use]
pub fn parse_directive(line: &str, marker: char) -> Option<Result<Directive, DirectiveError>> {
    let body = line.trim_start().strip_prefix(marker)?;
    Some(parse_directive_body(body))
}

fn parse_directive_body(body: &str) -> Result<Directive, DirectiveError> {
    let caps = DIRECTIVE_BODY_RE
        .captures(body)
        .ok_or_else(|| DirectiveError::new("missing directive name"))?;
    let name = caps[1].to_string();
    let args = caps.get(2).map_or("", |m| m.as_str());

    // At most one split is kept: the identifier, then the rest of the line
    let mut words = args.splitn(2, char::is_whitespace);
    let first = words.next().filter(|w| !w.is_empty());
    let rest = words.next().map(str::trim).filter(|w| !w.is_empty());

    match name.as_str() {
        "define" => {
            let macro_name = first.ok_or_else(|| DirectiveError::new("define without a name"))?;
            Ok(Directive::Define {
                name: macro_name.to_string(),
                value: rest.map(str::to_string),
            })
        }
        "undef" => {
            let macro_name = first.ok_or_else(|| DirectiveError::new("undef without a name"))?;
            Ok(Directive::Undef {
                name: macro_name.to_string(),
            })
        }
        "include" => {
            let target = first.ok_or_else(|| DirectiveError::new("include without a path"))?;
            let caps = INCLUDE_TARGET_RE.captures(target).ok_or_else(|| {
                DirectiveError::new(format!(
                    "include path {target} must be quoted as \"path\" or <path>"
                ))
            })?;
            let path = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            Ok(Directive::Include {
                target: path.to_string(),
            })
        }
        _ => Ok(Directive::Unsupported { name }),
    }
}

/// A macro definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// Replacement text; None when defined without a value
    pub value: Option<String>,
    tokens: Vec<Token>,
}

/// Identifier to replacement mapping built from `define`/`undef`
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    entries: HashMap<String, Macro>,
}

impl MacroTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a macro
    ///
    /// The value is tokenized once here, so a value that cannot be tokenized
    /// is rejected and the table is left unchanged.
    pub fn define(
        &mut self,
        name: &str,
        value: Option<&str>,
        tokenizer: &Tokenizer,
    ) -> Result<(), LexError> {
        let tokens = match value {
            Some(text) => tokenizer.tokenize(text, StringDelimiter::None)?.tokens,
            None => Vec::new(),
        };
        self.entries.insert(
            name.to_string(),
            Macro {
                value: value.map(str::to_string),
                tokens,
            },
        );
        Ok(())
    }

    /// Remove a macro, returning false if it was never defined
    pub fn undef(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every word token that names a macro by the macro's tokens
    ///
    /// Replacement tokens take the column of the token they replace.
    #[must_use]
    pub fn substitute(&self, tokens: Vec<Token>) -> Vec<Token> {
        if self.entries.is_empty() {
            return tokens;
        }
        let mut result = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.entries.get(&token.text) {
                Some(entry) if token.kind == TokenKind::Word => {
                    log::trace!("replacing {:?} with {:?}", token.text, entry.value);
                    result.extend(entry.tokens.iter().map(|t| Token {
                        column: token.column,
                        ..t.clone()
                    }));
                }
                _ => result.push(token),
            }
        }
        result
    }
}

/// Find an include target
///
/// The directory of the including file is searched first, then each search
/// directory in order. The first existing file wins. `join` builds each
/// candidate path from a directory and the target.
#[must_use]
pub fn resolve_include(
    target: &str,
    current_dir: Option<&Path>,
    search_dirs: &[PathBuf],
    join: impl Fn(&Path, &Path) -> PathBuf,
) -> Option<PathBuf> {
    let target = Path::new(target);
    current_dir
        .into_iter()
        .chain(search_dirs.iter().map(PathBuf::as_path))
        .map(|dir| join(dir, target))
        .find(|candidate| candidate.is_file())
}
