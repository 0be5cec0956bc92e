/// `LogicalLines` - Converts cleaned physical lines to logical statements
///
/// This module handles:
/// - Joining line continuations (lines ending with &)
/// - Splitting semicolon-separated statements
/// - Splitting off numeric statement labels
/// - Buffering comment-only lines as docstring candidates
/// - Multiline strings (a literal left open continues the statement)
///
/// Docstring state belongs to one file: it is cleared whenever the source
/// file changes, and no continuation crosses a file boundary.
use std::collections::VecDeque;
use std::iter::Peekable;

use super::patterns::STATEMENT_LABEL_RE;
use super::tokenizer::{Token, TokenKind};

/// Index of the file a line came from (0 is the analyzed file, includes follow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub usize);

/// One physical line after preprocessing and normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub file: FileId,
    /// 1-based physical line number
    pub number: usize,
    /// Code tokens, lowercased except string literals, whitespace removed
    pub code: Vec<String>,
    /// Comment text (marker stripped) when the line holds no code
    pub comment: Option<String>,
    /// A string literal is still open at the end of the line
    pub open_string: bool,
}

impl SourceLine {
    /// Normalize a line's tokens for assembly
    ///
    /// Whitespace and directive tokens are dropped, code tokens are folded to
    /// lowercase, and a comment survives only on an otherwise empty line.
    #[must_use]
    pub fn from_tokens(
        file: FileId,
        number: usize,
        tokens: &[Token],
        open_string: bool,
        comment_marker: char,
    ) -> Self {
        let mut code = Vec::new();
        let mut comment = None;
        for token in tokens {
            match token.kind {
                TokenKind::Word | TokenKind::Operator => code.push(token.text.to_lowercase()),
                TokenKind::String => code.push(token.text.clone()),
                TokenKind::Comment => comment = Some(docstring_text(&token.text, comment_marker)),
                TokenKind::Directive | TokenKind::Whitespace => {}
            }
        }
        if !code.is_empty() {
            comment = None;
        }
        Self {
            file,
            number,
            code,
            comment,
            open_string,
        }
    }
}

/// Strip the comment marker and doc markers (`!>`, `!<`, `!!`) from a comment
fn docstring_text(comment: &str, marker: char) -> String {
    comment
        .trim_start_matches(marker)
        .trim_start_matches(['<', '>'])
        .trim()
        .to_string()
}

/// A complete logical statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub file: FileId,
    /// Physical line the statement starts on
    pub line: usize,
    /// Numeric statement label, if any
    pub label: Option<String>,
    pub tokens: Vec<String>,
}

impl Statement {
    /// Build a statement, splitting off a leading numeric label
    #[must_use]
    pub fn new(file: FileId, line: usize, mut tokens: Vec<String>) -> Self {
        let label = if tokens.len() > 1 && STATEMENT_LABEL_RE.is_match(&tokens[0]) {
            Some(tokens.remove(0))
        } else {
            None
        };
        Self {
            file,
            line,
            label,
            tokens,
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.token(0)
    }

    #[must_use]
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Statement text with tokens separated by single spaces
    #[must_use]
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    #[must_use]
    pub fn is_contains(&self) -> bool {
        self.tokens.len() == 1 && self.tokens[0] == "contains"
    }
}

/// Docstring state shared between the assembler and the parser
///
/// `pending` holds comment lines read but not yet attached to anything.
/// `last_variable` is the index, in the enclosing unit's variable list, of
/// the most recent declaration; later comments are appended to it.
#[derive(Debug, Default, Clone)]
pub struct DocSlots {
    pub pending: Vec<String>,
    pub last_variable: Option<usize>,
}

impl DocSlots {
    /// Take every pending docstring line
    pub fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}

/// `LogicalLines` yields statements from cleaned physical lines
///
/// The sequence is forward-only. [`LogicalLines::current`] holds the last
/// statement handed out, so a caller can inspect the line that stopped a
/// consuming loop before deciding how to branch.
pub struct LogicalLines {
    lines: Peekable<std::vec::IntoIter<SourceLine>>,
    /// Statements already split off a semicolon-separated line
    buffer: VecDeque<Statement>,
    current: Option<Statement>,
    /// File of the most recently read line
    file: Option<FileId>,
    pub docs: DocSlots,
}

impl LogicalLines {
    #[must_use]
    pub fn new(lines: Vec<SourceLine>) -> Self {
        Self {
            lines: lines.into_iter().peekable(),
            buffer: VecDeque::new(),
            current: None,
            file: None,
            docs: DocSlots::default(),
        }
    }

    /// The statement returned by the most recent call to `next_statement`
    #[must_use]
    pub fn current(&self) -> Option<&Statement> {
        self.current.as_ref()
    }

    /// Advance to the next statement
    ///
    /// Returns None at end of input, after which `current` is also None.
    pub fn next_statement(&mut self) -> Option<Statement> {
        while self.buffer.is_empty() {
            if !self.assemble() {
                break;
            }
        }
        self.current = self.buffer.pop_front();
        self.current.clone()
    }

    /// Read physical lines until one logical line is complete
    ///
    /// Returns false once the input is exhausted.
    fn assemble(&mut self) -> bool {
        let mut tokens: Vec<String> = Vec::new();
        let mut start = None;
        let mut read_any = false;

        while let Some(next) = self.lines.peek() {
            if self.file != Some(next.file) {
                // A statement in progress ends where its file ends
                if !tokens.is_empty() {
                    break;
                }
                self.file = Some(next.file);
                self.docs = DocSlots::default();
            }
            let Some(line) = self.lines.next() else {
                break;
            };
            read_any = true;
            if line.code.is_empty() {
                // Comment-only lines inside a continuation are skipped
                if let Some(comment) = line.comment {
                    if tokens.is_empty() {
                        self.docs.pending.push(comment);
                    }
                }
                continue;
            }

            let mut code = line.code;
            if !tokens.is_empty() && code.first().is_some_and(|t| t == "&") {
                code.remove(0);
            }
            let mut continued = code.last().is_some_and(|t| t == "&");
            if continued {
                code.pop();
            }
            continued |= line.open_string;

            start.get_or_insert((line.file, line.number));
            tokens.extend(code);

            if !continued {
                break;
            }
        }

        if let Some((file, number)) = start {
            for part in tokens.split(|t| t == ";") {
                if !part.is_empty() {
                    self.buffer
                        .push_back(Statement::new(file, number, part.to_vec()));
                }
            }
        }
        read_any
    }
}

/// Helper to build `LogicalLines` from source text (for testing)
#[cfg(test)]
pub(crate) fn lines_from_str(text: &str) -> LogicalLines {
    use super::tokenizer::{StringDelimiter, Tokenizer};

    let tokenizer = Tokenizer::default();
    let mut state = StringDelimiter::None;
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let result = tokenizer.tokenize(raw, state).unwrap();
        state = result.state;
        lines.push(SourceLine::from_tokens(
            FileId(0),
            idx + 1,
            &result.tokens,
            state.is_open(),
            '!',
        ));
    }
    LogicalLines::new(lines)
}
