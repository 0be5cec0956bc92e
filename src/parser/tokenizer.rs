/// `Tokenizer` - Splits one physical line into classified tokens
///
/// Whitespace, string literals and comments are kept verbatim so that the
/// style checks can see the line exactly as written. String state is carried
/// across lines: a quote left open at the end of one line makes the next
/// line start inside the same literal.
use super::patterns::DOTTED_OPERATOR_RE;

/// Operators made of two characters, matched before single characters
const DOUBLE_OPERATORS: &[&str] = &["**", "//", "::", "=>", "==", "/=", "<=", ">="];

/// Single-character operators and punctuation
const SINGLE_OPERATORS: &str = "()[],=+-*/%&;:<>";

/// Type of string delimiter we're currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringDelimiter {
    #[default]
    None,
    Single, // '...'
    Double, // "..."
}

impl StringDelimiter {
    fn from_quote(c: char) -> Option<Self> {
        match c {
            '\'' => Some(StringDelimiter::Single),
            '"' => Some(StringDelimiter::Double),
            _ => None,
        }
    }

    fn quote(self) -> Option<char> {
        match self {
            StringDelimiter::None => None,
            StringDelimiter::Single => Some('\''),
            StringDelimiter::Double => Some('"'),
        }
    }

    /// Check if a string literal is still open
    #[must_use]
    pub fn is_open(self) -> bool {
        self != StringDelimiter::None
    }
}

/// Token classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Names, keywords and numeric literals
    Word,
    /// Operators and punctuation, including dotted operators like `.and.`
    Operator,
    /// Quoted literal, or the fragment of one continued from a previous line
    String,
    /// Comment marker through end of line
    Comment,
    /// Preprocessor directive line
    Directive,
    Whitespace,
}

impl TokenKind {
    /// Whether the token takes part in statements (and in case folding)
    #[must_use]
    pub fn is_code(self) -> bool {
        matches!(self, TokenKind::Word | TokenKind::Operator)
    }
}

/// A classified span of one physical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    /// 1-based character column of the first character
    pub column: usize,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, column: usize) -> Self {
        Self {
            text: text.into(),
            kind,
            column,
        }
    }

    fn from_chars(kind: TokenKind, chars: &[char], start: usize) -> Self {
        Self::new(kind, chars.iter().collect::<String>(), start + 1)
    }
}

/// Tokens of one line plus the string state left for the next line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    pub tokens: Vec<Token>,
    pub state: StringDelimiter,
}

/// A character that no token class accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    /// 1-based character column
    pub column: usize,
    pub found: char,
}

/// Line tokenizer with configurable comment and directive markers
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    comment_marker: char,
    directive_marker: char,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new('!', '#')
    }
}

impl Tokenizer {
    #[must_use]
    pub fn new(comment_marker: char, directive_marker: char) -> Self {
        Self {
            comment_marker,
            directive_marker,
        }
    }

    /// Tokenize one physical line (without its newline)
    ///
    /// # Arguments
    /// * `line` - The raw line
    /// * `state` - String state carried over from the previous line
    pub fn tokenize(&self, line: &str, state: StringDelimiter) -> Result<LineTokens, LexError> {
        let chars: Vec<char> = line.chars().collect();
        let len = chars.len();
        let mut tokens = Vec::new();
        let mut state = state;
        let mut i = 0;

        // Remainder of a literal opened on a previous line
        if let Some(quote) = state.quote() {
            let (end, closed) = scan_string_body(&chars, 0, quote);
            if end > 0 {
                tokens.push(Token::from_chars(TokenKind::String, &chars[..end], 0));
            }
            if !closed {
                return Ok(LineTokens { tokens, state });
            }
            state = StringDelimiter::None;
            i = end;
        }

        while i < len {
            let c = chars[i];
            let start = i;

            let kind = if is_blank(c) {
                while i < len && is_blank(chars[i]) {
                    i += 1;
                }
                TokenKind::Whitespace
            } else if c == self.comment_marker {
                i = len;
                TokenKind::Comment
            } else if c == self.directive_marker
                && tokens.iter().all(|t| t.kind == TokenKind::Whitespace)
            {
                i = len;
                TokenKind::Directive
            } else if let Some(delimiter) = StringDelimiter::from_quote(c) {
                let (end, closed) = scan_string_body(&chars, i + 1, c);
                i = end;
                if !closed {
                    state = delimiter;
                }
                TokenKind::String
            } else if c.is_ascii_digit() {
                i = scan_number(&chars, i);
                TokenKind::Word
            } else if is_word_char(c) {
                while i < len && is_word_char(chars[i]) {
                    i += 1;
                }
                TokenKind::Word
            } else if c == '.' {
                let rest: String = chars[i..].iter().collect();
                if let Some(m) = DOTTED_OPERATOR_RE.find(&rest) {
                    i += m.as_str().chars().count();
                    TokenKind::Operator
                } else if chars.get(i + 1).is_some_and(char::is_ascii_digit) {
                    i = scan_number(&chars, i);
                    TokenKind::Word
                } else {
                    return Err(LexError {
                        column: i + 1,
                        found: c,
                    });
                }
            } else if let Some(width) = operator_width(&chars[i..]) {
                i += width;
                TokenKind::Operator
            } else {
                return Err(LexError {
                    column: i + 1,
                    found: c,
                });
            };

            tokens.push(Token::from_chars(kind, &chars[start..i], start));
        }

        Ok(LineTokens { tokens, state })
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0c')
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Scan a string body starting at `from`, returning (end, closed)
///
/// A doubled quote inside the literal is an escaped quote.
fn scan_string_body(chars: &[char], from: usize, quote: char) -> (usize, bool) {
    let mut i = from;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return (i + 1, true);
        }
        i += 1;
    }
    (chars.len(), false)
}

/// Scan a numeric literal: digits, fraction, exponent and `_kind` suffix
fn scan_number(chars: &[char], start: usize) -> usize {
    let len = chars.len();
    let mut i = start;
    while i < len && chars[i].is_ascii_digit() {
        i += 1;
    }

    // Fraction, unless the dot opens an operator as in `1.eq.x`
    if i < len && chars[i] == '.' {
        let rest: String = chars[i..].iter().collect();
        if !DOTTED_OPERATOR_RE.is_match(&rest) {
            i += 1;
            while i < len && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    // Exponent: e, d or q with optional sign
    if i < len && matches!(chars[i].to_ascii_lowercase(), 'e' | 'd' | 'q') {
        let mut j = i + 1;
        if j < len && matches!(chars[j], '+' | '-') {
            j += 1;
        }
        if j < len && chars[j].is_ascii_digit() {
            i = j;
            while i < len && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    // Kind suffix (1.0_dp) or a name that happens to start with digits
    while i < len && is_word_char(chars[i]) {
        i += 1;
    }
    i
}

fn operator_width(rest: &[char]) -> Option<usize> {
    if rest.len() >= 2 {
        let pair: String = rest[..2].iter().collect();
        if DOUBLE_OPERATORS.contains(&pair.as_str()) {
            return Some(2);
        }
    }
    rest.first()
        .filter(|c| SINGLE_OPERATORS.contains(**c))
        .map(|_| 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        Tokenizer::default()
            .tokenize(line, StringDelimiter::None)
            .unwrap()
            .tokens
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    fn kinds(line: &str) -> Vec<TokenKind> {
        Tokenizer::default()
            .tokenize(line, StringDelimiter::None)
            .unwrap()
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_assignment() {
        assert_eq!(texts("x = 5"), vec!["x", " ", "=", " ", "5"]);
        assert_eq!(
            kinds("x = 5"),
            vec![
                TokenKind::Word,
                TokenKind::Whitespace,
                TokenKind::Operator,
                TokenKind::Whitespace,
                TokenKind::Word
            ]
        );
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            texts("integer, dimension(10) :: a"),
            vec!["integer", ",", " ", "dimension", "(", "10", ")", " ", "::", " ", "a"]
        );
    }

    #[test]
    fn test_double_operators() {
        assert_eq!(texts("a**2//b"), vec!["a", "**", "2", "//", "b"]);
        assert_eq!(texts("p=>q"), vec!["p", "=>", "q"]);
        assert_eq!(texts("x/=y"), vec!["x", "/=", "y"]);
    }

    #[test]
    fn test_string_kept_verbatim() {
        let tokens = Tokenizer::default()
            .tokenize("s = 'It''s ! not a comment'", StringDelimiter::None)
            .unwrap();
        let last = tokens.tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::String);
        assert_eq!(last.text, "'It''s ! not a comment'");
        assert_eq!(tokens.state, StringDelimiter::None);
    }

    #[test]
    fn test_comment_consumes_rest_of_line() {
        let tokens = Tokenizer::default()
            .tokenize("x = 1  ! Set X", StringDelimiter::None)
            .unwrap()
            .tokens;
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Comment);
        assert_eq!(last.text, "! Set X");
        assert_eq!(last.column, 8);
    }

    #[test]
    fn test_configured_comment_marker() {
        let tokenizer = Tokenizer::new('%', '#');
        let tokens = tokenizer.tokenize("x % note", StringDelimiter::None).unwrap();
        assert_eq!(tokens.tokens.last().unwrap().kind, TokenKind::Comment);
    }

    #[test]
    fn test_unterminated_string_carries_state() {
        let tokenizer = Tokenizer::default();
        let first = tokenizer.tokenize("msg = \"hello &", StringDelimiter::None).unwrap();
        assert_eq!(first.state, StringDelimiter::Double);
        assert_eq!(first.tokens.last().unwrap().text, "\"hello &");

        let second = tokenizer.tokenize("  &world\" ! done", first.state).unwrap();
        assert_eq!(second.state, StringDelimiter::None);
        assert_eq!(second.tokens[0].kind, TokenKind::String);
        assert_eq!(second.tokens[0].text, "  &world\"");
        assert_eq!(second.tokens.last().unwrap().kind, TokenKind::Comment);
    }

    #[test]
    fn test_directive_only_at_line_start() {
        assert_eq!(kinds("  #define X 1"), vec![TokenKind::Whitespace, TokenKind::Directive]);
        let err = Tokenizer::default()
            .tokenize("x = #y", StringDelimiter::None)
            .unwrap_err();
        assert_eq!(err, LexError { column: 5, found: '#' });
    }

    #[test]
    fn test_dotted_operators() {
        assert_eq!(texts("a.and.b"), vec!["a", ".and.", "b"]);
        assert_eq!(texts("if (i.EQ.1)"), vec!["if", " ", "(", "i", ".EQ.", "1", ")"]);
        assert_eq!(texts("1.eq.x"), vec!["1", ".eq.", "x"]);
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(texts("1.5d-3"), vec!["1.5d-3"]);
        assert_eq!(texts("x=.5"), vec!["x", "=", ".5"]);
        assert_eq!(texts("1.0_dp+2"), vec!["1.0_dp", "+", "2"]);
        assert_eq!(texts("1e5"), vec!["1e5"]);
    }

    #[test]
    fn test_lex_error_on_unknown_character() {
        let err = Tokenizer::default()
            .tokenize("x = `y`", StringDelimiter::None)
            .unwrap_err();
        assert_eq!(err.column, 5);
        assert_eq!(err.found, '`');
    }

    #[test]
    fn test_non_ascii_outside_string_is_error() {
        assert!(Tokenizer::default()
            .tokenize("x = é", StringDelimiter::None)
            .is_err());
        assert!(Tokenizer::default()
            .tokenize("x = 'é'", StringDelimiter::None)
            .is_ok());
    }

    #[test]
    fn test_trailing_whitespace_token() {
        let tokens = Tokenizer::default()
            .tokenize("x = 1   ", StringDelimiter::None)
            .unwrap()
            .tokens;
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Whitespace);
    }
}
