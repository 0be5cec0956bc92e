/// Regex patterns for Fortran lexical details
///
/// All patterns are compiled once at first use via `LazyLock`.
///
/// All regexes use case-insensitive + unicode flags
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Build a case-insensitive regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. This is acceptable because all patterns
/// in this module are compile-time constants that are verified by tests.
/// The panic occurs at first access of the `LazyLock` static.
fn build_re(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .unicode(true)
        .build()
        .unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

// ===== PREPROCESSOR =====

// Directive body after the marker: "define NAME value", "include <x>", ...
pub static DIRECTIVE_BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^\s*([a-z_]\w*)(?:\s+(.*?))?\s*$"));

// Include target: "path" or <path>, delimiters must pair up
pub static INCLUDE_TARGET_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r#"^(?:"([^"]*)"|<([^>]*)>)$"#));

// ===== TOKENS =====

// Dotted operators and logical constants: .and. .EQ. .true.
pub static DOTTED_OPERATOR_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^\.[a-z]+\."));

// Statement label: 1 to 5 digits
pub static STATEMENT_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^\d{1,5}$"));

// Names of units, variables, namelist groups
pub static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^[a-z][a-z0-9_$]*$"));

/// Check whether a token is a valid Fortran name
#[must_use]
pub fn is_identifier(token: &str) -> bool {
    IDENTIFIER_RE.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_body_regex() {
        let caps = DIRECTIVE_BODY_RE.captures("define FOO bar baz").unwrap();
        assert_eq!(&caps[1], "define");
        assert_eq!(caps.get(2).unwrap().as_str(), "FOO bar baz");

        let caps = DIRECTIVE_BODY_RE.captures("  endif  ").unwrap();
        assert_eq!(&caps[1], "endif");
        assert!(caps.get(2).is_none());

        assert!(!DIRECTIVE_BODY_RE.is_match("  "));
        assert!(!DIRECTIVE_BODY_RE.is_match("1abc"));
    }

    #[test]
    fn test_include_target_regex() {
        let caps = INCLUDE_TARGET_RE.captures("\"defs.inc\"").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "defs.inc");

        let caps = INCLUDE_TARGET_RE.captures("<sys/defs.h>").unwrap();
        assert_eq!(caps.get(2).unwrap().as_str(), "sys/defs.h");

        // Delimiters must match
        assert!(!INCLUDE_TARGET_RE.is_match("\"defs.inc>"));
        assert!(!INCLUDE_TARGET_RE.is_match("<defs.inc\""));
        assert!(!INCLUDE_TARGET_RE.is_match("defs.inc"));
    }

    #[test]
    fn test_dotted_operator_regex() {
        assert!(DOTTED_OPERATOR_RE.is_match(".and. y"));
        assert!(DOTTED_OPERATOR_RE.is_match(".EQ.1"));
        assert!(!DOTTED_OPERATOR_RE.is_match(".5"));
        assert!(!DOTTED_OPERATOR_RE.is_match(". and."));
    }

    #[test]
    fn test_statement_label_regex() {
        assert!(STATEMENT_LABEL_RE.is_match("100"));
        assert!(STATEMENT_LABEL_RE.is_match("99999"));
        assert!(!STATEMENT_LABEL_RE.is_match("123456"));
        assert!(!STATEMENT_LABEL_RE.is_match("1e5"));
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("foo"));
        assert!(is_identifier("Foo_Bar2"));
        assert!(!is_identifier("2foo"));
        assert!(!is_identifier("_foo"));
        assert!(!is_identifier("::"));
    }
}
