/// Unit kinds and statement-classification tables
///
/// Keyword sets are plain data; the classifiers below are pure functions
/// over a statement's normalized (lowercase) tokens.
use std::fmt;

/// Program unit and block kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Program,
    Function,
    Subroutine,
    Module,
    Submodule,
    /// `block data`
    Block,
    Interface,
    Type,
    Enum,
}

impl UnitKind {
    pub const ALL: [UnitKind; 9] = [
        UnitKind::Program,
        UnitKind::Function,
        UnitKind::Subroutine,
        UnitKind::Module,
        UnitKind::Submodule,
        UnitKind::Block,
        UnitKind::Interface,
        UnitKind::Type,
        UnitKind::Enum,
    ];

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            UnitKind::Program => "program",
            UnitKind::Function => "function",
            UnitKind::Subroutine => "subroutine",
            UnitKind::Module => "module",
            UnitKind::Submodule => "submodule",
            UnitKind::Block => "block",
            UnitKind::Interface => "interface",
            UnitKind::Type => "type",
            UnitKind::Enum => "enum",
        }
    }

    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == word)
    }

    /// Interfaces, derived types and enums have no executable statements
    #[must_use]
    pub fn has_execution_part(self) -> bool {
        !matches!(self, UnitKind::Interface | UnitKind::Type | UnitKind::Enum)
    }

    /// Kinds that open a new scope of code rather than a specification block
    #[must_use]
    pub fn is_subprogram(self) -> bool {
        matches!(
            self,
            UnitKind::Program
                | UnitKind::Function
                | UnitKind::Subroutine
                | UnitKind::Module
                | UnitKind::Submodule
        )
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Intrinsic type names (`double precision` is matched as two tokens too)
pub const INTRINSIC_TYPES: &[&str] = &[
    "integer",
    "real",
    "doubleprecision",
    "double",
    "complex",
    "doublecomplex",
    "character",
    "logical",
];

/// Words that may precede a unit keyword in a unit header
pub const UNIT_PREFIXES: &[&str] = &[
    "elemental",
    "impure",
    "non_recursive",
    "pure",
    "recursive",
    "module",
];

pub const ACCESS_SPECS: &[&str] = &["public", "private"];

/// Attribute statements that may open a declaration on their own
pub const ATTRIBUTE_SPECS: &[&str] = &[
    "public",
    "private",
    "allocatable",
    "asynchronous",
    "bind",
    "codimension",
    "contiguous",
    "dimension",
    "external",
    "intent",
    "intrinsic",
    "namelist",
    "optional",
    "pointer",
    "protected",
    "save",
    "target",
    "value",
    "volatile",
    "common",
    "equivalence",
];

/// Other statements that belong to the specification part
pub const SPECIFICATION_KEYWORDS: &[&str] = &[
    "type",
    "class",
    "enum",
    "enumerator",
    "generic",
    "interface",
    "abstract",
    "parameter",
    "procedure",
    "data",
    "format",
    "entry",
    "final",
    "sequence",
];

#[must_use]
pub fn is_intrinsic_type(word: &str) -> bool {
    INTRINSIC_TYPES.contains(&word)
}

/// Whether a statement starting with `word` is a declaration construct
#[must_use]
pub fn is_declaration_keyword(word: &str) -> bool {
    is_intrinsic_type(word) || ATTRIBUTE_SPECS.contains(&word) || SPECIFICATION_KEYWORDS.contains(&word)
}

/// Index just past a balanced group opened at `start`
///
/// `tokens[start]` must be `(` or `[`. Returns None when the group never
/// closes.
#[must_use]
pub fn skip_group(tokens: &[String], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(start) {
        match token.as_str() {
            "(" | "[" => depth += 1,
            ")" | "]" => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

/// Position and kind of the first unit keyword in a statement
///
/// `type(` and `class(` introduce a type specifier, not a block, and
/// `module procedure` is a procedure statement, so neither counts.
#[must_use]
pub fn find_unit_keyword(tokens: &[String]) -> Option<(usize, UnitKind)> {
    tokens.iter().enumerate().find_map(|(i, word)| {
        let kind = UnitKind::from_keyword(word)?;
        let next = tokens.get(i + 1).map(String::as_str);
        match kind {
            UnitKind::Type if next == Some("(") => None,
            UnitKind::Module
                if matches!(next, Some("function" | "subroutine" | "procedure")) =>
            {
                None
            }
            _ => Some((i, kind)),
        }
    })
}

/// Classify a statement as a unit opening
///
/// The first unit keyword either leads the statement, or every token before
/// it is a unit prefix or a type specifier with an optional parenthesized
/// kind (`pure real(8) function f(x)`).
#[must_use]
pub fn unit_opening(tokens: &[String]) -> Option<(usize, UnitKind)> {
    let (idx, kind) = find_unit_keyword(tokens)?;
    let prefix = &tokens[..idx];
    let mut i = 0;
    while i < prefix.len() {
        let word = prefix[i].as_str();
        if is_intrinsic_type(word) || word == "type" || word == "class" {
            i += 1;
            if word == "double" && prefix.get(i).is_some_and(|w| w == "precision" || w == "complex") {
                i += 1;
            }
            if prefix.get(i).is_some_and(|w| w == "*") {
                i += 1;
                if prefix.get(i).is_some_and(|w| w != "(") {
                    i += 1;
                }
            }
            if prefix.get(i).is_some_and(|w| w == "(") {
                i = skip_group(prefix, i)?;
            }
        } else if UNIT_PREFIXES.contains(&word) {
            i += 1;
        } else {
            return None;
        }
    }
    Some((idx, kind))
}

/// Kind named by an end statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndStatement {
    /// A bare `end`
    Bare,
    /// `end <kind>` or `end<kind>`
    Kind(UnitKind),
}

/// Classify a statement as the end of a program unit
///
/// `end do`, `end if` and other construct terminators are not unit ends.
#[must_use]
pub fn unit_end(tokens: &[String]) -> Option<EndStatement> {
    let first = tokens.first()?;
    if first == "end" {
        return match tokens.get(1) {
            None => Some(EndStatement::Bare),
            Some(word) => UnitKind::from_keyword(word).map(EndStatement::Kind),
        };
    }
    first
        .strip_prefix("end")
        .and_then(UnitKind::from_keyword)
        .map(EndStatement::Kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_opening_at_start() {
        assert_eq!(
            unit_opening(&toks("subroutine foo ( x )")),
            Some((0, UnitKind::Subroutine))
        );
        assert_eq!(unit_opening(&toks("module m")), Some((0, UnitKind::Module)));
        assert_eq!(unit_opening(&toks("type , public :: t")), Some((0, UnitKind::Type)));
    }

    #[test]
    fn test_opening_with_prefixes() {
        assert_eq!(
            unit_opening(&toks("pure real ( 8 ) function f ( x )")),
            Some((4, UnitKind::Function))
        );
        assert_eq!(
            unit_opening(&toks("elemental integer function g ( x )")),
            Some((2, UnitKind::Function))
        );
        assert_eq!(
            unit_opening(&toks("recursive subroutine r")),
            Some((1, UnitKind::Subroutine))
        );
        assert_eq!(
            unit_opening(&toks("double precision function d ( x )")),
            Some((2, UnitKind::Function))
        );
        assert_eq!(
            unit_opening(&toks("type ( vec ) function norm ( v )")),
            Some((4, UnitKind::Function))
        );
        assert_eq!(
            unit_opening(&toks("module function f ( x )")),
            Some((1, UnitKind::Function))
        );
    }

    #[test]
    fn test_opening_rejects_other_prefixes() {
        assert_eq!(unit_opening(&toks("call function ( x )")), None);
        assert_eq!(unit_opening(&toks("x = 1")), None);
        assert_eq!(unit_opening(&toks("type ( vec ) :: v")), None);
        assert_eq!(unit_opening(&toks("module procedure foo")), None);
    }

    #[test]
    fn test_unit_end_forms() {
        assert_eq!(unit_end(&toks("end")), Some(EndStatement::Bare));
        assert_eq!(
            unit_end(&toks("end subroutine")),
            Some(EndStatement::Kind(UnitKind::Subroutine))
        );
        assert_eq!(
            unit_end(&toks("end subroutine foo")),
            Some(EndStatement::Kind(UnitKind::Subroutine))
        );
        assert_eq!(
            unit_end(&toks("endmodule m")),
            Some(EndStatement::Kind(UnitKind::Module))
        );
    }

    #[test]
    fn test_construct_ends_are_not_unit_ends() {
        assert_eq!(unit_end(&toks("end do")), None);
        assert_eq!(unit_end(&toks("endif")), None);
        assert_eq!(unit_end(&toks("x = 1")), None);
    }

    #[test]
    fn test_skip_group() {
        let tokens = toks("( a ( 1 ) ) b");
        assert_eq!(skip_group(&tokens, 0), Some(6));
        assert_eq!(skip_group(&toks("( a"), 0), None);
    }

    #[test]
    fn test_kind_properties() {
        assert!(!UnitKind::Interface.has_execution_part());
        assert!(UnitKind::Subroutine.has_execution_part());
        assert!(UnitKind::Module.is_subprogram());
        assert!(!UnitKind::Type.is_subprogram());
        assert_eq!(UnitKind::from_keyword("enum"), Some(UnitKind::Enum));
        assert_eq!(UnitKind::Submodule.to_string(), "submodule");
    }
}
