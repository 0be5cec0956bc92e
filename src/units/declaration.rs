/// Type declaration and namelist statement parsing
///
/// Both parsers are pure: they take a statement's normalized tokens and
/// return either the parsed structure or a message describing the first
/// structural problem found.
use super::kinds::is_intrinsic_type;
use super::variable::{Attribute, TypeSpec};
use crate::parser::patterns::is_identifier;

/// A parsed type declaration statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub type_spec: TypeSpec,
    pub attributes: Vec<Attribute>,
    pub names: Vec<String>,
}

/// Forward-only reader over a statement's tokens
struct Cursor<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [String], pos: usize) -> Self {
        Self { tokens, pos }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &str) -> Result<(), String> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected '{expected}', found '{token}'")),
            None => Err(format!("expected '{expected}' at end of statement")),
        }
    }

    fn identifier(&mut self, what: &str) -> Result<String, String> {
        match self.next() {
            Some(token) if is_identifier(token) => Ok(token.to_string()),
            Some(token) => Err(format!("expected {what}, found '{token}'")),
            None => Err(format!("expected {what} at end of statement")),
        }
    }

    /// Consume a balanced `(...)` or `[...]` group and return its text
    fn group(&mut self) -> Result<String, String> {
        let mut depth = 0usize;
        let mut text = String::new();
        while let Some(token) = self.next() {
            match token {
                "(" | "[" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                _ => {}
            }
            text.push_str(token);
            if depth == 0 {
                return Ok(text);
            }
        }
        Err(format!("unbalanced parentheses in '{text}'"))
    }

    /// Skip an initializer up to the next top-level comma
    fn skip_initializer(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                "(" | "[" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                "," if depth == 0 => return,
                _ => {}
            }
            self.pos += 1;
        }
    }
}

fn parse_type_spec(cursor: &mut Cursor<'_>) -> Result<TypeSpec, String> {
    let first = cursor
        .next()
        .ok_or_else(|| "empty declaration".to_string())?;
    let spec = match first {
        "type" | "class" => {
            let group = cursor.group()?;
            let inner = group
                .strip_prefix('(')
                .and_then(|g| g.strip_suffix(')'))
                .filter(|g| !g.is_empty())
                .ok_or_else(|| format!("expected a type name in {first}{group}"))?
                .to_string();
            return Ok(if first == "type" {
                TypeSpec::Derived(inner)
            } else {
                TypeSpec::Class(inner)
            });
        }
        "double" => match cursor.next() {
            Some(second @ ("precision" | "complex")) => format!("double {second}"),
            _ => return Err("expected 'precision' or 'complex' after 'double'".to_string()),
        },
        "doubleprecision" => "double precision".to_string(),
        "doublecomplex" => "double complex".to_string(),
        word if is_intrinsic_type(word) => word.to_string(),
        word => return Err(format!("'{word}' is not a type")),
    };

    // `character*10`, `character*(*)`
    if spec == "character" && cursor.eat("*") {
        if cursor.peek() == Some("(") {
            cursor.group()?;
        } else {
            cursor.next();
        }
    }
    // Kind or length selector
    if cursor.peek() == Some("(") {
        cursor.group()?;
    }
    Ok(TypeSpec::Intrinsic(spec))
}

/// Parse a type declaration statement
///
/// Array bounds, coarray bounds, character lengths and initializers on the
/// entity names are consumed and discarded.
///
/// # Errors
/// Returns a message for a missing or invalid name, a trailing comma or
/// unbalanced parentheses.
pub fn parse_type_declaration(tokens: &[String]) -> Result<TypeDeclaration, String> {
    let mut cursor = Cursor::new(tokens, 0);
    let type_spec = parse_type_spec(&mut cursor)?;

    let mut attributes = Vec::new();
    while cursor.eat(",") {
        let name = cursor.identifier("an attribute")?;
        let args = match cursor.peek() {
            Some("(") => Some(cursor.group()?),
            _ => None,
        };
        attributes.push(Attribute::new(name, args));
    }
    cursor.eat("::");

    let mut names = Vec::new();
    loop {
        names.push(cursor.identifier("a variable name")?);
        if matches!(cursor.peek(), Some("(" | "[")) {
            cursor.group()?;
        }
        if matches!(cursor.peek(), Some("(" | "[")) {
            cursor.group()?;
        }
        if cursor.eat("*") {
            if cursor.peek() == Some("(") {
                cursor.group()?;
            } else {
                cursor.next();
            }
        }
        if cursor.eat("=") || cursor.eat("=>") {
            cursor.skip_initializer();
        }

        if cursor.at_end() {
            break;
        }
        cursor.expect(",")?;
        if cursor.at_end() {
            return Err("trailing comma in name list".to_string());
        }
    }

    Ok(TypeDeclaration {
        type_spec,
        attributes,
        names,
    })
}

/// Parse a `namelist /group/ a, b /other/ c` statement
///
/// Returns the groups in order of appearance.
///
/// # Errors
/// Returns a message for a missing slash, an invalid name or a group
/// without members.
pub fn parse_namelist(tokens: &[String]) -> Result<Vec<(String, Vec<String>)>, String> {
    let mut cursor = Cursor::new(tokens, 0);
    cursor.expect("namelist")?;
    if cursor.at_end() {
        return Err("namelist without a group".to_string());
    }

    let mut groups = Vec::new();
    while !cursor.at_end() {
        cursor.expect("/")?;
        let group = cursor.identifier("a namelist group name")?;
        cursor.expect("/")?;

        let mut members = Vec::new();
        while cursor.peek().is_some_and(|t| t != "/") {
            members.push(cursor.identifier("a namelist member")?);
            match cursor.peek() {
                Some(",") => {
                    cursor.next();
                }
                Some("/") | None => {}
                Some(token) => return Err(format!("unexpected '{token}' in namelist")),
            }
        }
        if members.is_empty() {
            return Err(format!("namelist group '{group}' has no members"));
        }
        groups.push((group, members));
    }
    Ok(groups)
}
