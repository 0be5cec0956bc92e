/// Declared entities
use std::fmt;

/// Declared type of a variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// Intrinsic type name, e.g. `integer` or `double precision`
    Intrinsic(String),
    /// `type(name)`
    Derived(String),
    /// `class(name)` or `class(*)`
    Class(String),
}

impl TypeSpec {
    /// Type name without the `type(...)`/`class(...)` wrapper
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            TypeSpec::Intrinsic(name) | TypeSpec::Derived(name) | TypeSpec::Class(name) => name,
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Intrinsic(name) => write!(f, "{name}"),
            TypeSpec::Derived(name) => write!(f, "type({name})"),
            TypeSpec::Class(name) => write!(f, "class({name})"),
        }
    }
}

/// One entry of a declaration's attribute list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Parenthesized argument text, e.g. `(10)` for `dimension(10)`
    pub args: Option<String>,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, args: Option<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.args.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub type_spec: TypeSpec,
    pub attributes: Vec<Attribute>,
    pub doc: String,
}

impl Variable {
    #[must_use]
    pub fn new(name: impl Into<String>, type_spec: TypeSpec, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            type_spec,
            attributes,
            doc: String::new(),
        }
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Append docstring lines, one per line
    pub fn append_doc(&mut self, lines: &[String]) {
        for line in lines {
            if !self.doc.is_empty() {
                self.doc.push('\n');
            }
            self.doc.push_str(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_spec_display() {
        assert_eq!(TypeSpec::Intrinsic("real".into()).to_string(), "real");
        assert_eq!(TypeSpec::Derived("vec".into()).to_string(), "type(vec)");
        assert_eq!(TypeSpec::Class("*".into()).name(), "*");
    }

    #[test]
    fn test_attribute_lookup() {
        let var = Variable::new(
            "a",
            TypeSpec::Intrinsic("integer".into()),
            vec![Attribute::new("dimension", Some("(10)".into()))],
        );
        assert_eq!(var.attribute("dimension").unwrap().to_string(), "dimension(10)");
        assert!(var.attribute("intent").is_none());
    }

    #[test]
    fn test_append_doc() {
        let mut var = Variable::new("a", TypeSpec::Intrinsic("real".into()), Vec::new());
        var.append_doc(&["first".to_string()]);
        var.append_doc(&["second".to_string(), "third".to_string()]);
        assert_eq!(var.doc, "first\nsecond\nthird");
    }
}
