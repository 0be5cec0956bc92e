/// Program unit tree nodes
use std::collections::BTreeMap;

use super::construct::Construct;
use super::kinds::UnitKind;
use super::variable::Variable;

/// Documentation attached to a unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Comment lines directly before the header
    pub docstring: String,
    /// Header statement text
    pub header: String,
    /// Comment lines left over when the unit ends
    pub footer: String,
}

/// A program unit or nested specification block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub kind: UnitKind,
    pub name: Option<String>,
    /// Line of the header statement
    pub line: usize,
    pub variables: Vec<Variable>,
    /// Nested `type`, `interface` and `enum` bodies
    pub blocks: Vec<Unit>,
    /// Units after `contains`
    pub subprograms: Vec<Unit>,
    pub namelists: BTreeMap<String, Vec<String>>,
    /// Top-level executable constructs
    pub constructs: Vec<Construct>,
    /// Modules named in `use` statements, in order
    pub uses: Vec<String>,
    pub doc: Document,
}

impl Unit {
    #[must_use]
    pub fn new(kind: UnitKind, name: Option<String>, line: usize) -> Self {
        Self {
            kind,
            name,
            line,
            variables: Vec::new(),
            blocks: Vec::new(),
            subprograms: Vec::new(),
            namelists: BTreeMap::new(),
            constructs: Vec::new(),
            uses: Vec::new(),
            doc: Document::default(),
        }
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Search nested blocks and subprograms, depth first
    #[must_use]
    pub fn find(&self, kind: UnitKind, name: &str) -> Option<&Unit> {
        self.blocks
            .iter()
            .chain(&self.subprograms)
            .find_map(|child| {
                if child.kind == kind && child.name.as_deref() == Some(name) {
                    Some(child)
                } else {
                    child.find(kind, name)
                }
            })
    }

    /// Depth of the unit tree rooted here (a leaf unit has depth 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self
            .blocks
            .iter()
            .chain(&self.subprograms)
            .map(Unit::depth)
            .max()
            .unwrap_or(0)
    }
}
