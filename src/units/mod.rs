//! Program unit tree and the statement parser that builds it

pub mod construct;
pub mod declaration;
pub mod kinds;
pub mod parser;
pub mod unit;
pub mod variable;

pub use construct::{Construct, ConstructKind};
pub use kinds::UnitKind;
pub use parser::{ParseOutput, Parser};
pub use unit::{Document, Unit};
pub use variable::{Attribute, TypeSpec, Variable};
