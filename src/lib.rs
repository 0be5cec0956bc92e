//! flint - Source analysis and style linting for modern Fortran
//!
//! Reads free-form source, interprets `#define`/`#undef`/`#include`, checks
//! per-line style and builds a tree of program units with their declared
//! variables, nested blocks and executable constructs.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]

pub mod cli;
pub mod config;
pub mod directive;
pub mod error;
pub mod parser;
pub mod process;
pub mod report;
pub mod units;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Config;
pub use directive::{parse_directive, Directive, MacroTable};
pub use error::{AnalysisError, Result};
pub use process::{analyze_file, analyze_source, find_unit_in, Analysis};
pub use report::{Diagnostic, DiagnosticKind, Report};
pub use units::{Unit, UnitKind};
