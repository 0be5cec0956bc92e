//! File analysis and project scanning.
//!
//! [`analyze_file`] runs the whole front end over one file: directives,
//! tokenizing, style checks, statement assembly and unit parsing. The
//! [`project`] module finds the files to analyze and supplies include
//! search directories through [`ProjectContext`].

pub mod pipeline;
pub mod project;

pub use pipeline::{analyze_file, analyze_source, find_unit_in, Analysis};
pub use project::{has_extension, is_excluded, normalize, Project, ProjectContext};
