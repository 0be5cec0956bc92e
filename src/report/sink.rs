//! Diagnostic sinks
//!
//! A sink receives diagnostics one at a time together with the file they
//! belong to. The CLI prints them through a [`WriterSink`]; tests collect
//! them into a vector.
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::diagnostic::Diagnostic;

pub trait DiagnosticSink {
    /// Receive one diagnostic for `path`
    ///
    /// # Errors
    /// Returns an error if the sink cannot record the diagnostic.
    fn emit(&mut self, path: &Path, diagnostic: &Diagnostic) -> io::Result<()>;
}

/// Writes `path:line: category: text` lines
pub struct WriterSink<W: Write> {
    writer: W,
    count: usize,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }

    /// Number of diagnostics written so far
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit(&mut self, path: &Path, diagnostic: &Diagnostic) -> io::Result<()> {
        writeln!(
            self.writer,
            "{}:{}: {}",
            path.display(),
            diagnostic.line,
            diagnostic
        )?;
        self.count += 1;
        Ok(())
    }
}

impl DiagnosticSink for Vec<(PathBuf, Diagnostic)> {
    fn emit(&mut self, path: &Path, diagnostic: &Diagnostic) -> io::Result<()> {
        self.push((path.to_path_buf(), diagnostic.clone()));
        Ok(())
    }
}
