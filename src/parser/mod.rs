//! Source text to logical statements.
//!
//! This module provides the lexical layer of the analysis:
//! - [`Tokenizer`]: Splits one physical line into classified tokens, carrying
//!   an open string literal over to the next line
//! - [`LogicalLines`]: Joins continuation lines (`&`), splits `;`-separated
//!   statements and buffers comment lines as docstring candidates
//! - [`patterns`]: Precompiled regex patterns for directives and names

pub mod patterns;
pub mod stream;
pub mod tokenizer;

pub use stream::{FileId, LogicalLines, SourceLine, Statement};
pub use tokenizer::{LexError, StringDelimiter, Token, TokenKind, Tokenizer};
