//! Structural formula errors
//!
//! These are the hard failures: a formula that cannot be tokenized or
//! parsed never reaches binding or evaluation, and the caller decides
//! whether to reject the template or substitute a placeholder. Semantic
//! failures never appear here — they are [`broadsheet_core::Value::Error`]
//! values flowing out of evaluation.

use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while turning formula text into a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The lexer hit a character it cannot tokenize
    #[error("lex error at offset {offset}: {message}")]
    Lex {
        /// Byte offset into the formula text
        offset: usize,
        /// What went wrong
        message: String,
    },

    /// The parser hit an unexpected token
    #[error("syntax error at offset {offset}: {message}")]
    Syntax {
        /// Byte offset of the offending token
        offset: usize,
        /// What went wrong
        message: String,
    },
}

impl ParseError {
    /// Byte offset of the failure within the formula text
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Lex { offset, .. } | ParseError::Syntax { offset, .. } => *offset,
        }
    }
}
