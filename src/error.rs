//! Error taxonomy and diagnostics accumulation.
//!
//! User errors (tokenizer, parse, semantic, merge) are collected so a
//! single pass reports as many problems as possible; finalization
//! errors abort. Everything renders as `file:line:col: kind: message`.

use crate::parser::PestError;
use pest::error::{ErrorVariant, LineColLocation};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{file}:{line}:{col}: tokenizer error: {message}")]
    Tokenizer {
        file: String,
        line: usize,
        col: usize,
        message: String,
    },

    #[error("{file}:{line}:{col}: parse error: {message}")]
    Parse {
        file: String,
        line: usize,
        col: usize,
        message: String,
    },

    #[error("{file}:{line}: semantic error: {message}")]
    Semantic {
        file: String,
        line: usize,
        message: String,
    },

    #[error("merge error: {0}")]
    Merge(String),

    #[error("finalization error: {0}")]
    Finalization(String),

    #[error("compilation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    /// Summary error returned when the diagnostics set is non-empty.
    #[error("{0} error(s) reported")]
    Failed(usize),
}

impl Error {
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }

    /// Classify a pest error against its source text. Grammar-level
    /// failures are parse errors; failures at a character that cannot
    /// begin any token are tokenizer errors; custom errors raised by
    /// the consumer are semantic errors.
    pub fn from_pest(file: &str, source: &str, err: PestError) -> Error {
        let (line, col) = match err.line_col {
            LineColLocation::Pos((line, col)) => (line, col),
            LineColLocation::Span((line, col), _) => (line, col),
        };
        let excerpt = source
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or_default();
        match &err.variant {
            ErrorVariant::CustomError { message } => Error::Semantic {
                file: file.to_string(),
                line,
                message: message.clone(),
            },
            ErrorVariant::ParsingError { .. } => {
                let offending = excerpt.chars().nth(col.saturating_sub(1));
                let message = format!("{} in '{}'", err.variant.message(), excerpt.trim());
                if let Some(c) = offending {
                    if !legal_source_char(c) {
                        return Error::Tokenizer {
                            file: file.to_string(),
                            line,
                            col,
                            message: format!("illegal character '{}'", c),
                        };
                    }
                }
                Error::Parse {
                    file: file.to_string(),
                    line,
                    col,
                    message,
                }
            }
        }
    }
}

/// Characters that can appear in some legal token or separator.
fn legal_source_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || "_\"'#;,+-=:()[]<>%.\\".contains(c)
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: warning: {}", self.file, self.line, self.message)
    }
}

/// Accumulates user errors and warnings across pipeline stages.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub errors: Vec<Error>,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, err: Error) {
        log::error!("{}", err);
        self.errors.push(err);
    }

    pub fn semantic(&mut self, file: &str, line: usize, message: String) {
        self.error(Error::Semantic {
            file: file.to_string(),
            line,
            message,
        });
    }

    pub fn warn(&mut self, file: &str, line: usize, message: String) {
        let warning = Warning {
            file: file.to_string(),
            line,
            message,
        };
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Summary error for the accumulated set, if any.
    pub fn failure(&self) -> Option<Error> {
        if self.has_errors() {
            Some(Error::Failed(self.errors.len()))
        } else {
            None
        }
    }
}
