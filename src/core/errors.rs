/*!
# Error System

Error taxonomy of the obfuscator. Parse errors are file-scoped and recovered
by leaving the file untouched; I/O, backup and configuration errors abort the
run.
*/

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::position::Position;

/// Failure to tokenize or structure a PHP source file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("lexical error at {position}: {message}")]
    Lexical { position: Position, message: String },

    #[error("syntax error at {position}: {message}")]
    Syntax { position: Position, message: String },
}

impl ParseError {
    pub fn lexical(position: Position, message: impl Into<String>) -> Self {
        Self::Lexical {
            position,
            message: message.into(),
        }
    }

    pub fn syntax(position: Position, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Self::Lexical { position, .. } | Self::Syntax { position, .. } => *position,
        }
    }
}

/// Top-level error of an obfuscation run
#[derive(Error, Debug)]
pub enum ObfuscatorError {
    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backup failed: {0}")]
    Backup(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("malformed envelope: {0}")]
    Envelope(String),
}

impl ObfuscatorError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(path: &Path, source: ParseError) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the error stops the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse { .. })
    }
}

pub type ObfuscatorResult<T> = Result<T, ObfuscatorError>;
