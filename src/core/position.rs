/*!
# Source position types (Position, Span)

Location types shared by the lexer, the tree builder and error reporting.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in source code (1-based line/column, 0-based byte offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Start of a file.
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }

    /// Position of synthesized tokens that have no place in the input.
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the position reached after consuming `text` from `self`.
    pub fn advance(self, text: &str) -> Self {
        let mut line = self.line;
        let mut column = self.column;
        for ch in text.chars() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self::new(line, column, self.offset + text.len())
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Span in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span covering `text` starting at `start`.
    pub fn covering(start: Position, text: &str) -> Self {
        Self::new(start, start.advance(text))
    }

    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
