use std::fmt;

use serde::Serialize;

/// A single location in a schema file.
///
/// `offset` is a zero-based byte offset; `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    pub offset: usize,
    pub line:   usize,
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Position { offset, line, column }
    }
}

/// A range of source text, identified by the index of the file it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub file:  usize,
    pub start: Position,
    pub end:   Position,
}

impl Span {
    pub fn new(file: usize, start: Position, end: Position) -> Self {
        Span { file, start, end }
    }

    /// The smallest span covering both `self` and `other`.
    ///
    /// Spans from different files are not merged; the file of `self` wins.
    pub fn combine(&self, other: &Span) -> Span {
        let start = if other.start.offset < self.start.offset {
            other.start
        } else {
            self.start
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        Span { file: self.file, start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}
