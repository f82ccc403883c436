//! Source positions attached to expressions for diagnostics.
//!
//! Ranges never take part in equality or hashing of expressions; two trees parsed from
//! different places compare equal as long as their payloads do.

use std::fmt;

/// A line/column position inside a source text (both 1-based, `0` meaning unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A half-open span between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    /// Range used by nodes synthesized by the core (placeholders, rebuilt spines, ...).
    pub const UNKNOWN: TextRange = TextRange {
        start: Position::new(0, 0),
        end: Position::new(0, 0),
    };

    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }

    /// Smallest range covering both `self` and `other`. Unknown ranges are neutral.
    pub fn combine(&self, other: &TextRange) -> TextRange {
        match (self.is_unknown(), other.is_unknown()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => TextRange {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
            },
        }
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "unknown")
        } else {
            write!(
                f,
                "{}:{}..{}:{}",
                self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}
