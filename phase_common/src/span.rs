//! Source locations for Phase diagnostics
//!
//! The interpreter handles exactly one source file per run, so a
//! location is a bare line/column pair with no file table behind it.
//! Lines and columns are 1-based and column ranges are inclusive at
//! both ends, which is the shape the caret renderer consumes. Byte
//! offsets ride along so spans can be ordered and merged without
//! comparing line/column pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single point in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    /// A position with a zero (unknown) column snapped to column 1, so
    /// later rendering never has to special-case it.
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self { line, column: column.max(1), offset }
    }

    /// The first character of the file.
    pub fn origin() -> Self {
        Self { line: 1, column: 1, offset: 0 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A contiguous stretch of source, start and end inclusive.
///
/// Every token and AST node carries one, and diagnostics reuse the
/// node's span unchanged. The invariants the caret renderer relies on
/// (columns at least 1, end never before start) are established here
/// at construction instead of being checked at every use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        let start = Position::new(start.line, start.column, start.offset);
        let end = Position::new(end.line, end.column, end.offset);

        // A degenerate range collapses to its start position.
        let backwards = end.line < start.line
            || (end.line == start.line && end.column < start.column);

        Self { start, end: if backwards { start } else { end } }
    }

    /// The span of a single character or a zero-width point.
    pub fn single(at: Position) -> Self {
        Self::new(at, at)
    }

    /// The smallest span covering both operands; the parser uses this
    /// to give a compound node the extent of its outermost parts.
    pub fn merge(self, other: Span) -> Span {
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

        Span { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}:{}-{}", self.start.line, self.start.column, self.end.column)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A value tagged with the span it was read from.
///
/// The lexer wraps every token type this way, and the parser keeps
/// identifier names as `Spanned<String>` so a diagnostic about a name
/// (an undefined variable, a duplicate function) can point at the name
/// itself rather than the whole surrounding statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zero_column_snaps_to_one() {
        let span = Span::new(Position::new(3, 0, 10), Position::new(3, 4, 14));
        assert_eq!(span.start.column, 1);
        assert_eq!(span.end.column, 4);
    }

    #[test]
    fn backwards_range_collapses_to_its_start() {
        let span = Span::new(Position::new(2, 9, 20), Position::new(2, 3, 14));
        assert_eq!(span.start, span.end);
        assert_eq!(span.end.column, 9);
    }

    #[test]
    fn merge_covers_both_operands_in_either_order() {
        let a = Span::new(Position::new(1, 1, 0), Position::new(1, 5, 4));
        let b = Span::new(Position::new(1, 8, 7), Position::new(1, 12, 11));

        let merged = a.merge(b);
        assert_eq!(merged.start.column, 1);
        assert_eq!(merged.end.column, 12);
        assert_eq!(b.merge(a), merged);
    }

    #[test]
    fn single_line_spans_render_as_a_column_range() {
        let span = Span::new(Position::new(4, 2, 30), Position::new(4, 7, 35));
        assert_eq!(span.to_string(), "4:2-7");
    }

    #[test]
    fn multi_line_spans_render_both_endpoints() {
        let span = Span::new(Position::new(1, 3, 2), Position::new(2, 6, 12));
        assert_eq!(span.to_string(), "1:3-2:6");
    }
}
