//! Source positions.
//!
//! Lines and characters are zero-based, matching the editor protocol, so no
//! conversion is needed at the server boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FileUri;

/// A single point in a document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SinglePosition {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based character offset within the line.
    pub character: u32,
}

impl SinglePosition {
    /// Create a position.
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for SinglePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A span between two positions. Both ends are inclusive for hit-testing, so
/// a cursor sitting right after an identifier still lands on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start of the span.
    pub start: SinglePosition,
    /// End of the span.
    pub end: SinglePosition,
}

impl Range {
    /// Create a range.
    pub const fn new(start: SinglePosition, end: SinglePosition) -> Self {
        Self { start, end }
    }

    /// Shorthand for a range on a single line.
    pub const fn on_line(line: u32, start: u32, end: u32) -> Self {
        Self {
            start: SinglePosition::new(line, start),
            end: SinglePosition::new(line, end),
        }
    }

    /// Whether `position` falls inside this range.
    pub fn contains(&self, position: SinglePosition) -> bool {
        self.start <= position && position <= self.end
    }

    /// Whether two ranges share at least one position.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The smallest range covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether the range covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A range inside a specific file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// The file the range belongs to.
    pub file: FileUri,
    /// The span inside the file.
    pub range: Range,
}

impl Location {
    /// Create a location.
    pub const fn new(file: FileUri, range: Range) -> Self {
        Self { file, range }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let range = Range::on_line(2, 4, 7);
        assert!(range.contains(SinglePosition::new(2, 4)));
        assert!(range.contains(SinglePosition::new(2, 7)));
        assert!(!range.contains(SinglePosition::new(2, 8)));
        assert!(!range.contains(SinglePosition::new(1, 5)));
    }

    #[test]
    fn test_multiline_contains() {
        let range = Range::new(SinglePosition::new(1, 10), SinglePosition::new(3, 2));
        assert!(range.contains(SinglePosition::new(2, 0)));
        assert!(range.contains(SinglePosition::new(1, 40)));
        assert!(!range.contains(SinglePosition::new(3, 3)));
    }

    #[test]
    fn test_union_and_overlap() {
        let a = Range::on_line(0, 0, 3);
        let b = Range::on_line(0, 5, 9);
        assert!(!a.overlaps(&b));
        assert_eq!(a.union(b), Range::on_line(0, 0, 9));
        assert!(a.union(b).overlaps(&b));
    }
}
