//! Position and span resolution against the Typst source text
//!
//! The compiler dump addresses nodes with `line:column` pairs: lines are
//! 1-based, columns are 0-based, and the source is `\n`-delimited. This
//! module maps those pairs to absolute byte offsets and extracts the exact
//! substring a span addresses, including embedded newlines for multi-line
//! spans. Both directions must agree byte-for-byte with the span boundaries
//! the compiler encodes.

use serde::Serialize;
use std::fmt;

use crate::error::ConvertError;

/// A position in the source text (1-based line, 0-based column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A location in the source text (start and end positions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Bounding location from the start of `first` to the end of `last`
    pub fn covering(first: Location, last: Location) -> Self {
        Self::new(first.start, last.end)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.start, self.end)
    }
}

/// Convert a position to an absolute byte offset.
///
/// The offset is the sum of every preceding line's byte length plus one per
/// newline, plus the column.
pub fn resolve_offset(source: &str, position: Position) -> Result<usize, ConvertError> {
    let lines: Vec<&str> = source.split('\n').collect();
    if position.line == 0 || position.line > lines.len() {
        return Err(ConvertError::MalformedSource(format!(
            "line {} is outside the source ({} lines)",
            position.line,
            lines.len()
        )));
    }

    let mut offset = 0;
    for line in &lines[..position.line - 1] {
        offset += line.len() + 1;
    }
    Ok(offset + position.column)
}

/// Extract the exact substring addressed by a location.
///
/// Single-line locations are a column slice of one line; multi-line
/// locations join the first line's tail, the interior lines, and the last
/// line's head with newlines.
pub fn extract_span(source: &str, location: &Location) -> Result<String, ConvertError> {
    let Location { start, end } = *location;
    let lines: Vec<&str> = source.split('\n').collect();
    if start.line == 0 || end.line > lines.len() || start.line > end.line {
        return Err(ConvertError::MalformedSource(format!(
            "span {} is outside the source ({} lines)",
            location,
            lines.len()
        )));
    }

    fn slice<'a>(line: &'a str, from: usize, to: usize) -> Result<&'a str, ConvertError> {
        line.get(from..to).ok_or_else(|| {
            ConvertError::MalformedSource(format!(
                "columns {}..{} are outside line {:?}",
                from, to, line
            ))
        })
    }

    let first_line = lines[start.line - 1];
    if start.line == end.line {
        return Ok(slice(first_line, start.column, end.column)?.to_string());
    }

    let last_line = lines[end.line - 1];
    let mut result = slice(first_line, start.column, first_line.len())?.to_string();
    for interior in &lines[start.line..end.line - 1] {
        result.push('\n');
        result.push_str(interior);
    }
    result.push('\n');
    result.push_str(slice(last_line, 0, end.column)?);
    Ok(result)
}
