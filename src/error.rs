//! Error types for the dump-to-prose-tree conversion
//!
//! Every stage of the pipeline reports through [`ConvertError`]. A failure is
//! fatal for the conversion call; there is no partial recovery. Each variant
//! carries the offending field text or position so callers can diagnose the
//! input without re-running the pipeline.

use std::fmt;

/// Errors that can occur while converting a dump string into a prose tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// The dump violates the line grammar or cannot be decoded into a tree
    DumpFormat(String),
    /// A span references a line/column that does not exist in the source,
    /// or tree recursion exceeded the safety ceiling
    MalformedSource(String),
    /// A node required for offset inference lacks a resolvable span
    MissingPosition(String),
    /// A kind label could not be extracted from its field text
    InvalidLabel(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::DumpFormat(msg) => write!(f, "Malformed dump: {}", msg),
            ConvertError::MalformedSource(msg) => write!(f, "Malformed source: {}", msg),
            ConvertError::MissingPosition(msg) => {
                write!(f, "Missing position information: {}", msg)
            }
            ConvertError::InvalidLabel(msg) => write!(f, "Invalid kind label: {}", msg),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<serde_yaml::Error> for ConvertError {
    fn from(err: serde_yaml::Error) -> Self {
        ConvertError::DumpFormat(err.to_string())
    }
}
