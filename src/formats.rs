//! Output format implementations for the prose tree
//!
//! This module contains serializers for the converted tree. The JSON
//! format mirrors the textlint AST object shape consumed by lint rules.

pub mod json;

pub use json::{to_json, to_json_string, to_json_string_pretty};
