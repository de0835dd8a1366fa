//! Parser for the Typst compiler's debug AST dump
//!
//! The dump is a line-oriented, indentation-based tree notation that is
//! almost YAML: the first line is a document marker, the second a file-path
//! header, and every following line is either one of five recognized fields
//! (`path:`, `ast:`, `- s: `, `s: `, `c:`) or a continuation of the previous
//! scalar value. This module rewrites the dump into well-formed YAML
//! (quoting scalar values and folding continuation lines with a literal
//! newline escape) and decodes it with `serde_yaml` into a [`RawNode`] tree.
//!
//! A node's `s` field holds its kind label — possibly wrapped in an HTML
//! color span — optionally followed by an HTML-escaped `&lt;l:c~l:c&gt;`
//! source span. The label and span grammars live here too, behind
//! [`extract_label`] and [`extract_span_field`], so the classifier never
//! touches the styled field text directly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::ConvertError;
use crate::location::{Location, Position};

/// A node of the compiler's syntax tree as decoded from the dump.
///
/// `s` is the styled kind-label field. `c` is `Some` iff the node is a
/// parent in the dump, which makes a leaf's textual value recoverable from
/// its resolved source span.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawNode {
    pub s: String,
    #[serde(default, deserialize_with = "children_or_empty")]
    pub c: Option<Vec<RawNode>>,
}

/// The dump decodes to a path header plus the tree root.
#[derive(Debug, Deserialize)]
struct Dump {
    #[allow(dead_code)]
    path: String,
    ast: RawNode,
}

/// An explicit `c:` field with no entries (the empty-document case) must
/// decode to an empty child list, not an absent one.
fn children_or_empty<'de, D>(deserializer: D) -> Result<Option<Vec<RawNode>>, D::Error>
where
    D: Deserializer<'de>,
{
    let children = Option::<Vec<RawNode>>::deserialize(deserializer)?;
    Ok(Some(children.unwrap_or_default()))
}

/// Lines that begin a new field; anything else continues the previous scalar.
static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(path:|ast:|- s: |s: |c:)").expect("field pattern"));

/// Kind label, either wrapped in a color span or plain.
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:<span style='color:[^']*'>(?P<styled>[^<]+)</span>|(?P<plain>[^<]+))")
        .expect("label pattern")
});

/// HTML-escaped `l:c~l:c` span trailing the label.
static SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&lt;(\d+):(\d+)~(\d+):(\d+)&gt;").expect("span pattern"));

/// Parse a complete dump string into the raw tree root.
pub fn parse_dump(dump: &str) -> Result<RawNode, ConvertError> {
    let body = strip_first_line(dump);
    let quoted = quote_scalar_values(body)?;
    let parsed: Dump = serde_yaml::from_str(&quoted)?;
    Ok(parsed.ast)
}

fn strip_first_line(input: &str) -> &str {
    match input.split_once('\n') {
        Some((_, rest)) => rest,
        None => "",
    }
}

/// Rewrite the dump body into YAML that `serde_yaml` accepts: quote every
/// scalar value, and fold unrecognized lines into the previous scalar with
/// a literal `\n` escape.
fn quote_scalar_values(body: &str) -> Result<String, ConvertError> {
    let mut lines: Vec<String> = Vec::new();
    for line in body.split('\n') {
        if !FIELD_RE.is_match(line) {
            let previous = lines.last_mut().ok_or_else(|| {
                ConvertError::DumpFormat(format!(
                    "continuation line {:?} appears before any field",
                    line
                ))
            })?;
            if previous.pop() != Some('"') {
                return Err(ConvertError::DumpFormat(format!(
                    "continuation line {:?} follows a non-scalar field",
                    line
                )));
            }
            previous.push_str("\\n");
            previous.push_str(line);
            previous.push('"');
            continue;
        }
        // Recognized field: a bare key (`c:`, `ast:`) stays as-is, a
        // key with a value gets the value trimmed and quoted.
        let (key, rest) = match line.split_once(':') {
            Some(split) => split,
            None => (line, ""),
        };
        if rest.is_empty() || rest.starts_with(':') {
            lines.push(line.to_string());
        } else {
            lines.push(format!("{}: \"{}\"", key, rest.trim()));
        }
    }
    Ok(lines.join("\n"))
}

/// Extract the true kind label from a styled field: the color wrapper's
/// inner text when present, otherwise the field text up to the span suffix.
pub fn extract_label(field: &str) -> Result<&str, ConvertError> {
    let captures = LABEL_RE
        .captures(field)
        .ok_or_else(|| ConvertError::InvalidLabel(format!("no label in field {:?}", field)))?;
    if let Some(styled) = captures.name("styled") {
        return Ok(styled.as_str());
    }
    let plain = captures
        .name("plain")
        .ok_or_else(|| ConvertError::InvalidLabel(format!("no label in field {:?}", field)))?
        .as_str();
    let label = match plain.find(" &lt;") {
        Some(at) => &plain[..at],
        None => plain,
    };
    Ok(label.trim_end())
}

/// Extract the `l:c~l:c` source span trailing a label field, if any.
/// Root nodes carry no span; the classifier infers theirs from children.
pub fn extract_span_field(field: &str) -> Option<Location> {
    let captures = SPAN_RE.captures(field)?;
    let number = |index: usize| captures.get(index).and_then(|m| m.as_str().parse().ok());
    Some(Location::new(
        Position::new(number(1)?, number(2)?),
        Position::new(number(3)?, number(4)?),
    ))
}
