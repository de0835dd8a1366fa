//! Position resolution and syntax-kind classification
//!
//! Walks the decoded dump tree bottom-up. Every node gets its exact source
//! text, byte range, and location resolved from its span; gaps between
//! adjacent siblings are filled with synthetic whitespace and soft-break
//! `Str` nodes so that prose rules see contiguous text. Compiler syntax
//! kinds are then mapped onto prose node kinds; anything without a prose
//! counterpart stays a `Token` under its original label.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Node, NodeData};
use crate::convert::flatten_markup;
use crate::dump::{extract_label, extract_span_field, RawNode};
use crate::error::ConvertError;
use crate::location::{extract_span, resolve_offset, Location, Position};

/// Dumps nested deeper than this are rejected rather than recursed into.
const MAX_DEPTH: usize = 256;

/// Synthetic paragraph-break field covering a blank first source line.
const LEADING_BREAK_FIELD: &str =
    "<span style='color:#7dcfff'>Marked::Parbreak</span> &lt;1:0~2:0&gt;";

static DIGIT_DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").expect("list pattern"));
static FENCED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(?s:.)*?```$").expect("fence pattern"));
static CODE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(\w+)?\s((?s:.)*?)\s*```$").expect("code line pattern"));
static INLINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`((?s:.)*?)`").expect("inline code pattern"));
static BLOCK_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```\w*\n((?s:.)*?)\n```").expect("block fence pattern"));
static EQ_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\$\s*").expect("eq open pattern"));
static EQ_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\$\s*$").expect("eq close pattern"));
static DOLLAR_EDGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$|\$$").expect("dollar pattern"));
static LINE_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//\s*").expect("line comment pattern"));
static BLOCK_COMMENT_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/\*\s*").expect("block comment open pattern"));
static BLOCK_COMMENT_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\*/$").expect("block comment close pattern"));

/// Classify a decoded dump tree against its source text into a `Document`.
pub fn classify(root: &RawNode, source: &str) -> Result<Node, ConvertError> {
    let mut root = root.clone();
    // A document whose first node starts on line 2 opens with a blank
    // line; surface it as a paragraph break so prose offsets line up.
    if let Some(children) = root.c.as_mut() {
        if let Some(first) = children.first() {
            if raw_location(first)?.start.line == 2 {
                children.insert(
                    0,
                    RawNode {
                        s: LEADING_BREAK_FIELD.to_string(),
                        c: None,
                    },
                );
            }
        }
    }
    let resolved = resolve(&root, source, 0)?;
    let mut resolved = convert_content_blocks(resolved);
    let children = resolved.children_mut().map(std::mem::take).unwrap_or_default();
    let data = resolved.data().clone();
    Ok(Node::Document { data, children })
}

/// Location of a raw node: its own span when present, otherwise inferred
/// from its first and last child. A childless node without a span has no
/// resolvable position.
fn raw_location(raw: &RawNode) -> Result<Location, ConvertError> {
    if let Some(location) = extract_span_field(&raw.s) {
        return Ok(location);
    }
    match raw.c.as_deref() {
        Some([]) => Ok(Location::new(Position::new(1, 0), Position::new(1, 0))),
        Some([first, .., last]) => {
            let first = raw_location(first)?;
            let last = raw_location(last)?;
            Ok(Location::covering(first, last))
        }
        Some([only]) => {
            let only = raw_location(only)?;
            Ok(Location::new(only.start, only.end))
        }
        None => Err(ConvertError::MissingPosition(format!(
            "no source span in field {:?}",
            raw.s
        ))),
    }
}

fn resolve(raw: &RawNode, source: &str, depth: usize) -> Result<Node, ConvertError> {
    if depth > MAX_DEPTH {
        return Err(ConvertError::MalformedSource(format!(
            "dump nesting exceeds {} levels",
            MAX_DEPTH
        )));
    }
    let label = extract_label(&raw.s)?.to_string();
    let loc = raw_location(raw)?;
    let raw_text = extract_span(source, &loc)?;
    let start = resolve_offset(source, loc.start)?;
    let data = NodeData {
        range: (start, start + raw_text.len()),
        raw: raw_text,
        loc,
    };
    let children = match &raw.c {
        Some(raw_children) => {
            let mut resolved = Vec::with_capacity(raw_children.len());
            for child in raw_children {
                resolved.push(resolve(child, source, depth + 1)?);
            }
            Some(pad_gaps(resolved))
        }
        None => None,
    };
    classify_node(&label, data, children, source)
}

/// Fill the space between adjacent siblings with synthetic `Str` nodes:
/// run of spaces when they share a line, a soft break when they do not and
/// neither side is already a `Break`. Fillers get a one-byte range at the
/// previous sibling's end.
fn pad_gaps(children: Vec<Node>) -> Vec<Node> {
    let mut fillers = Vec::new();
    for pair in children.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let prev_end = prev.loc().end;
        let next_start = next.loc().start;
        let offset = prev.range().1;
        let loc = Location::new(prev_end, next_start);
        if prev_end.line == next_start.line {
            let width = next_start.column.saturating_sub(prev_end.column);
            if width > 0 {
                let spaces = " ".repeat(width);
                fillers.push(Node::Str {
                    data: NodeData {
                        raw: spaces.clone(),
                        range: (offset, offset + 1),
                        loc,
                    },
                    value: spaces,
                });
            }
        } else if !prev.is_break() && !next.is_break() {
            fillers.push(Node::Str {
                data: NodeData {
                    raw: "\n".to_string(),
                    range: (offset, offset + 1),
                    loc,
                },
                value: "\n".to_string(),
            });
        }
    }
    if fillers.is_empty() {
        return children;
    }
    let mut merged = children;
    merged.extend(fillers);
    merged.sort_by_key(|node| node.range().0);
    merged
}

/// Map a resolved node onto its prose kind. `children` is `Some` iff the
/// node was a parent in the dump; a leaf's value is its source text.
fn classify_node(
    label: &str,
    data: NodeData,
    children: Option<Vec<Node>>,
    source: &str,
) -> Result<Node, ConvertError> {
    let node = if label == "Marked::Heading" {
        Node::Header {
            data,
            children: children.unwrap_or_default(),
        }
    } else if label.starts_with("Marked::Text") {
        let value = data.raw.clone();
        Node::Str { data, value }
    } else if label.starts_with("Marked::Parbreak") || label.starts_with("Escape::Linebreak") {
        let value = data.raw.clone();
        Node::Break { data, value }
    } else if label == "Marked::ListItem" || label == "Marked::EnumItem" {
        restructure_list_item(data, children.unwrap_or_default(), source)?
    } else if label == "Marked::Raw" {
        convert_raw(data, children.unwrap_or_default())
    } else if label == "Marked::Equation" {
        convert_equation(data, source)
    } else if label == "Marked::Link" {
        let url = children.is_none().then(|| data.raw.clone()).unwrap_or_default();
        let text = Node::Str {
            data: data.clone(),
            value: data.raw.clone(),
        };
        Node::Link {
            data,
            url,
            children: vec![text],
        }
    } else if label == "Marked::Strong" {
        let children = coerce_emphasis_content(children.unwrap_or_default());
        Node::Strong { data, children }
    } else if label == "Marked::Emph" {
        let children = coerce_emphasis_content(children.unwrap_or_default());
        Node::Emphasis { data, children }
    } else if label == "Ct::LineComment" {
        let value = LINE_COMMENT_RE.replace(&data.raw, "").into_owned();
        Node::Comment { data, value }
    } else if label == "Ct::BlockComment" {
        let inner = BLOCK_COMMENT_OPEN_RE.replace(&data.raw, "");
        let value = BLOCK_COMMENT_CLOSE_RE.replace(&inner, "").into_owned();
        Node::Comment { data, value }
    } else {
        let value = children.is_none().then(|| data.raw.clone());
        Node::Token {
            data,
            label: label.to_string(),
            value,
            children: children.unwrap_or_default(),
        }
    };
    Ok(node)
}

/// Rebuild a list item's children: the marker token goes away, markup
/// wrappers are flattened, surviving text is wrapped in a paragraph, and
/// nested items become a sub-list. The item's own span is re-anchored to
/// end at its last rebuilt child.
fn restructure_list_item(
    data: NodeData,
    children: Vec<Node>,
    source: &str,
) -> Result<Node, ConvertError> {
    let content: Vec<Node> = children
        .iter()
        .filter(|child| {
            !matches!(
                child.token_label(),
                Some("Marked::ListMarker" | "Marked::EnumMarker")
            )
        })
        .flat_map(flatten_markup)
        .collect();
    let (nested, text): (Vec<Node>, Vec<Node>) =
        content.into_iter().partition(|child| child.is_list_item());

    let mut rebuilt = Vec::new();
    let body: Vec<Node> = text
        .into_iter()
        .filter(|child| !child.is_blank_str())
        .collect();
    if let (Some(first), Some(last)) = (body.first(), body.last()) {
        let paragraph_data = NodeData {
            raw: body.iter().map(|node| node.raw()).collect(),
            range: (first.range().0, last.range().1),
            loc: Location::covering(first.loc(), last.loc()),
        };
        rebuilt.push(Node::Paragraph {
            data: paragraph_data,
            children: body,
        });
    }
    if let (Some(first), Some(last)) = (nested.first(), nested.last()) {
        let ordered = nested
            .iter()
            .any(|item| DIGIT_DOT_RE.is_match(item.raw().trim()));
        let list_data = NodeData {
            raw: nested
                .iter()
                .map(|node| node.raw())
                .collect::<Vec<_>>()
                .join("\n"),
            range: (first.range().0, last.range().1),
            loc: Location::covering(first.loc(), last.loc()),
        };
        rebuilt.push(Node::List {
            data: list_data,
            ordered,
            start: ordered.then_some(1),
            children: nested,
        });
    }

    // Rebuilt paragraphs carry spans assembled from flattened children;
    // recompute their byte ranges from the resolved locations.
    for child in &mut rebuilt {
        if let Node::Paragraph { data, children } = child {
            if let (Some(first), Some(last)) = (children.first(), children.last()) {
                data.range = (
                    resolve_offset(source, first.loc().start)?,
                    resolve_offset(source, last.loc().end)?,
                );
            }
            for sub in children.iter_mut() {
                if sub.is_str() {
                    let loc = sub.loc();
                    sub.data_mut().range = (
                        resolve_offset(source, loc.start)?,
                        resolve_offset(source, loc.end)?,
                    );
                }
            }
        }
    }

    let last = match rebuilt.last() {
        Some(last) => last,
        None => {
            return Ok(Node::ListItem {
                data,
                children: vec![],
            })
        }
    };
    let loc = Location::new(data.loc.start, last.loc().end);
    let range = (resolve_offset(source, loc.start)?, last.range().1);
    let raw = extract_span(source, &loc)?;
    Ok(Node::ListItem {
        data: NodeData { raw, range, loc },
        children: rebuilt,
    })
}

/// Raw markup: inline `Code` when the span sits on one line, fenced
/// `CodeBlock` otherwise. The fence, and any language tag, never reach the
/// value; the language tag node feeds `lang` instead.
fn convert_raw(data: NodeData, children: Vec<Node>) -> Node {
    if data.loc.start.line == data.loc.end.line {
        let value = if FENCED_LINE_RE.is_match(&data.raw) {
            CODE_LINE_RE
                .captures(&data.raw)
                .and_then(|captures| captures.get(2))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        } else {
            INLINE_CODE_RE.replace(&data.raw, "$1").into_owned()
        };
        return Node::Code { data, value };
    }
    let value = BLOCK_FENCE_RE.replace(&data.raw, "$1").into_owned();
    let lang = children.get(1).and_then(|child| match child {
        Node::Token {
            label,
            value: Some(value),
            ..
        } if label == "Marked::RawLang" => Some(value.clone()),
        _ => None,
    });
    Node::CodeBlock { data, lang, value }
}

/// Equations: display math (the span's opening line is nothing but the
/// equation) becomes a `CodeBlock`, inline math a `Code`.
fn convert_equation(data: NodeData, source: &str) -> Node {
    let inner = EQ_OPEN_RE.replace(&data.raw, "");
    let value = EQ_CLOSE_RE.replace(&inner, "").into_owned();
    let line = source
        .split('\n')
        .nth(data.loc.start.line.saturating_sub(1))
        .unwrap_or("");
    let trimmed = line.trim();
    let stripped = DOLLAR_EDGE_RE.replace_all(trimmed, "");
    let stripped = stripped.trim();
    let whole_line = trimmed.starts_with('$')
        && trimmed.ends_with('$')
        && trimmed.len() > 2
        && !stripped.is_empty()
        && stripped.len() == value.len();
    if whole_line || data.loc.start.line != data.loc.end.line {
        Node::CodeBlock {
            data,
            lang: None,
            value,
        }
    } else {
        Node::Code { data, value }
    }
}

/// Strong and emphasis wrap their text between two delimiter tokens; the
/// middle child becomes a plain `Str` with the first text value found in
/// its subtree.
fn coerce_emphasis_content(mut children: Vec<Node>) -> Vec<Node> {
    if children.len() > 1 {
        let value = children[1]
            .first_text_value()
            .unwrap_or_default()
            .to_string();
        let data = children[1].data().clone();
        children[1] = Node::Str { data, value };
    }
    children
}

/// Post-order pass turning script-mode content blocks into paragraphs with
/// their markup flattened out.
fn convert_content_blocks(mut node: Node) -> Node {
    if let Some(children) = node.children_mut() {
        let resolved = std::mem::take(children);
        *children = resolved.into_iter().map(convert_content_blocks).collect();
    }
    if node.has_label("Marked::ContentBlock") && node.value().is_none() {
        let flattened = flatten_markup(&node);
        let data = match (flattened.first(), flattened.last()) {
            (Some(first), Some(last)) => NodeData {
                raw: flattened.iter().map(|n| n.raw()).collect(),
                range: (first.range().0, last.range().1),
                loc: Location::covering(first.loc(), last.loc()),
            },
            _ => NodeData {
                raw: String::new(),
                range: node.range(),
                loc: node.loc(),
            },
        };
        return Node::Paragraph {
            data,
            children: flattened,
        };
    }
    node
}
