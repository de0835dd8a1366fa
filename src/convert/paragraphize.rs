//! Top-level regrouping into paragraphs, lists and standalone blocks
//!
//! The classifier leaves the document's children as a flat stream of text,
//! fillers, tokens and blocks. This pass walks that stream left to right
//! and regroups it the way prose tooling expects: hash-statement runs and
//! term items pass through verbatim, adjacent list items of the same class
//! merge into one list, filler-only paragraphs disappear, and everything
//! else between block boundaries becomes a paragraph.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Node, NodeData};
use crate::convert::flatten_markup;
use crate::location::Location;

static DIGIT_DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").expect("list pattern"));

/// Hash-token labels as they appear in the dump, HTML entities included.
const HASH_LABELS: [&str; 2] = ["Kw::Hash", "Fn::(Hash: &quot;#&quot;)"];

/// Tuning knobs for the regrouping pass.
#[derive(Debug, Clone, Default)]
pub struct ParagraphizeOptions {
    /// Statement names whose hash runs are NOT passed through verbatim,
    /// letting their content fall into normal paragraph grouping.
    pub statement_allowlist: HashSet<String>,
}

/// Regroup a document's children with default options.
pub fn paragraphize(document: Node) -> Node {
    paragraphize_with(document, &ParagraphizeOptions::default())
}

/// Regroup a document's children.
pub fn paragraphize_with(document: Node, options: &ParagraphizeOptions) -> Node {
    match document {
        Node::Document { data, children } => Node::Document {
            data,
            children: regroup(&children, options),
        },
        other => other,
    }
}

fn is_hash(node: &Node) -> bool {
    matches!(node.token_label(), Some(label) if HASH_LABELS.contains(&label))
}

fn is_term_item(node: &Node) -> bool {
    node.has_label("Marked::TermItem")
}

fn is_enum_item(node: &Node) -> bool {
    node.has_label("Marked::EnumItem")
}

fn is_enum_marker(node: &Node) -> bool {
    node.has_label("Marked::EnumMarker")
}

/// Ordered items read like `1. …`; everything else is unordered.
fn is_ordered_item(node: &Node) -> bool {
    DIGIT_DOT_RE.is_match(node.raw().trim())
}

fn includes_line_break(node: &Node) -> bool {
    (node.is_str() || node.is_break()) && node.raw().contains('\n')
}

/// A paragraph whose sole child is a soft-break filler carries no prose.
fn is_filler_paragraph(node: &Node) -> bool {
    match node {
        Node::Paragraph { children, .. } => {
            children.len() == 1 && children[0].is_newline_str()
        }
        _ => false,
    }
}

/// Blocks that never merge into a surrounding paragraph.
fn is_standalone(node: &Node) -> bool {
    matches!(
        node,
        Node::Header { .. } | Node::CodeBlock { .. } | Node::Break { .. } | Node::List { .. }
    )
}

/// Boundaries that terminate paragraph grouping.
fn is_boundary(node: &Node) -> bool {
    is_standalone(node) || node.is_list_item()
}

fn bracket_depth_delta(node: &Node) -> i32 {
    match node.token_label() {
        Some("Punc::LeftParen" | "Punc::LeftBracket" | "Punc::LeftBrace") => 1,
        Some("Punc::RightParen" | "Punc::RightBracket" | "Punc::RightBrace") => -1,
        _ => 0,
    }
}

/// First identifier in a subtree: a keyword token's lowercased name, or an
/// identifier token's value.
fn first_identifier(node: &Node) -> Option<String> {
    if let Some(label) = node.token_label() {
        if let Some(keyword) = label.strip_prefix("Kw::") {
            if label != "Kw::Hash" {
                return Some(keyword.to_lowercase());
            }
        }
        if label.contains("Ident:") {
            if let Some(value) = node.value() {
                return Some(value.to_string());
            }
        }
    }
    node.children()?.iter().find_map(first_identifier)
}

/// Name of the statement a hash token at `at` introduces, read from the
/// first non-blank sibling after it.
fn hash_statement_name(children: &[Node], at: usize) -> Option<String> {
    children[at + 1..]
        .iter()
        .find(|sibling| !sibling.is_blank_str())
        .and_then(first_identifier)
}

/// A hash token starts a verbatim statement run when it sits at a line
/// start and the statement it introduces is not allowlisted.
fn starts_hash_statement(children: &[Node], at: usize, options: &ParagraphizeOptions) -> bool {
    if !is_hash(&children[at]) {
        return false;
    }
    let at_line_start = at == 0 || includes_line_break(&children[at - 1]);
    if !at_line_start {
        return false;
    }
    match hash_statement_name(children, at) {
        Some(name) => !options.statement_allowlist.contains(&name),
        None => true,
    }
}

/// Consume a hash-statement run starting at `at`, tracking bracket depth
/// across siblings; the run ends inclusively at the first depth-zero
/// sibling that carries a line break. Returns the index past the run.
fn collect_hash_statement(children: &[Node], at: usize, out: &mut Vec<Node>) -> usize {
    let mut depth: i32 = 0;
    let mut index = at;
    while index < children.len() {
        let node = &children[index];
        if index > at {
            depth = (depth + bracket_depth_delta(node)).max(0);
        }
        out.push(node.clone());
        index += 1;
        if depth == 0 && includes_line_break(node) {
            break;
        }
    }
    index
}

/// Consume a run of term items starting at `at`, dropping the soft-break
/// fillers between consecutive terms. Returns the index past the run.
fn collect_term_run(children: &[Node], at: usize, out: &mut Vec<Node>) -> usize {
    let mut index = at;
    while index < children.len() {
        let node = &children[index];
        if is_term_item(node) {
            out.push(node.clone());
            index += 1;
            continue;
        }
        let next_is_term = children
            .get(index + 1)
            .map(is_term_item)
            .unwrap_or(false);
        if node.is_newline_str() && next_is_term {
            index += 1;
            continue;
        }
        break;
    }
    index
}

/// Merge a run of same-class list items (allowing soft-break fillers and
/// filler paragraphs between them) into one `List`. Returns the index past
/// the run.
fn collect_list_run(children: &[Node], at: usize, out: &mut Vec<Node>) -> usize {
    let ordered = is_ordered_item(&children[at]);
    let mut items = vec![children[at].clone()];
    let mut index = at + 1;
    while index < children.len() {
        let node = &children[index];
        if node.is_list_item() {
            if is_ordered_item(node) != ordered {
                break;
            }
            items.push(node.clone());
            index += 1;
            continue;
        }
        let next_merges = children
            .get(index + 1)
            .map(|next| next.is_list_item() && is_ordered_item(next) == ordered)
            .unwrap_or(false);
        if (node.is_newline_str() || is_filler_paragraph(node)) && next_merges {
            index += 1;
            continue;
        }
        break;
    }
    out.push(build_list(items, ordered));
    index
}

fn build_list(items: Vec<Node>, ordered: bool) -> Node {
    let first = items[0].data().clone();
    let last = items[items.len() - 1].data().clone();
    Node::List {
        data: NodeData {
            raw: items
                .iter()
                .map(|item| item.raw())
                .collect::<Vec<_>>()
                .join("\n"),
            range: (first.range.0, last.range.1),
            loc: Location::covering(first.loc, last.loc),
        },
        ordered,
        start: ordered.then_some(1),
        children: items,
    }
}

/// Wrap a non-empty run of nodes in a synthetic paragraph spanning them.
fn synthetic_paragraph(children: Vec<Node>) -> Option<Node> {
    let first = children.first()?.data().clone();
    let last = children.last()?.data().clone();
    Some(Node::Paragraph {
        data: NodeData {
            raw: children.iter().map(|node| node.raw()).collect(),
            range: (first.range.0, last.range.1),
            loc: Location::covering(first.loc, last.loc),
        },
        children,
    })
}

/// Turn the enum items of a paragraph into one ordered list. Each item
/// loses its marker, has its markup flattened, and carries its prose in a
/// nested paragraph.
fn enum_items_to_list(items: Vec<Node>) -> Node {
    let list_items: Vec<Node> = items
        .into_iter()
        .map(|item| {
            let item_data = item.data().clone();
            let mut body = Vec::new();
            for child in item.children().unwrap_or_default() {
                if is_enum_marker(child) || child.is_blank_str() {
                    continue;
                }
                let flattened = flatten_markup(child);
                if flattened.is_empty() {
                    body.push(child.clone());
                } else {
                    body.extend(flattened);
                }
            }
            let children = synthetic_paragraph(body).map(|p| vec![p]).unwrap_or_default();
            Node::ListItem {
                data: item_data,
                children,
            }
        })
        .collect();
    build_list(list_items, true)
}

/// Split a paragraph that interleaves term items with ordinary prose:
/// term segments pass through verbatim, prose segments become their own
/// paragraphs.
fn split_term_paragraph(children: &[Node], out: &mut Vec<Node>) {
    let mut segment: Vec<Node> = Vec::new();
    let mut segment_is_term = false;
    let flush = |segment: &mut Vec<Node>, is_term: bool, out: &mut Vec<Node>| {
        if segment.is_empty() {
            return;
        }
        let taken = std::mem::take(segment);
        if is_term {
            out.extend(taken);
        } else {
            let prose: Vec<Node> = taken.iter().flat_map(flatten_markup).collect();
            if let Some(paragraph) = synthetic_paragraph(prose) {
                out.push(paragraph);
            }
        }
    };
    for child in children {
        if child.is_blank_str() {
            continue;
        }
        let child_is_term = is_term_item(child);
        if child_is_term != segment_is_term {
            flush(&mut segment, segment_is_term, out);
            segment_is_term = child_is_term;
        }
        segment.push(child.clone());
    }
    flush(&mut segment, segment_is_term, out);
}

fn regroup(children: &[Node], options: &ParagraphizeOptions) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    let mut index = 0;
    while index < children.len() {
        let node = &children[index];
        if starts_hash_statement(children, index, options) {
            index = collect_hash_statement(children, index, &mut out);
            continue;
        }
        if is_term_item(node) {
            index = collect_term_run(children, index, &mut out);
            continue;
        }
        if node.is_list_item() {
            index = collect_list_run(children, index, &mut out);
            continue;
        }
        if is_filler_paragraph(node) {
            index += 1;
            continue;
        }
        if is_standalone(node) {
            out.push(node.clone());
            index += 1;
            continue;
        }
        // Enum items survive inside paragraphs built from content blocks;
        // rebuild them as an ordered list.
        if let Node::Paragraph { children: inner, .. } = node {
            let enum_items: Vec<Node> =
                inner.iter().filter(|c| is_enum_item(c)).cloned().collect();
            if !enum_items.is_empty() {
                out.push(enum_items_to_list(enum_items));
                index += 1;
                continue;
            }
        }
        // Group everything up to the next block boundary.
        let mut run = vec![node.clone()];
        index += 1;
        while index < children.len() && !is_boundary(&children[index]) {
            run.push(children[index].clone());
            index += 1;
        }
        if is_hash(&run[0]) {
            out.extend(run);
            continue;
        }
        if run.len() == 1 && run[0].is_paragraph() {
            if let Node::Paragraph { children: inner, .. } = &run[0] {
                if inner.iter().any(is_term_item) {
                    split_term_paragraph(inner, &mut out);
                    continue;
                }
            }
            out.extend(run);
            continue;
        }
        if run.iter().any(is_term_item) {
            if let Some(Node::Paragraph { children: inner, .. }) = synthetic_paragraph(run) {
                split_term_paragraph(&inner, &mut out);
            }
            continue;
        }
        // A run of nothing but soft-break fillers carries no prose.
        if let Some(paragraph) = synthetic_paragraph(run) {
            if !is_filler_paragraph(&paragraph) {
                out.push(paragraph);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;

    fn data(raw: &str, line: usize, start: usize) -> NodeData {
        NodeData {
            raw: raw.to_string(),
            range: (start, start + raw.len()),
            loc: Location::new(
                Position::new(line, 0),
                Position::new(line, raw.len()),
            ),
        }
    }

    fn text(raw: &str, line: usize, start: usize) -> Node {
        Node::Str {
            data: data(raw, line, start),
            value: raw.to_string(),
        }
    }

    fn token(label: &str, raw: &str, line: usize, start: usize) -> Node {
        Node::Token {
            data: data(raw, line, start),
            label: label.to_string(),
            value: Some(raw.to_string()),
            children: vec![],
        }
    }

    fn item(raw: &str, line: usize, start: usize) -> Node {
        Node::ListItem {
            data: data(raw, line, start),
            children: vec![],
        }
    }

    fn document(children: Vec<Node>) -> Node {
        let whole: String = children.iter().map(|c| c.raw()).collect();
        Node::Document {
            data: data(&whole, 1, 0),
            children,
        }
    }

    fn regrouped(children: Vec<Node>) -> Vec<Node> {
        match paragraphize(document(children)) {
            Node::Document { children, .. } => children,
            other => panic!("expected document, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_run_becomes_paragraph() {
        let out = regrouped(vec![
            text("One line", 1, 0),
            text("\n", 1, 8),
            text("and another.", 2, 9),
        ]);
        assert_eq!(out.len(), 1);
        let paragraph = &out[0];
        assert!(paragraph.is_paragraph());
        assert_eq!(paragraph.raw(), "One line\nand another.");
        assert_eq!(paragraph.range(), (0, 21));
        assert_eq!(paragraph.children().unwrap().len(), 3);
    }

    #[test]
    fn test_standalone_blocks_break_grouping() {
        let header = Node::Header {
            data: data("= Title", 1, 0),
            children: vec![],
        };
        let out = regrouped(vec![header.clone(), text("Body.", 2, 8)]);
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], Node::Header { .. }));
        assert!(out[1].is_paragraph());
    }

    #[test]
    fn test_hash_statement_passes_through_verbatim() {
        let out = regrouped(vec![
            token("Kw::Hash", "#", 1, 0),
            token("Kw::Set", "set", 1, 1),
            text("\n", 1, 20),
            text("Prose.", 2, 21),
        ]);
        // Hash run verbatim, then the prose paragraph.
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].type_name(), "Kw::Hash");
        assert_eq!(out[1].type_name(), "Kw::Set");
        assert!(out[2].is_newline_str());
        assert!(out[3].is_paragraph());
    }

    #[test]
    fn test_hash_statement_tracks_bracket_depth() {
        // The newline inside the parens must not end the run; the one
        // after the closing paren must.
        let out = regrouped(vec![
            token("Kw::Hash", "#", 1, 0),
            token("Fn::(Ident: \"table\")", "table", 1, 1),
            token("Punc::LeftParen", "(", 1, 6),
            text("\n", 1, 7),
            token("Fn::(Ident: \"columns\")", "columns", 2, 8),
            token("Punc::RightParen", ")", 2, 16),
            text("\n", 2, 17),
            text("After text.", 3, 18),
        ]);
        assert_eq!(out.len(), 8);
        assert_eq!(out[5].type_name(), "Punc::RightParen");
        assert!(out[6].is_newline_str());
        assert!(out[7].is_paragraph());
        assert_eq!(out[7].raw(), "After text.");
    }

    #[test]
    fn test_allowlisted_statement_is_not_verbatim() {
        let mut options = ParagraphizeOptions::default();
        options.statement_allowlist.insert("quote".to_string());
        let children = vec![
            token("Kw::Hash", "#", 1, 0),
            token("Fn::(Ident: \"quote\")", "quote", 1, 1),
        ];
        let out = match paragraphize_with(document(children), &options) {
            Node::Document { children, .. } => children,
            other => panic!("expected document, got {:?}", other),
        };
        // Without the verbatim rule the run still starts with a hash
        // token, so grouping emits it as-is rather than as a paragraph.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].type_name(), "Kw::Hash");
    }

    #[test]
    fn test_mid_line_hash_does_not_start_statement() {
        let out = regrouped(vec![
            text("Count: ", 1, 0),
            token("Kw::Hash", "#", 1, 7),
            token("Var::(Ident: \"count\")", "count", 1, 8),
        ]);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_paragraph());
        assert_eq!(out[0].children().unwrap().len(), 3);
    }

    #[test]
    fn test_list_items_merge_by_class() {
        let out = regrouped(vec![
            item("- a", 1, 0),
            text("\n", 1, 3),
            item("- b", 2, 4),
            text("\n", 2, 7),
            item("1. c", 3, 8),
        ]);
        assert_eq!(out.len(), 2);
        match &out[0] {
            Node::List {
                ordered,
                start,
                children,
                data,
            } => {
                assert!(!ordered);
                assert_eq!(*start, None);
                assert_eq!(children.len(), 2);
                assert_eq!(data.raw, "- a\n- b");
            }
            other => panic!("expected list, got {:?}", other),
        }
        match &out[1] {
            Node::List { ordered, start, .. } => {
                assert!(*ordered);
                assert_eq!(*start, Some(1));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_filler_paragraph_between_items_is_absorbed() {
        let filler = Node::Paragraph {
            data: data("\n", 1, 3),
            children: vec![text("\n", 1, 3)],
        };
        let out = regrouped(vec![item("- a", 1, 0), filler, item("- b", 2, 4)]);
        assert_eq!(out.len(), 1);
        match &out[0] {
            Node::List { children, .. } => assert_eq!(children.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_lone_filler_paragraph_dropped() {
        let filler = Node::Paragraph {
            data: data("\n", 1, 0),
            children: vec![text("\n", 1, 0)],
        };
        let out = regrouped(vec![filler]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_term_run_passes_through_and_drops_fillers() {
        let term = |raw: &str, line: usize, start: usize| Node::Token {
            data: data(raw, line, start),
            label: "Marked::TermItem".to_string(),
            value: None,
            children: vec![],
        };
        let out = regrouped(vec![
            term("/ A: one", 1, 0),
            text("\n", 1, 8),
            term("/ B: two", 2, 9),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].type_name(), "Marked::TermItem");
        assert_eq!(out[1].type_name(), "Marked::TermItem");
    }

    #[test]
    fn test_term_paragraph_is_split() {
        let term = Node::Token {
            data: data("/ A: one", 2, 6),
            label: "Marked::TermItem".to_string(),
            value: None,
            children: vec![],
        };
        let paragraph = Node::Paragraph {
            data: data("Intro\n/ A: one", 1, 0),
            children: vec![text("Intro", 1, 0), text("\n", 1, 5), term],
        };
        let out = regrouped(vec![paragraph]);
        assert_eq!(out.len(), 2);
        assert!(out[0].is_paragraph());
        assert_eq!(out[0].raw(), "Intro");
        assert_eq!(out[1].type_name(), "Marked::TermItem");
    }

    #[test]
    fn test_enum_paragraph_becomes_ordered_list() {
        let enum_item = Node::Token {
            data: data("+ First", 1, 0),
            label: "Marked::EnumItem".to_string(),
            value: None,
            children: vec![
                token("Marked::EnumMarker", "+", 1, 0),
                text("First", 1, 2),
            ],
        };
        let paragraph = Node::Paragraph {
            data: data("+ First", 1, 0),
            children: vec![enum_item],
        };
        let out = regrouped(vec![paragraph]);
        assert_eq!(out.len(), 1);
        match &out[0] {
            Node::List {
                ordered,
                start,
                children,
                ..
            } => {
                assert!(*ordered);
                assert_eq!(*start, Some(1));
                assert_eq!(children.len(), 1);
                let body = children[0].children().unwrap();
                assert_eq!(body.len(), 1);
                assert!(body[0].is_paragraph());
                assert_eq!(body[0].raw(), "First");
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_single_paragraph_passes_through_unchanged() {
        let paragraph = Node::Paragraph {
            data: data("Already grouped.", 1, 0),
            children: vec![text("Already grouped.", 1, 0)],
        };
        let out = regrouped(vec![paragraph.clone()]);
        assert_eq!(out, vec![paragraph]);
    }

    #[test]
    fn test_regrouping_is_idempotent() {
        let children = vec![
            Node::Header {
                data: data("= Title", 1, 0),
                children: vec![],
            },
            text("\n", 1, 7),
            text("Body text.", 2, 8),
            item("- a", 4, 19),
            text("\n", 4, 22),
            item("- b", 5, 23),
        ];
        let once = paragraphize(document(children));
        let twice = paragraphize(once.clone());
        assert_eq!(once, twice);
    }
}
