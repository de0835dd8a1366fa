//! End-to-end conversion scenarios over hand-written dumps
//!
//! Each test drives the full pipeline (dump decode, classification,
//! regrouping) over a small dump paired with its source text, the way the
//! compiler would emit it for that source.

use typrose::{classify, convert, paragraphize_with, parse_dump, Node, ParagraphizeOptions};

/// Assemble a dump string from its body lines.
fn dump_of(lines: &[&str]) -> String {
    let mut out = String::from("---\npath: main.typ\nast:\n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn kinds(node: &Node) -> Vec<&str> {
    node.children()
        .unwrap_or_default()
        .iter()
        .map(|child| child.type_name())
        .collect()
}

#[test]
fn test_heading_and_body_paragraph() {
    let source = "= Title\nBody text.";
    let dump = dump_of(&[
        "  s: <span style='color:#7dcfff'>Marked::Markup</span>",
        "  c:",
        "  - s: <span style='color:#7dcfff'>Marked::Heading</span> &lt;1:0~1:7&gt;",
        "    c:",
        "    - s: <span style='color:#7dcfff'>Marked::HeadingMarker</span> &lt;1:0~1:1&gt;",
        "    - s: <span style='color:#7dcfff'>Marked::Markup</span> &lt;1:2~1:7&gt;",
        "      c:",
        "      - s: <span style='color:#7dcfff'>Marked::Text</span> &lt;1:2~1:7&gt;",
        "  - s: <span style='color:#7dcfff'>Marked::Text</span> &lt;2:0~2:10&gt;",
    ]);
    let document = convert(source, &dump).unwrap();
    assert_eq!(kinds(&document), vec!["Header", "Paragraph"]);
    let children = document.children().unwrap();
    assert_eq!(children[0].raw(), "= Title");
    // The soft break between the heading line and the body line opens the
    // paragraph.
    let paragraph = &children[1];
    assert_eq!(paragraph.raw(), "\nBody text.");
    assert_eq!(paragraph.range(), (7, 18));
    let body = paragraph.children().unwrap();
    assert_eq!(body.len(), 2);
    assert!(body[0].is_newline_str());
    assert_eq!(body[1].value(), Some("Body text."));
}

#[test]
fn test_empty_document() {
    let dump = dump_of(&[
        "  s: <span style='color:#7dcfff'>Marked::Markup</span>",
        "  c:",
    ]);
    let document = convert("", &dump).unwrap();
    assert_eq!(document.children(), Some(&[][..]));
    assert_eq!(document.range(), (0, 0));
    assert_eq!(document.raw(), "");
}

#[test]
fn test_mixed_list_classes_split_into_two_lists() {
    let source = "- First\n- Second\n1. Third";
    let item = |span: &str, marker: &str, text: &str| {
        vec![
            format!("  - s: <span style='color:#7dcfff'>Marked::ListItem</span> &lt;{}&gt;", span),
            "    c:".to_string(),
            format!(
                "    - s: <span style='color:#7dcfff'>Marked::ListMarker</span> &lt;{}&gt;",
                marker
            ),
            format!(
                "    - s: <span style='color:#7dcfff'>Marked::Markup</span> &lt;{}&gt;",
                text
            ),
            "      c:".to_string(),
            format!(
                "      - s: <span style='color:#7dcfff'>Marked::Text</span> &lt;{}&gt;",
                text
            ),
        ]
    };
    let mut lines = vec![
        "  s: <span style='color:#7dcfff'>Marked::Markup</span>".to_string(),
        "  c:".to_string(),
    ];
    lines.extend(item("1:0~1:7", "1:0~1:1", "1:2~1:7"));
    lines.extend(item("2:0~2:8", "2:0~2:1", "2:2~2:8"));
    lines.extend(item("3:0~3:8", "3:0~3:2", "3:3~3:8"));
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let document = convert(source, &dump_of(&refs)).unwrap();
    assert_eq!(kinds(&document), vec!["List", "List"]);
    let children = document.children().unwrap();
    match &children[0] {
        Node::List {
            ordered,
            start,
            children,
            data,
        } => {
            assert!(!ordered);
            assert_eq!(*start, None);
            assert_eq!(children.len(), 2);
            assert_eq!(data.raw, "- First\n- Second");
        }
        other => panic!("expected list, got {:?}", other),
    }
    match &children[1] {
        Node::List {
            ordered, children, ..
        } => {
            assert!(*ordered);
            assert_eq!(children.len(), 1);
            assert_eq!(children[0].raw(), "1. Third");
        }
        other => panic!("expected list, got {:?}", other),
    }
}

#[test]
fn test_code_block_after_prose() {
    let source = "Intro\n```rust\nlet x = 1;\n```";
    let dump = dump_of(&[
        "  s: <span style='color:#7dcfff'>Marked::Markup</span>",
        "  c:",
        "  - s: <span style='color:#7dcfff'>Marked::Text</span> &lt;1:0~1:5&gt;",
        "  - s: <span style='color:#7dcfff'>Marked::Raw</span> &lt;2:0~4:3&gt;",
        "    c:",
        "    - s: <span style='color:#7dcfff'>Marked::RawDelim</span> &lt;2:0~2:3&gt;",
        "    - s: <span style='color:#7dcfff'>Marked::RawLang</span> &lt;2:3~2:7&gt;",
        "    - s: <span style='color:#7dcfff'>Marked::Text</span> &lt;3:0~3:10&gt;",
        "    - s: <span style='color:#7dcfff'>Marked::RawDelim</span> &lt;4:0~4:3&gt;",
    ]);
    let document = convert(source, &dump).unwrap();
    assert_eq!(kinds(&document), vec!["Paragraph", "CodeBlock"]);
    let children = document.children().unwrap();
    assert_eq!(children[0].raw(), "Intro\n");
    match &children[1] {
        Node::CodeBlock { lang, value, .. } => {
            assert_eq!(lang.as_deref(), Some("rust"));
            assert_eq!(value, "let x = 1;");
        }
        other => panic!("expected code block, got {:?}", other),
    }
}

#[test]
fn test_term_items_pass_through() {
    let source = "/ A: one\n/ B: two";
    let dump = dump_of(&[
        "  s: <span style='color:#7dcfff'>Marked::Markup</span>",
        "  c:",
        "  - s: <span style='color:#7dcfff'>Marked::TermItem</span> &lt;1:0~1:8&gt;",
        "    c:",
        "    - s: <span style='color:#7dcfff'>Marked::Text</span> &lt;1:2~1:8&gt;",
        "  - s: <span style='color:#7dcfff'>Marked::TermItem</span> &lt;2:0~2:8&gt;",
        "    c:",
        "    - s: <span style='color:#7dcfff'>Marked::Text</span> &lt;2:2~2:8&gt;",
    ]);
    let document = convert(source, &dump).unwrap();
    assert_eq!(kinds(&document), vec!["Marked::TermItem", "Marked::TermItem"]);
    assert_eq!(document.children().unwrap()[0].raw(), "/ A: one");
}

#[test]
fn test_statement_allowlist_changes_grouping() {
    let source = "#quote\ntail";
    let dump = dump_of(&[
        "  s: <span style='color:#7dcfff'>Marked::Markup</span>",
        "  c:",
        "  - s: <span style='color:#bb9af7'>Kw::Hash</span> &lt;1:0~1:1&gt;",
        "  - s: <span style='color:#7aa2f7'>Fn::(Ident: &quot;quote&quot;)</span> &lt;1:1~1:6&gt;",
        "  - s: <span style='color:#7dcfff'>Marked::Text</span> &lt;2:0~2:4&gt;",
    ]);
    let root = parse_dump(&dump).unwrap();

    let classified = classify(&root, source).unwrap();
    let default = paragraphize_with(classified.clone(), &ParagraphizeOptions::default());
    // Default: the statement run stops at the soft break and the tail
    // becomes a paragraph.
    assert_eq!(
        kinds(&default),
        vec!["Kw::Hash", "Fn::(Ident: &quot;quote&quot;)", "Str", "Paragraph"]
    );

    let mut options = ParagraphizeOptions::default();
    options.statement_allowlist.insert("quote".to_string());
    let allowlisted = paragraphize_with(classified, &options);
    // Allowlisted: no statement run, so grouping carries the whole run
    // through verbatim behind the leading hash token.
    assert_eq!(
        kinds(&allowlisted),
        vec![
            "Kw::Hash",
            "Fn::(Ident: &quot;quote&quot;)",
            "Str",
            "Str"
        ]
    );
}
