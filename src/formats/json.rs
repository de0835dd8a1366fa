//! textlint-shaped JSON serialization
//!
//! Every node serializes with its `type`, `raw`, `range` (a two-element
//! array of byte offsets) and `loc` (1-based lines, 0-based columns).
//! Kind-specific fields follow the textlint AST object shape: lists carry
//! `ordered`/`start`/`spread`, list items `spread`/`checked`, links
//! `title`/`url`. Tokens serialize under their compiler kind label, with
//! `value` for leaves and `children` for parents.

use serde_json::{json, Map, Value};

use crate::ast::Node;

/// Serialize a node (usually the document root) into a textlint-shaped
/// JSON value.
pub fn to_json(node: &Node) -> Value {
    let mut object = Map::new();
    let data = node.data();
    object.insert("type".to_string(), json!(node.type_name()));
    object.insert("raw".to_string(), json!(data.raw));
    object.insert("range".to_string(), json!([data.range.0, data.range.1]));
    object.insert(
        "loc".to_string(),
        json!({
            "start": { "line": data.loc.start.line, "column": data.loc.start.column },
            "end": { "line": data.loc.end.line, "column": data.loc.end.column },
        }),
    );
    match node {
        Node::Str { value, .. }
        | Node::Break { value, .. }
        | Node::Code { value, .. }
        | Node::Comment { value, .. } => {
            object.insert("value".to_string(), json!(value));
        }
        Node::CodeBlock { lang, value, .. } => {
            object.insert("lang".to_string(), json!(lang));
            object.insert("value".to_string(), json!(value));
        }
        Node::List {
            ordered,
            start,
            children,
            ..
        } => {
            object.insert("ordered".to_string(), json!(ordered));
            object.insert("start".to_string(), json!(start));
            object.insert("spread".to_string(), json!(false));
            object.insert("children".to_string(), children_json(children));
        }
        Node::ListItem { children, .. } => {
            object.insert("spread".to_string(), json!(false));
            object.insert("checked".to_string(), Value::Null);
            object.insert("children".to_string(), children_json(children));
        }
        Node::Link { url, children, .. } => {
            object.insert("title".to_string(), Value::Null);
            object.insert("url".to_string(), json!(url));
            object.insert("children".to_string(), children_json(children));
        }
        Node::Token {
            value, children, ..
        } => {
            // Leaf tokens carry their text, parent tokens their children.
            match value {
                Some(value) => {
                    object.insert("value".to_string(), json!(value));
                }
                None => {
                    object.insert("children".to_string(), children_json(children));
                }
            }
        }
        Node::Document { children, .. }
        | Node::Paragraph { children, .. }
        | Node::Header { children, .. }
        | Node::Strong { children, .. }
        | Node::Emphasis { children, .. } => {
            object.insert("children".to_string(), children_json(children));
        }
    }
    Value::Object(object)
}

fn children_json(children: &[Node]) -> Value {
    Value::Array(children.iter().map(to_json).collect())
}

/// Compact JSON string.
pub fn to_json_string(node: &Node) -> String {
    to_json(node).to_string()
}

/// Human-readable JSON string.
pub fn to_json_string_pretty(node: &Node) -> String {
    serde_json::to_string_pretty(&to_json(node)).unwrap_or_else(|_| to_json_string(node))
}
