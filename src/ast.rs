//! Prose tree produced by the converter
//!
//! The output tree follows the textlint AST shape: every node carries the
//! exact source text it covers (`raw`), a byte range into the source, and a
//! line/column location. Node kinds are a closed set; compiler syntax that
//! has no prose meaning survives as a [`Node::Token`] carrying its original
//! kind label.

use crate::location::Location;

/// Positioning data shared by every node kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Exact source text covered by the node.
    pub raw: String,
    /// Byte offsets into the source, start inclusive, end exclusive.
    pub range: (usize, usize),
    /// Line/column span of the node.
    pub loc: Location,
}

/// A node of the prose tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Document {
        data: NodeData,
        children: Vec<Node>,
    },
    Paragraph {
        data: NodeData,
        children: Vec<Node>,
    },
    Header {
        data: NodeData,
        children: Vec<Node>,
    },
    Str {
        data: NodeData,
        value: String,
    },
    Break {
        data: NodeData,
        value: String,
    },
    List {
        data: NodeData,
        ordered: bool,
        start: Option<usize>,
        children: Vec<Node>,
    },
    ListItem {
        data: NodeData,
        children: Vec<Node>,
    },
    Link {
        data: NodeData,
        url: String,
        children: Vec<Node>,
    },
    Strong {
        data: NodeData,
        children: Vec<Node>,
    },
    Emphasis {
        data: NodeData,
        children: Vec<Node>,
    },
    Code {
        data: NodeData,
        value: String,
    },
    CodeBlock {
        data: NodeData,
        lang: Option<String>,
        value: String,
    },
    Comment {
        data: NodeData,
        value: String,
    },
    /// Syntax with no prose counterpart, kept under its compiler kind label.
    /// A leaf token carries its source text as `value`; a parent token
    /// carries `children` and no value.
    Token {
        data: NodeData,
        label: String,
        value: Option<String>,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn data(&self) -> &NodeData {
        match self {
            Node::Document { data, .. }
            | Node::Paragraph { data, .. }
            | Node::Header { data, .. }
            | Node::Str { data, .. }
            | Node::Break { data, .. }
            | Node::List { data, .. }
            | Node::ListItem { data, .. }
            | Node::Link { data, .. }
            | Node::Strong { data, .. }
            | Node::Emphasis { data, .. }
            | Node::Code { data, .. }
            | Node::CodeBlock { data, .. }
            | Node::Comment { data, .. }
            | Node::Token { data, .. } => data,
        }
    }

    pub fn data_mut(&mut self) -> &mut NodeData {
        match self {
            Node::Document { data, .. }
            | Node::Paragraph { data, .. }
            | Node::Header { data, .. }
            | Node::Str { data, .. }
            | Node::Break { data, .. }
            | Node::List { data, .. }
            | Node::ListItem { data, .. }
            | Node::Link { data, .. }
            | Node::Strong { data, .. }
            | Node::Emphasis { data, .. }
            | Node::Code { data, .. }
            | Node::CodeBlock { data, .. }
            | Node::Comment { data, .. }
            | Node::Token { data, .. } => data,
        }
    }

    pub fn raw(&self) -> &str {
        &self.data().raw
    }

    pub fn range(&self) -> (usize, usize) {
        self.data().range
    }

    pub fn loc(&self) -> Location {
        self.data().loc
    }

    /// Serialized node type, the kind label for tokens.
    pub fn type_name(&self) -> &str {
        match self {
            Node::Document { .. } => "Document",
            Node::Paragraph { .. } => "Paragraph",
            Node::Header { .. } => "Header",
            Node::Str { .. } => "Str",
            Node::Break { .. } => "Break",
            Node::List { .. } => "List",
            Node::ListItem { .. } => "ListItem",
            Node::Link { .. } => "Link",
            Node::Strong { .. } => "Strong",
            Node::Emphasis { .. } => "Emphasis",
            Node::Code { .. } => "Code",
            Node::CodeBlock { .. } => "CodeBlock",
            Node::Comment { .. } => "Comment",
            Node::Token { label, .. } => label,
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Document { children, .. }
            | Node::Paragraph { children, .. }
            | Node::Header { children, .. }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Link { children, .. }
            | Node::Strong { children, .. }
            | Node::Emphasis { children, .. }
            | Node::Token { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children, .. }
            | Node::Paragraph { children, .. }
            | Node::Header { children, .. }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Link { children, .. }
            | Node::Strong { children, .. }
            | Node::Emphasis { children, .. }
            | Node::Token { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Str { value, .. }
            | Node::Break { value, .. }
            | Node::Code { value, .. }
            | Node::CodeBlock { value, .. }
            | Node::Comment { value, .. } => Some(value),
            Node::Token { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    /// Kind label when the node is a token.
    pub fn token_label(&self) -> Option<&str> {
        match self {
            Node::Token { label, .. } => Some(label),
            _ => None,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.token_label() == Some(label)
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Node::Str { .. })
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Node::Break { .. })
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, Node::Paragraph { .. })
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, Node::ListItem { .. })
    }

    /// A `Str` covering nothing but whitespace.
    pub fn is_blank_str(&self) -> bool {
        matches!(self, Node::Str { .. } if self.raw().trim().is_empty())
    }

    /// A `Str` covering exactly one newline.
    pub fn is_newline_str(&self) -> bool {
        matches!(self, Node::Str { .. } if self.raw() == "\n")
    }

    /// First textual value in the subtree, the node's own value before any
    /// descendant's.
    pub fn first_text_value(&self) -> Option<&str> {
        if let Some(value) = self.value() {
            return Some(value);
        }
        self.children()?
            .iter()
            .find_map(|child| child.first_text_value())
    }
}
