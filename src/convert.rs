//! Conversion passes over the dump tree
//!
//! Two passes turn a decoded [`crate::dump::RawNode`] tree into the final
//! prose tree: [`classify`] resolves positions and maps compiler syntax
//! kinds onto prose node kinds, and [`paragraphize`] regroups the document's
//! top-level children into paragraphs, lists, and standalone blocks.

pub mod classify;
pub mod paragraphize;

pub use classify::classify;
pub use paragraphize::{paragraphize, paragraphize_with, ParagraphizeOptions};

use crate::ast::Node;

fn is_markup_wrapper(node: &Node) -> bool {
    matches!(
        node.token_label(),
        Some("Marked::Markup" | "Marked::ContentBlock")
    ) && node.value().is_none()
}

fn is_bracket(node: &Node) -> bool {
    matches!(
        node.token_label(),
        Some("Punc::LeftBracket" | "Punc::RightBracket")
    )
}

/// Pull prose content out of markup and content-block wrappers, dropping
/// the bracket tokens that delimit them. Non-wrapper nodes pass through
/// unchanged.
pub(crate) fn flatten_markup(node: &Node) -> Vec<Node> {
    if !is_markup_wrapper(node) {
        return vec![node.clone()];
    }
    node.children()
        .unwrap_or_default()
        .iter()
        .filter(|child| !is_bracket(child))
        .flat_map(flatten_markup)
        .collect()
}
