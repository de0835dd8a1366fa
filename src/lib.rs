//! # typrose
//!
//! Converts a Typst compiler debug AST dump, together with the source text
//! it was produced from, into a fully positioned textlint-shaped prose
//! tree. Headings, paragraphs, lists, code, equations and comments come
//! out as their prose node kinds; compiler syntax with no prose meaning
//! survives as labeled tokens.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! 1. [`dump::parse_dump`] decodes the dump text into a raw node tree.
//! 2. [`convert::classify`] resolves byte ranges and locations against the
//!    source and maps syntax kinds onto prose node kinds.
//! 3. [`convert::paragraphize`] regroups the document's top-level children
//!    into paragraphs, lists and standalone blocks.
//!
//! [`convert()`] runs all three.

pub mod ast;
pub mod convert;
pub mod dump;
pub mod error;
pub mod formats;
pub mod location;

pub use ast::{Node, NodeData};
pub use convert::{classify, paragraphize, paragraphize_with, ParagraphizeOptions};
pub use dump::{parse_dump, RawNode};
pub use error::ConvertError;
pub use location::{extract_span, resolve_offset, Location, Position};

/// Convert Typst source text and its compiler dump into a prose tree.
pub fn convert(source: &str, dump: &str) -> Result<Node, ConvertError> {
    let root = dump::parse_dump(dump)?;
    let document = convert::classify(&root, source)?;
    Ok(convert::paragraphize(document))
}
