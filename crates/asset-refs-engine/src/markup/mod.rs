//! # Markup
//!
//! Lossless parsing of HTML fragments into an editable arena tree.
//!
//! ## Modules
//!
//! - **`lexer`**: Logos tokenizer; every byte lands in exactly one token
//! - **`tag`**: `OpenTag` with per-attribute source text for in-place edits
//! - **`tree`**: `Fragment` arena addressed by `NodeId`, builder and serializer
//!
//! Serializing a fragment nobody edited gives back the input byte-for-byte.
//! Edited tags re-emit only the attributes that changed.

pub mod lexer;
pub mod tag;
pub mod tree;

pub use tag::{Attribute, OpenTag};
pub use tree::{Element, Fragment, NodeData, NodeId};
