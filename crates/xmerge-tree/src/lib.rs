//! Ordered XML element tree for xmerge.
//!
//! Documents are parsed into an owned tree of [`Element`]s whose child order
//! is preserved exactly, so a template can be mutated in place and written
//! back out with its original structure intact.
//!
//! # Key Types
//!
//! - [`Document`] -- declaration, prolog/epilog nodes, and the root element
//! - [`Element`] / [`Node`] / [`Attribute`] -- the tree itself
//! - [`NodeIndex`] -- tag name to child positions for one parent
//! - [`WriteOptions`] -- indentation and declaration control for output
//!
//! # Design Rules
//!
//! 1. Each element exclusively owns its children; cloning an element is a
//!    deep copy.
//! 2. Whitespace-only text is kept on parse so a verbatim write preserves the
//!    input's formatting.
//! 3. Comments and processing instructions are opaque siblings.

pub mod error;
pub mod index;
pub mod node;
pub mod parse;
pub mod write;

pub use error::{TreeError, TreeResult};
pub use index::NodeIndex;
pub use node::{Attribute, Declaration, Document, Element, Node};
pub use parse::{parse_file, parse_str};
pub use write::WriteOptions;
