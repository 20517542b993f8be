//! # Sections
//!
//! Discovery of the hierarchical outline of a text and the queries run
//! against it.
//!
//! Two producers feed the same output:
//!
//! - [`walker`]: one forward pass over scanner tokens, tracking open
//!   brackets, tags and `key: value` pairs.
//! - [`headers`]: a stack-of-open-headings pass over heading attributes of
//!   a [`StyledText`](crate::attr_line::StyledText).
//!
//! Both end in a [`Metadata`]: a [`SectionTree`] of named/indexed nodes and
//! the flat list of [`SectionInterval`]s derived from it.
//!
//! ## Module Structure
//!
//! - **`tree`**: the node arena and navigation queries
//! - **`walker`**: token-driven discovery
//! - **`headers`**: heading-driven discovery and merging of the two trees
//! - **`metadata`**: the immutable result and its query façade
//! - **`path`**: reversible string form of section paths

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod headers;
pub mod metadata;
pub mod path;
pub mod tree;
pub mod walker;

pub use headers::discover_metadata;
pub use metadata::Metadata;
pub use path::{PathError, decode_path, encode_path};
pub use tree::{HierNode, NodeId, NodeNeighbors, SectionTree};
pub use walker::discover_structure;

/// Identifies a child within its parent: by name when the text supplied
/// one, otherwise by position among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionKey {
    Name(String),
    Index(usize),
}

impl SectionKey {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            SectionKey::Name(name) => Some(name),
            SectionKey::Index(_) => None,
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKey::Name(name) => f.write_str(name),
            SectionKey::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for SectionKey {
    fn from(name: &str) -> Self {
        SectionKey::Name(name.to_string())
    }
}

impl From<String> for SectionKey {
    fn from(name: String) -> Self {
        SectionKey::Name(name)
    }
}

impl From<usize> for SectionKey {
    fn from(index: usize) -> Self {
        SectionKey::Index(index)
    }
}

/// Half-open byte range `[start, stop)` of a section and its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionInterval {
    pub start: usize,
    pub stop: usize,
    pub key: SectionKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    Comment,
    MultilineString,
}

/// A lexical region worth rendering differently (comments, multi-line
/// strings). Not part of the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInterval {
    pub start: usize,
    pub stop: usize,
    pub kind: SectionType,
}
