//! # strata-engine
//!
//! Discovers the outline of a text: headings, brackets, tags and
//! `key: value` groups become a tree of named or indexed sections, plus the
//! flat list of byte intervals derived from it.
//!
//! ```text
//! StyledText ─┬─ Markdown ─→ pulldown-cmark roles ─┐
//!             └─ other ────→ Scanner → walker ─────┴→ header pass → Metadata
//! ```
//!
//! Malformed input never fails; the worst case is an empty outline.
//!
//! ## Module Structure
//!
//! - **`attr_line`**: text plus range attributes (roles, origin offsets)
//! - **`sections`**: the tree, both discovery passes and the query façade
//! - **`discover`**: builder entry point and [`DiscoveryOptions`]
//! - **`markdown`**: heading and quoted-text roles from pulldown-cmark
//! - **`anchors`**: `#slug` names for sections
//! - **`view`**: line index, anchors and navigation over one document

pub mod anchors;
pub mod attr_line;
pub mod discover;
pub mod markdown;
pub mod sections;
pub mod view;

pub use anchors::to_anchor_string;
pub use attr_line::{AttrValue, Role, StringAttr, StyledText};
pub use discover::{DEFAULT_GARBAGE_LIMIT, Discover, DiscoveryOptions, discover};
pub use sections::{
    HierNode, Metadata, NodeId, NodeNeighbors, PathError, SectionInterval, SectionKey,
    SectionTree, SectionType, TypeInterval, decode_path, discover_metadata, discover_structure,
    encode_path,
};
pub use view::{Breadcrumb, Direction, DocumentView};
